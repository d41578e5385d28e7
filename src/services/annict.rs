// src/services/annict.rs

//! Annict GraphQL client.
//!
//! The viewer's library is fetched one `StatusState` at a time (one
//! partition per state, cursor pagination), which Annict answers faster
//! than a single query over all states.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{AnnictStatus, AnnictWork, ServiceConfig};
use crate::services::fetch::{Page, PagedLibrary, fetch_library};
use crate::services::graphql::GraphQlClient;
use crate::utils::RateLimitedClient;

const VIEWER_QUERY: &str = "query { viewer { name username } }";

const LIBRARY_QUERY: &str = r#"
query ($states: [StatusState!], $after: String, $first: Int) {
  viewer {
    libraryEntries(states: $states, after: $after, first: $first) {
      nodes {
        work {
          annictId
          malAnimeId
          syobocalTid
          title
          viewerStatusState
          noEpisodes
          episodes {
            nodes {
              viewerDidTrack
            }
          }
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}
"#;

/// The authenticated Annict user.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnictViewer {
    pub name: String,
    pub username: String,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: AnnictViewer,
}

#[derive(Deserialize)]
struct LibraryData {
    viewer: LibraryViewer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryViewer {
    library_entries: LibraryEntryConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryEntryConnection {
    #[serde(default)]
    nodes: Vec<LibraryEntryNode>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct LibraryEntryNode {
    work: WorkNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkNode {
    annict_id: u64,
    mal_anime_id: Option<String>,
    syobocal_tid: Option<u64>,
    title: String,
    viewer_status_state: Option<String>,
    #[serde(default)]
    no_episodes: bool,
    #[serde(default)]
    episodes: Option<EpisodeConnection>,
}

#[derive(Deserialize)]
struct EpisodeConnection {
    #[serde(default)]
    nodes: Vec<EpisodeNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeNode {
    viewer_did_track: bool,
}

impl TryFrom<WorkNode> for AnnictWork {
    type Error = AppError;

    fn try_from(node: WorkNode) -> Result<Self> {
        let status = node
            .viewer_status_state
            .as_deref()
            .unwrap_or("NO_STATE")
            .parse()?;

        Ok(AnnictWork {
            annict_id: node.annict_id,
            mal_anime_id: node.mal_anime_id.filter(|id| !id.is_empty()),
            syobocal_tid: node.syobocal_tid.unwrap_or(0),
            title: node.title,
            status,
            no_episodes: node.no_episodes,
            episodes: node
                .episodes
                .map(|c| c.nodes.into_iter().map(|e| e.viewer_did_track).collect())
                .unwrap_or_default(),
        })
    }
}

/// Client for the Annict GraphQL API, pre-authorized with the viewer's token.
#[derive(Debug, Clone)]
pub struct AnnictClient {
    graphql: GraphQlClient,
    page_size: u32,
}

impl AnnictClient {
    pub fn new(transport: RateLimitedClient, config: &ServiceConfig) -> Self {
        Self {
            graphql: GraphQlClient::new(transport, &config.endpoint, "Annict"),
            page_size: config.page_size,
        }
    }

    pub async fn fetch_viewer(&self) -> Result<AnnictViewer> {
        let data: ViewerData = self.graphql.query(VIEWER_QUERY, json!({})).await?;
        Ok(data.viewer)
    }

    /// Fetch one page of works in the given state.
    pub async fn fetch_library_page(
        &self,
        status: AnnictStatus,
        after: Option<&str>,
    ) -> Result<Page<AnnictWork, String>> {
        let variables = json!({
            "states": [status],
            "after": after,
            "first": self.page_size,
        });
        let data: LibraryData = self.graphql.query(LIBRARY_QUERY, variables).await?;
        let connection = data.viewer.library_entries;

        let items = connection
            .nodes
            .into_iter()
            .map(|node| AnnictWork::try_from(node.work))
            .collect::<Result<Vec<_>>>()?;

        let next = match connection.page_info {
            PageInfo {
                has_next_page: false,
                ..
            } => None,
            PageInfo {
                end_cursor: Some(cursor),
                ..
            } => Some(cursor),
            PageInfo { end_cursor: None, .. } => {
                return Err(AppError::graphql(
                    self.graphql.service(),
                    format!("{status} page has a next page but no end cursor"),
                ));
            }
        };
        Ok(Page { items, next })
    }

    /// Fetch the viewer's whole library, all states concurrently.
    pub async fn fetch_all_works(&self, page_delay: Duration) -> Result<Vec<AnnictWork>> {
        fetch_library(self, page_delay).await
    }
}

#[async_trait]
impl PagedLibrary for AnnictClient {
    type Partition = AnnictStatus;
    type Cursor = Option<String>;
    type Item = AnnictWork;

    fn service(&self) -> &'static str {
        self.graphql.service()
    }

    fn partitions(&self) -> Vec<AnnictStatus> {
        AnnictStatus::ALL.to_vec()
    }

    fn first_cursor(&self) -> Option<String> {
        None
    }

    async fn fetch_page(
        &self,
        partition: AnnictStatus,
        cursor: Option<String>,
    ) -> Result<Page<AnnictWork, Option<String>>> {
        let page = self.fetch_library_page(partition, cursor.as_deref()).await?;
        Ok(Page {
            items: page.items,
            next: page.next.map(Some),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RateLimitConfig;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AnnictClient {
        let transport = RateLimitedClient::new(reqwest::Client::new(), &RateLimitConfig::default());
        let config = ServiceConfig {
            endpoint: server.uri(),
            access_token: None,
            token_file: "token-annict.json".into(),
            page_size: 2,
        };
        AnnictClient::new(transport, &config)
    }

    fn work(annict_id: u64, state: &str, tracked: &[bool]) -> serde_json::Value {
        json!({
            "work": {
                "annictId": annict_id,
                "malAnimeId": "",
                "syobocalTid": null,
                "title": format!("Work {annict_id}"),
                "viewerStatusState": state,
                "noEpisodes": false,
                "episodes": {
                    "nodes": tracked.iter().map(|t| json!({ "viewerDidTrack": t })).collect::<Vec<_>>()
                }
            }
        })
    }

    fn page(nodes: Vec<serde_json::Value>, next: Option<&str>) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "viewer": {
                    "libraryEntries": {
                        "nodes": nodes,
                        "pageInfo": { "hasNextPage": next.is_some(), "endCursor": next }
                    }
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_work_conversion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(page(vec![work(1, "WATCHING", &[true, false, true])], None))
            .mount(&server)
            .await;

        let page = client(&server)
            .fetch_library_page(AnnictStatus::Watching, None)
            .await
            .unwrap();

        assert!(page.next.is_none());
        let work = &page.items[0];
        assert_eq!(work.annict_id, 1);
        assert_eq!(work.status, AnnictStatus::Watching);
        assert_eq!(work.mal_anime_id, None);
        assert_eq!(work.syobocal_tid, 0);
        assert_eq!(work.episodes, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_fetch_all_works_paginates_every_state() {
        let server = MockServer::start().await;
        // WATCHING has two pages; every other state is empty.
        Mock::given(method("POST"))
            .and(body_string_contains(r#""states":["WATCHING"]"#))
            .and(body_string_contains(r#""after":"cursor-1""#))
            .respond_with(page(vec![work(3, "WATCHING", &[])], None))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""states":["WATCHING"]"#))
            .respond_with(page(
                vec![work(1, "WATCHING", &[true]), work(2, "WATCHING", &[])],
                Some("cursor-1"),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""states":["WATCHED"]"#))
            .respond_with(page(vec![work(4, "WATCHED", &[true])], None))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(page(vec![], None))
            .mount(&server)
            .await;

        let mut works = client(&server).fetch_all_works(Duration::ZERO).await.unwrap();
        works.sort_by_key(|w| w.annict_id);

        let ids: Vec<u64> = works.iter().map(|w| w.annict_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        // 2 pages for WATCHING + 1 for each of the other four states.
        assert_eq!(server.received_requests().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_next_page_without_cursor_aborts_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""states":["WATCHED"]"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "viewer": {
                        "libraryEntries": {
                            "nodes": [],
                            "pageInfo": { "hasNextPage": true, "endCursor": null }
                        }
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(page(vec![], None))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_all_works(Duration::ZERO)
            .await
            .unwrap_err();
        match err {
            AppError::PartialFetch { partition, source, .. } => {
                assert_eq!(partition, "WATCHED");
                assert!(matches!(*source, AppError::GraphQl { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_state_aborts_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(page(vec![work(1, "NO_STATE", &[])], None))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_all_works(Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_unmappable_state(), "{err}");
    }
}
