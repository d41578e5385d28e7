// src/services/anilist.rs

//! AniList GraphQL client.
//!
//! The anime list is fetched one `MediaListStatus` at a time (chunked
//! pagination, chunks are 1-indexed), and entries are written back with
//! `SaveMediaListEntry`, which creates or updates by media id.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{AniListEntry, AniListStatus, MediaListUpdate, MediaStatus, ServiceConfig};
use crate::services::fetch::{Page, PagedLibrary, fetch_library};
use crate::services::graphql::GraphQlClient;
use crate::utils::RateLimitedClient;

const VIEWER_QUERY: &str = "query { Viewer { id name } }";

const LIBRARY_QUERY: &str = r#"
query ($userId: Int, $status: MediaListStatus, $chunk: Int, $perChunk: Int) {
  MediaListCollection(userId: $userId, type: ANIME, status: $status, chunk: $chunk, perChunk: $perChunk, sort: [STARTED_ON], forceSingleCompletedList: true) {
    hasNextChunk
    lists {
      entries {
        id
        status
        progress
        media {
          id
          idMal
          status
          title {
            native
          }
        }
      }
    }
  }
}
"#;

const SAVE_ENTRY_MUTATION: &str = r#"
mutation ($mediaId: Int, $status: MediaListStatus, $progress: Int) {
  SaveMediaListEntry(mediaId: $mediaId, status: $status, progress: $progress) {
    id
  }
}
"#;

/// The authenticated AniList user.
#[derive(Debug, Clone, Deserialize)]
pub struct AniListViewer {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
struct ViewerData {
    #[serde(rename = "Viewer")]
    viewer: AniListViewer,
}

#[derive(Deserialize)]
struct LibraryData {
    #[serde(rename = "MediaListCollection")]
    collection: MediaListCollection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaListCollection {
    #[serde(default)]
    has_next_chunk: bool,
    #[serde(default)]
    lists: Vec<MediaListGroup>,
}

#[derive(Deserialize)]
struct MediaListGroup {
    #[serde(default)]
    entries: Vec<EntryNode>,
}

#[derive(Deserialize)]
struct EntryNode {
    id: u64,
    status: Option<String>,
    progress: Option<u32>,
    media: MediaNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaNode {
    id: u64,
    id_mal: Option<u64>,
    status: Option<MediaStatus>,
    title: Option<TitleNode>,
}

#[derive(Deserialize)]
struct TitleNode {
    native: Option<String>,
}

#[derive(Deserialize)]
struct SaveData {
    #[serde(rename = "SaveMediaListEntry")]
    entry: SavedEntry,
}

#[derive(Deserialize)]
struct SavedEntry {
    id: u64,
}

impl TryFrom<EntryNode> for AniListEntry {
    type Error = AppError;

    fn try_from(node: EntryNode) -> Result<Self> {
        let status = node.status.as_deref().unwrap_or_default().parse()?;

        Ok(AniListEntry {
            id: node.id,
            media_id: node.media.id,
            mal_id: node.media.id_mal.unwrap_or(0),
            status,
            progress: node.progress.unwrap_or(0),
            title: node
                .media
                .title
                .and_then(|t| t.native)
                .unwrap_or_default(),
            media_status: node.media.status.unwrap_or_default(),
        })
    }
}

/// Client for the AniList GraphQL API, pre-authorized with the viewer's token.
#[derive(Debug, Clone)]
pub struct AniListClient {
    graphql: GraphQlClient,
    per_chunk: u32,
}

impl AniListClient {
    pub fn new(transport: RateLimitedClient, config: &ServiceConfig) -> Self {
        Self {
            graphql: GraphQlClient::new(transport, &config.endpoint, "AniList"),
            per_chunk: config.page_size,
        }
    }

    pub async fn fetch_viewer(&self) -> Result<AniListViewer> {
        let data: ViewerData = self.graphql.query(VIEWER_QUERY, json!({})).await?;
        Ok(data.viewer)
    }

    /// Fetch one chunk of the user's list entries in the given status.
    pub async fn fetch_library_chunk(
        &self,
        user_id: u64,
        status: AniListStatus,
        chunk: u32,
    ) -> Result<Page<AniListEntry, u32>> {
        let variables = json!({
            "userId": user_id,
            "status": status,
            "chunk": chunk,
            "perChunk": self.per_chunk,
        });
        let data: LibraryData = self.graphql.query(LIBRARY_QUERY, variables).await?;

        let items = data
            .collection
            .lists
            .into_iter()
            .flat_map(|list| list.entries)
            .map(AniListEntry::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            next: data.collection.has_next_chunk.then_some(chunk + 1),
        })
    }

    /// Fetch the user's whole anime list, all statuses concurrently.
    pub async fn fetch_all_entries(&self, user_id: u64, page_delay: Duration) -> Result<Vec<AniListEntry>> {
        let library = UserLibrary {
            client: self,
            user_id,
        };
        fetch_library(&library, page_delay).await
    }

    /// Create or update the list entry of a media. Returns the entry id.
    pub async fn save_media_list_entry(&self, update: &MediaListUpdate) -> Result<u64> {
        let variables = json!({
            "mediaId": update.media_id,
            "status": update.status,
            "progress": update.progress,
        });
        let data: SaveData = self.graphql.query(SAVE_ENTRY_MUTATION, variables).await?;
        Ok(data.entry.id)
    }
}

/// One user's list, as a partitioned library.
struct UserLibrary<'a> {
    client: &'a AniListClient,
    user_id: u64,
}

#[async_trait]
impl PagedLibrary for UserLibrary<'_> {
    type Partition = AniListStatus;
    type Cursor = u32;
    type Item = AniListEntry;

    fn service(&self) -> &'static str {
        self.client.graphql.service()
    }

    fn partitions(&self) -> Vec<AniListStatus> {
        AniListStatus::ALL.to_vec()
    }

    fn first_cursor(&self) -> u32 {
        1
    }

    async fn fetch_page(&self, partition: AniListStatus, chunk: u32) -> Result<Page<AniListEntry, u32>> {
        self.client
            .fetch_library_chunk(self.user_id, partition, chunk)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RateLimitConfig;
    use wiremock::matchers::{body_partial_json, body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AniListClient {
        let transport = RateLimitedClient::new(reqwest::Client::new(), &RateLimitConfig::default());
        let config = ServiceConfig {
            endpoint: server.uri(),
            access_token: None,
            token_file: "token-anilist.json".into(),
            page_size: 500,
        };
        AniListClient::new(transport, &config)
    }

    fn entry(id: u64, media_id: u64, status: &str, progress: u32) -> serde_json::Value {
        json!({
            "id": id,
            "status": status,
            "progress": progress,
            "media": {
                "id": media_id,
                "idMal": null,
                "status": "FINISHED",
                "title": { "native": format!("作品{media_id}") }
            }
        })
    }

    fn chunk(entries: Vec<serde_json::Value>, has_next: bool) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "MediaListCollection": {
                    "hasNextChunk": has_next,
                    "lists": [{ "entries": entries }]
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_fetch_all_entries_follows_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "status": "COMPLETED", "chunk": 2 } })))
            .respond_with(chunk(vec![entry(3, 30, "COMPLETED", 12)], false))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "status": "COMPLETED", "chunk": 1 } })))
            .respond_with(chunk(vec![entry(2, 20, "COMPLETED", 24)], true))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "status": "REPEATING" } })))
            .respond_with(chunk(vec![entry(1, 10, "REPEATING", 3)], false))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(chunk(vec![], false))
            .mount(&server)
            .await;

        let mut entries = client(&server)
            .fetch_all_entries(42, Duration::ZERO)
            .await
            .unwrap();
        entries.sort_by_key(|e| e.media_id);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].status, AniListStatus::Repeating);
        assert_eq!(entries[1].progress, 24);
        assert_eq!(entries[2].title, "作品30");
        assert_eq!(entries[2].media_status, MediaStatus::Finished);
        assert_eq!(entries[2].mal_id, 0);
        // 2 chunks for COMPLETED + 1 for each of the other five statuses.
        assert_eq!(server.received_requests().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_save_media_list_entry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("SaveMediaListEntry"))
            .and(body_partial_json(json!({
                "variables": { "mediaId": 2, "status": "CURRENT", "progress": 3 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "SaveMediaListEntry": { "id": 9001 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = MediaListUpdate {
            media_id: 2,
            status: AniListStatus::Current,
            progress: 3,
        };
        let id = client(&server).save_media_list_entry(&update).await.unwrap();
        assert_eq!(id, 9001);
    }

    #[tokio::test]
    async fn test_fetch_viewer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "Viewer": { "id": 42, "name": "viewer" } }
            })))
            .mount(&server)
            .await;

        let viewer = client(&server).fetch_viewer().await.unwrap();
        assert_eq!(viewer.id, 42);
        assert_eq!(viewer.name, "viewer");
    }
}
