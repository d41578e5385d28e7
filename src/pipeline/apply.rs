//! Applies a batch of list updates to AniList.
//!
//! Updates are sent concurrently up to a bound. A failed update is logged
//! and counted; it never stops the rest of the batch.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::MediaListUpdate;
use crate::services::AniListClient;

/// Destination of list updates.
#[async_trait]
pub trait MediaListWriter: Send + Sync {
    /// Create or update one entry, returning the list entry id.
    async fn save(&self, update: &MediaListUpdate) -> Result<u64>;
}

#[async_trait]
impl MediaListWriter for AniListClient {
    async fn save(&self, update: &MediaListUpdate) -> Result<u64> {
        self.save_media_list_entry(update).await
    }
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub applied: usize,
    pub failed: usize,
}

/// Send every update, at most `max_concurrent` at a time.
pub async fn apply_updates(
    writer: &dyn MediaListWriter,
    updates: &[MediaListUpdate],
    max_concurrent: usize,
) -> ApplyOutcome {
    let results: Vec<bool> = stream::iter(updates)
        .map(|update| async move {
            match writer.save(update).await {
                Ok(entry_id) => {
                    log::info!(
                        "Updated AniList media {}: {} (progress {}), entry {}",
                        update.media_id,
                        update.status,
                        update.progress,
                        entry_id
                    );
                    true
                }
                Err(e) => {
                    log::error!("Failed to update AniList media {}: {}", update.media_id, e);
                    false
                }
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let applied = results.iter().filter(|&&ok| ok).count();
    ApplyOutcome {
        applied,
        failed: results.len() - applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::AniListStatus;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeWriter {
        saved: Mutex<Vec<u64>>,
        fail_media: Vec<u64>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MediaListWriter for FakeWriter {
        async fn save(&self, update: &MediaListUpdate) -> Result<u64> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_media.contains(&update.media_id) {
                return Err(AppError::graphql("AniList", "validation failed"));
            }
            self.saved.lock().unwrap().push(update.media_id);
            Ok(update.media_id * 10)
        }
    }

    fn updates(ids: impl IntoIterator<Item = u64>) -> Vec<MediaListUpdate> {
        ids.into_iter()
            .map(|media_id| MediaListUpdate {
                media_id,
                status: AniListStatus::Current,
                progress: 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let writer = FakeWriter {
            fail_media: vec![2, 4],
            ..FakeWriter::default()
        };

        let outcome = apply_updates(&writer, &updates(1..=5), 2).await;

        assert_eq!(outcome, ApplyOutcome { applied: 3, failed: 2 });
        let mut saved = writer.saved.lock().unwrap().clone();
        saved.sort();
        assert_eq!(saved, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let writer = FakeWriter::default();

        let outcome = apply_updates(&writer, &updates(1..=12), 3).await;

        assert_eq!(outcome.applied, 12);
        assert!(writer.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let writer = FakeWriter::default();
        let outcome = apply_updates(&writer, &[], 4).await;
        assert_eq!(outcome, ApplyOutcome::default());
    }
}
