//! Concurrent, partitioned library fetching.
//!
//! A library is split by watch state; every partition paginates on its own
//! and all partitions run concurrently. Pages are appended to one shared,
//! mutex-guarded collection. The first failing page voids the whole fetch.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};

/// One page of a partition.
#[derive(Debug, Clone)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    /// Cursor of the following page, `None` on the last page
    pub next: Option<C>,
}

/// A remote library that can be fetched page by page per partition.
#[async_trait]
pub trait PagedLibrary: Send + Sync {
    type Partition: Copy + fmt::Display + Send + Sync;
    type Cursor: Send;
    type Item: Send;

    /// Service name, for logs and errors.
    fn service(&self) -> &'static str;

    /// Partition keys fetched concurrently.
    fn partitions(&self) -> Vec<Self::Partition>;

    /// Cursor of the first page of any partition.
    fn first_cursor(&self) -> Self::Cursor;

    async fn fetch_page(
        &self,
        partition: Self::Partition,
        cursor: Self::Cursor,
    ) -> Result<Page<Self::Item, Self::Cursor>>;
}

/// Fetch every item of every partition. Item order is unspecified.
pub async fn fetch_library<S: PagedLibrary>(source: &S, page_delay: Duration) -> Result<Vec<S::Item>> {
    let started = Instant::now();
    let collected = Mutex::new(Vec::new());

    let tasks = source
        .partitions()
        .into_iter()
        .map(|partition| fetch_partition(source, partition, &collected, page_delay));
    try_join_all(tasks).await?;

    let items = collected.into_inner();
    log::info!(
        "{} library fetched: {} entries in {:?}",
        source.service(),
        items.len(),
        started.elapsed()
    );
    Ok(items)
}

async fn fetch_partition<S: PagedLibrary>(
    source: &S,
    partition: S::Partition,
    collected: &Mutex<Vec<S::Item>>,
    page_delay: Duration,
) -> Result<()> {
    let mut cursor = source.first_cursor();
    let mut pages = 0usize;

    loop {
        let page = source
            .fetch_page(partition, cursor)
            .await
            .map_err(|e| AppError::partial_fetch(source.service(), partition, e))?;
        pages += 1;

        let count = page.items.len();
        let total = {
            let mut items = collected.lock().await;
            items.extend(page.items);
            items.len()
        };
        log::debug!(
            "{} [{}] page {}: {} entries ({} collected)",
            source.service(),
            partition,
            pages,
            count,
            total
        );

        match page.next {
            Some(next) => cursor = next,
            None => return Ok(()),
        }

        if !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }
    }
}
