use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::app::{Result, RillError};
use crate::domain::{Feed, FeedUpdate};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 10;

/// Refreshes many feeds at once, bounded by a semaphore.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Fetch every feed and store new entries. Returns the number of new
    /// entries per feed id.
    pub async fn fetch_all<S: Store + Send + Sync + ?Sized + 'static>(
        &self,
        feeds: Vec<Feed>,
        store: Arc<S>,
        normalizer: &Normalizer,
    ) -> Vec<(i64, Result<usize>)> {
        let handles = feeds.into_iter().map(|feed| {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let store = store.clone();
            let normalizer = normalizer.clone();

            tokio::spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => refresh_feed(fetcher.as_ref(), &feed, store.as_ref(), &normalizer).await,
                    Err(e) => Err(RillError::Other(format!("Fetch pool closed: {}", e))),
                };
                (feed.id, result)
            })
        });

        let mut results = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Task join error: {}", e),
            }
        }

        results
    }
}

/// Fetch a single feed, update its metadata and store new entries.
pub async fn refresh_feed<S: Store + ?Sized>(
    fetcher: &(dyn Fetcher + Send + Sync),
    feed: &Feed,
    store: &S,
    normalizer: &Normalizer,
) -> Result<usize> {
    let result = fetcher
        .fetch(&feed.url, feed.etag.as_deref(), feed.last_modified.as_deref())
        .await?;

    match result {
        FetchResult::NotModified => {
            tracing::debug!("Feed {} not modified", feed.url);
            Ok(0)
        }
        FetchResult::Content {
            body,
            etag,
            last_modified,
        } => {
            let (meta, entries) = normalizer.normalize(feed.id, &feed.url, &body)?;

            let update = FeedUpdate {
                title: meta.title,
                description: meta.description,
                etag,
                last_modified,
                last_fetched_at: Some(chrono::Utc::now()),
            };
            store.update_feed(feed.id, &update)?;

            let new_count = store.add_entries(&entries)?;
            tracing::info!("Added {} new entries from {}", new_count, feed.url);

            Ok(new_count)
        }
    }
}
