//! Paged loading of the entry list.
//!
//! Requests leave the UI loop as [`PageRequest`]s, run on tokio tasks against
//! a [`PageSource`], and come back as [`QueryEvent`]s. [`EntryQuery`] keeps
//! the loaded pages and drops any result that belongs to an older request.

mod entry_query;

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{EntryCursor, ListContext};
use crate::store::Store;

pub use crate::store::Page;
pub use entry_query::{ApplyOutcome, EntryQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page of a new list session.
    Initial,
    NextPage,
    /// Reload everything loaded so far.
    Refetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// List session the request belongs to.
    pub generation: u64,
    /// Request sequence number within the session.
    pub seq: u64,
    pub kind: FetchKind,
    pub context: ListContext,
    /// Resume after this entry; `None` starts at the top.
    pub after: Option<EntryCursor>,
    pub limit: usize,
}

/// Result of asynchronous work started by the entry column.
#[derive(Debug)]
pub enum QueryEvent {
    PageLoaded {
        request: PageRequest,
        result: Result<Page>,
    },
    Translated {
        generation: u64,
        entry_id: String,
        language: String,
        result: Result<String>,
    },
    FeedRefreshed {
        generation: u64,
        feed_id: i64,
        result: Result<usize>,
    },
    /// A refresh of all feeds finished.
    FeedsUpdated {
        new_entries: usize,
        failed: usize,
        /// Every failure was a connection failure.
        offline: bool,
    },
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load_page(
        &self,
        context: &ListContext,
        after: Option<&EntryCursor>,
        limit: usize,
    ) -> Result<Page>;
}

/// Reads pages from the persistent store.
pub struct StorePageSource {
    store: Arc<dyn Store + Send + Sync>,
}

impl StorePageSource {
    pub fn new(store: Arc<dyn Store + Send + Sync>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PageSource for StorePageSource {
    async fn load_page(
        &self,
        context: &ListContext,
        after: Option<&EntryCursor>,
        limit: usize,
    ) -> Result<Page> {
        self.store.query_page(context, after, limit)
    }
}

/// Run a request against a source and wrap the outcome as an event.
pub async fn run_request(source: &dyn PageSource, request: PageRequest) -> QueryEvent {
    let result = source
        .load_page(&request.context, request.after.as_ref(), request.limit)
        .await;
    QueryEvent::PageLoaded { request, result }
}
