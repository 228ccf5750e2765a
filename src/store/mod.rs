pub mod entries;
pub mod sqlite;

use crate::app::Result;
use crate::domain::{Entry, EntryCursor, Feed, FeedUpdate, ListContext};

pub use entries::{EntryStore, StoreEvent};
pub use sqlite::SqliteStore;

/// One page of entries for a list context.
#[derive(Debug, Clone)]
pub struct Page {
    pub entries: Vec<Entry>,
    /// Entries matching the context at load time.
    pub total_count: usize,
    pub has_next: bool,
}

/// Persistent storage for feeds, entries and per-entry state.
pub trait Store {
    // Feed operations
    fn add_feed(&self, feed: &Feed) -> Result<i64>;
    fn get_feed(&self, id: i64) -> Result<Option<Feed>>;
    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;
    fn get_all_feeds(&self) -> Result<Vec<Feed>>;
    fn update_feed(&self, id: i64, update: &FeedUpdate) -> Result<()>;
    fn delete_feed(&self, id: i64) -> Result<()>;

    // Entry operations
    fn add_entries(&self, entries: &[Entry]) -> Result<usize>;
    fn get_entry(&self, id: &str) -> Result<Option<Entry>>;
    fn entry_exists(&self, id: &str) -> Result<bool>;
    /// Up to `limit` entries matching `ctx`, newest first, starting after
    /// `after`. The page and its total count are read from one snapshot.
    fn query_page(
        &self,
        ctx: &ListContext,
        after: Option<&EntryCursor>,
        limit: usize,
    ) -> Result<Page>;

    // State operations
    fn set_read(&self, entry_id: &str, is_read: bool) -> Result<()>;
    fn set_starred(&self, entry_id: &str, is_starred: bool) -> Result<()>;
    fn set_translation(
        &self,
        entry_id: &str,
        language: Option<&str>,
        translated_title: Option<&str>,
    ) -> Result<()>;
    fn get_unread_count(&self, feed_id: i64) -> Result<i64>;
}
