use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::app::{Result, RillError};
use crate::domain::{EntryCursor, ListContext};
use crate::query::{FetchKind, Page, PageRequest};
use crate::store::EntryStore;

/// What [`EntryQuery::apply`] did with a loaded page.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The page belongs to an older request and was dropped.
    Stale,
    Applied,
    Failed(RillError),
}

/// Loaded pages for one list context.
///
/// At most one request is in flight. A new request (context switch or
/// refetch) supersedes the previous one, whose result is then discarded.
#[derive(Debug)]
pub struct EntryQuery {
    context: ListContext,
    page_size: usize,
    generation: u64,
    seq: u64,
    in_flight: Option<(u64, FetchKind)>,
    /// Row ids with their grouping day, one list per page in load order.
    pages: Vec<Vec<(String, NaiveDate)>>,
    /// Last entry of the last loaded page.
    cursor: Option<EntryCursor>,
    total_count: usize,
    has_next_page: bool,
    loaded: bool,
    has_update: bool,
}

impl EntryQuery {
    pub fn new(context: ListContext, page_size: usize) -> Self {
        Self {
            context,
            page_size: page_size.max(1),
            generation: 0,
            seq: 0,
            in_flight: None,
            pages: Vec::new(),
            cursor: None,
            total_count: 0,
            has_next_page: false,
            loaded: false,
            has_update: false,
        }
    }

    pub fn context(&self) -> &ListContext {
        &self.context
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new session for `context` and return the first page request.
    pub fn start(&mut self, context: ListContext) -> PageRequest {
        self.generation += 1;
        self.context = context;
        self.pages.clear();
        self.cursor = None;
        self.total_count = 0;
        self.has_next_page = false;
        self.loaded = false;
        self.has_update = false;
        self.request(FetchKind::Initial, None, self.page_size)
    }

    /// The next page, unless one is already loading or there is none.
    pub fn fetch_next_page(&mut self) -> Option<PageRequest> {
        if self.is_fetching() || !self.has_next_page {
            return None;
        }
        let after = self.cursor.clone();
        Some(self.request(FetchKind::NextPage, after, self.page_size))
    }

    /// Reload everything loaded so far in one request from the top.
    /// Supersedes any request in flight.
    pub fn refetch(&mut self) -> PageRequest {
        let loaded: usize = self.pages.iter().map(Vec::len).sum();
        self.request(FetchKind::Refetch, None, loaded.max(self.page_size))
    }

    fn request(
        &mut self,
        kind: FetchKind,
        after: Option<EntryCursor>,
        limit: usize,
    ) -> PageRequest {
        self.seq += 1;
        self.in_flight = Some((self.seq, kind));
        PageRequest {
            generation: self.generation,
            seq: self.seq,
            kind,
            context: self.context.clone(),
            after,
            limit,
        }
    }

    /// Merge a loaded page. Entries go to `store`; only ids are kept here.
    pub fn apply(
        &mut self,
        request: &PageRequest,
        result: Result<Page>,
        store: &mut EntryStore,
    ) -> ApplyOutcome {
        let current = self.in_flight.map(|(seq, _)| seq);
        if request.generation != self.generation || current != Some(request.seq) {
            debug!(
                "dropping stale page (generation {}, seq {}); current generation {}",
                request.generation, request.seq, self.generation
            );
            return ApplyOutcome::Stale;
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("loading {:?} page failed: {}", request.kind, e);
                self.loaded = true;
                return ApplyOutcome::Failed(e);
            }
        };

        if request.kind == FetchKind::Refetch {
            self.pages.clear();
            self.has_update = false;
        }

        let ids = page
            .entries
            .iter()
            .map(|e| (e.id.clone(), e.day()))
            .collect();
        self.pages.push(ids);
        if let Some(last) = page.entries.last() {
            self.cursor = Some(last.cursor());
        } else if request.kind == FetchKind::Refetch {
            self.cursor = None;
        }
        self.total_count = page.total_count;
        self.has_next_page = page.has_next;
        self.loaded = true;

        debug!(
            "loaded {} entries ({:?}), total {}",
            page.entries.len(),
            request.kind,
            page.total_count
        );
        store.upsert(page.entries);
        ApplyOutcome::Applied
    }

    /// Ids in display order. An entry that moved between pages while
    /// loading is listed once, at its first position.
    pub fn ids(&self) -> Vec<(&str, NaiveDate)> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for (id, day) in self.pages.iter().flatten() {
            if seen.insert(id.as_str()) {
                ids.push((id.as_str(), *day));
            }
        }
        ids
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_fetching_next_page(&self) -> bool {
        matches!(self.in_flight, Some((_, FetchKind::NextPage)))
    }

    /// Nothing has arrived yet for this session.
    pub fn is_loading(&self) -> bool {
        !self.loaded
    }

    pub fn has_update(&self) -> bool {
        self.has_update
    }

    pub fn mark_update_available(&mut self) {
        self.has_update = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Entry, Feed, FeedSelector, ViewType};
    use crate::query::{run_request, QueryEvent, StorePageSource};
    use crate::store::{SqliteStore, Store};

    fn context() -> ListContext {
        ListContext::new(FeedSelector::All, ViewType::Articles, false)
    }

    fn page(ids: &[&str], total_count: usize, has_next: bool) -> Page {
        let entries = ids
            .iter()
            .map(|id| {
                let mut entry = Entry::new(1, "https://example.com/feed.xml", id);
                entry.id = id.to_string();
                entry
            })
            .collect();
        Page {
            entries,
            total_count,
            has_next,
        }
    }

    fn ids(query: &EntryQuery) -> Vec<&str> {
        query.ids().into_iter().map(|(id, _)| id).collect()
    }

    #[test]
    fn test_initial_then_next_page() {
        let mut store = EntryStore::new();
        let mut query = EntryQuery::new(context(), 2);
        let first = query.start(context());
        assert!(query.is_loading());
        assert!(query.is_fetching());
        assert!(!query.is_fetching_next_page());

        assert!(matches!(
            query.apply(&first, Ok(page(&["a", "b"], 3, true)), &mut store),
            ApplyOutcome::Applied
        ));
        assert!(!query.is_loading());
        assert_eq!(query.total_count(), 3);

        let next = query.fetch_next_page().unwrap();
        assert_eq!(next.after.as_ref().map(|c| c.id.as_str()), Some("b"));
        assert!(query.is_fetching_next_page());
        // Guarded while the page is in flight.
        assert!(query.fetch_next_page().is_none());

        query.apply(&next, Ok(page(&["c"], 3, false)), &mut store);
        assert_eq!(ids(&query), vec!["a", "b", "c"]);
        assert!(!query.has_next_page());
        assert!(query.fetch_next_page().is_none());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_context_switch_discards_stale_page() {
        let mut store = EntryStore::new();
        let mut query = EntryQuery::new(context(), 10);
        let old = query.start(context());

        let starred = ListContext::new(FeedSelector::Collections, ViewType::Articles, false);
        let new = query.start(starred);

        assert!(matches!(
            query.apply(&old, Ok(page(&["old"], 1, false)), &mut store),
            ApplyOutcome::Stale
        ));
        assert!(ids(&query).is_empty());
        assert!(query.is_fetching());
        assert!(store.is_empty());

        query.apply(&new, Ok(page(&["fresh"], 1, false)), &mut store);
        assert_eq!(ids(&query), vec!["fresh"]);
    }

    #[test]
    fn test_failure_keeps_has_next_page() {
        let mut store = EntryStore::new();
        let mut query = EntryQuery::new(context(), 2);
        let first = query.start(context());
        query.apply(&first, Ok(page(&["a", "b"], 4, true)), &mut store);

        let next = query.fetch_next_page().unwrap();
        let outcome = query.apply(
            &next,
            Err(RillError::Other("connection reset".into())),
            &mut store,
        );
        assert!(matches!(outcome, ApplyOutcome::Failed(_)));
        assert!(!query.is_fetching());
        assert!(query.has_next_page());
        let retry = query.fetch_next_page().unwrap();
        assert_eq!(retry.after, next.after);
    }

    #[test]
    fn test_refetch_replaces_pages_and_clears_update() {
        let mut store = EntryStore::new();
        let mut query = EntryQuery::new(context(), 2);
        let first = query.start(context());
        query.apply(&first, Ok(page(&["a", "b"], 4, true)), &mut store);
        let next = query.fetch_next_page().unwrap();
        query.apply(&next, Ok(page(&["c", "d"], 4, false)), &mut store);
        query.mark_update_available();

        let refetch = query.refetch();
        assert_eq!((refetch.after.clone(), refetch.limit), (None, 4));
        assert!(query.is_fetching());
        query.apply(&refetch, Ok(page(&["n", "a", "b", "c"], 5, true)), &mut store);

        assert_eq!(ids(&query), vec!["n", "a", "b", "c"]);
        assert!(!query.has_update());
        let next = query.fetch_next_page().unwrap();
        assert_eq!(next.after.map(|c| c.id), Some("c".to_string()));
    }

    #[test]
    fn test_refetch_supersedes_next_page() {
        let mut store = EntryStore::new();
        let mut query = EntryQuery::new(context(), 2);
        let first = query.start(context());
        query.apply(&first, Ok(page(&["a", "b"], 4, true)), &mut store);

        let next = query.fetch_next_page().unwrap();
        let refetch = query.refetch();
        assert!(matches!(
            query.apply(&next, Ok(page(&["c", "d"], 4, false)), &mut store),
            ApplyOutcome::Stale
        ));
        assert!(matches!(
            query.apply(&refetch, Ok(page(&["a", "b"], 4, true)), &mut store),
            ApplyOutcome::Applied
        ));
        assert_eq!(ids(&query), vec!["a", "b"]);
    }

    #[test]
    fn test_shifted_entries_listed_once() {
        let mut store = EntryStore::new();
        let mut query = EntryQuery::new(context(), 2);
        let first = query.start(context());
        query.apply(&first, Ok(page(&["a", "b"], 5, true)), &mut store);
        // A new entry arrived at the top, pushing "b" into the next page.
        let next = query.fetch_next_page().unwrap();
        query.apply(&next, Ok(page(&["b", "c"], 5, true)), &mut store);

        assert_eq!(ids(&query), vec!["a", "b", "c"]);
    }

    async fn load(
        source: &StorePageSource,
        request: PageRequest,
        query: &mut EntryQuery,
        store: &mut EntryStore,
    ) {
        match run_request(source, request).await {
            QueryEvent::PageLoaded { request, result } => {
                assert!(matches!(query.apply(&request, result, store), ApplyOutcome::Applied));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unread_list_reaches_every_entry_after_reading_first_page() {
        let backend = Arc::new(SqliteStore::in_memory().unwrap());
        let feed_url = "https://example.com/feed.xml";
        let feed_id = backend.add_feed(&Feed::new(feed_url.into())).unwrap();
        let entries: Vec<Entry> = (0..8)
            .map(|i| {
                let mut entry = Entry::new(feed_id, feed_url, &format!("e{}", i));
                entry.published_at = Some(format!("2024-01-0{}T00:00:00Z", i + 1).parse().unwrap());
                entry
            })
            .collect();
        backend.add_entries(&entries).unwrap();

        let source = StorePageSource::new(backend.clone());
        let mut store = EntryStore::with_backend(backend.clone());
        let unread = ListContext::new(FeedSelector::All, ViewType::Articles, true);
        let mut query = EntryQuery::new(unread.clone(), 4);

        let first = query.start(unread);
        load(&source, first, &mut query, &mut store).await;
        let first_page: Vec<String> = ids(&query).into_iter().map(String::from).collect();
        assert_eq!(first_page.len(), 4);

        // Reading the first page removes it from the unread result set.
        store
            .mark_all_read(first_page.iter().map(String::as_str))
            .unwrap();

        let next = query.fetch_next_page().unwrap();
        load(&source, next, &mut query, &mut store).await;
        assert!(!query.has_next_page());

        let expected: Vec<String> = entries.iter().rev().map(|e| e.id.clone()).collect();
        let loaded: Vec<String> = ids(&query).into_iter().map(String::from).collect();
        assert_eq!(loaded, expected);
    }
}
