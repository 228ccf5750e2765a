use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::column::{ColumnOptions, EntryColumn};
use crate::domain::{Entry, Feed, FeedSelector, ListContext, ViewType};
use crate::render::Renderer;
use crate::store::{EntryStore, StoreEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Feeds,
    Entries,
    Preview,
}

impl ActivePane {
    pub fn next(self) -> Self {
        match self {
            ActivePane::Feeds => ActivePane::Entries,
            ActivePane::Entries => ActivePane::Preview,
            ActivePane::Preview => ActivePane::Feeds,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActivePane::Feeds => ActivePane::Preview,
            ActivePane::Entries => ActivePane::Feeds,
            ActivePane::Preview => ActivePane::Entries,
        }
    }
}

/// One line of the feeds pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarItem {
    All,
    Collections,
    Folder(String),
    Feed { id: i64, title: String },
}

impl SidebarItem {
    pub fn selector(&self) -> FeedSelector {
        match self {
            SidebarItem::All => FeedSelector::All,
            SidebarItem::Collections => FeedSelector::Collections,
            SidebarItem::Folder(name) => FeedSelector::Folder(name.clone()),
            SidebarItem::Feed { id, .. } => FeedSelector::Feed(*id),
        }
    }
}

pub struct TuiApp {
    pub active_pane: ActivePane,
    pub feeds: Vec<Feed>,
    pub sidebar: Vec<SidebarItem>,
    pub unread_counts: HashMap<i64, i64>,
    pub sidebar_index: usize,
    pub sidebar_state: ListState,
    pub view: ViewType,
    pub unread_only: bool,
    pub column: EntryColumn,
    pub store: EntryStore,
    store_events: broadcast::Receiver<StoreEvent>,
    /// Notifications were lost; counters must be reloaded from the store.
    counts_stale: bool,
    pub preview_scroll: u16,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub is_updating: bool,
    pub maximized: bool,
    pub started_at: Instant,
    /// Where the entry rows were last drawn, for mouse hit testing.
    pub entry_rows_area: Rect,
    // Pending delete confirmation (feed_id, feed_title)
    pub pending_delete: Option<(i64, String)>,
}

impl TuiApp {
    pub fn new(context: ListContext, options: ColumnOptions, store: EntryStore) -> Self {
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));
        let store_events = store.subscribe();

        Self {
            active_pane: ActivePane::Entries,
            feeds: Vec::new(),
            sidebar: vec![SidebarItem::All, SidebarItem::Collections],
            unread_counts: HashMap::new(),
            sidebar_index: 0,
            sidebar_state,
            view: context.view,
            unread_only: context.unread_only,
            column: EntryColumn::new(context, options),
            store,
            store_events,
            counts_stale: false,
            preview_scroll: 0,
            should_quit: false,
            status_message: None,
            is_updating: false,
            maximized: false,
            started_at: Instant::now(),
            entry_rows_area: Rect::default(),
            pending_delete: None,
        }
    }

    /// Replace the feed list, keeping the sidebar cursor on the same item
    /// where possible.
    pub fn set_feeds(&mut self, feeds: Vec<Feed>, unread_counts: HashMap<i64, i64>) {
        let current = self.sidebar.get(self.sidebar_index).cloned();

        let folders: BTreeSet<&str> = feeds.iter().filter_map(|f| f.category.as_deref()).collect();
        let mut sidebar = vec![SidebarItem::All, SidebarItem::Collections];
        sidebar.extend(folders.into_iter().map(|name| SidebarItem::Folder(name.to_string())));
        sidebar.extend(feeds.iter().map(|f| SidebarItem::Feed {
            id: f.id,
            title: f.display_title().to_string(),
        }));

        self.sidebar_index = current
            .and_then(|item| sidebar.iter().position(|s| *s == item))
            .unwrap_or(0);
        self.sidebar_state.select(Some(self.sidebar_index));
        self.sidebar = sidebar;
        self.feeds = feeds;
        self.unread_counts = unread_counts;
        self.counts_stale = false;
    }

    pub fn feed_title(&self, feed_id: i64) -> Option<&str> {
        self.feeds
            .iter()
            .find(|f| f.id == feed_id)
            .map(Feed::display_title)
    }

    pub fn selected_sidebar_item(&self) -> Option<&SidebarItem> {
        self.sidebar.get(self.sidebar_index)
    }

    pub fn context(&self) -> ListContext {
        ListContext::new(
            self.column.context().feed.clone(),
            self.view,
            self.unread_only,
        )
    }

    /// Show the entries of the sidebar item under the cursor.
    pub fn open_sidebar_item(&mut self) {
        if let Some(selector) = self.selected_sidebar_item().map(SidebarItem::selector) {
            self.open_selector(selector);
        }
    }

    /// Show the entries of `selector`. A single feed is shown in the view it
    /// is filed under, or with the fallback renderer when that view is not
    /// one this build knows.
    pub fn open_selector(&mut self, selector: FeedSelector) {
        let raw_view = selector
            .feed_id()
            .and_then(|id| self.feeds.iter().find(|f| f.id == id))
            .map(|f| f.raw_view);
        let mut context = ListContext::new(selector, self.view, self.unread_only);

        match raw_view.map(|raw| (raw, ViewType::from_raw(raw))) {
            Some((_, Some(view))) => {
                context.view = view;
                self.switch_context(context);
            }
            Some((raw, None)) => {
                tracing::warn!("feed filed under unknown view {}", raw);
                self.preview_scroll = 0;
                self.column
                    .switch_context_with_renderer(context, Renderer::lookup(raw));
            }
            None => self.switch_context(context),
        }
    }

    pub fn switch_context(&mut self, context: ListContext) {
        self.view = context.view;
        self.unread_only = context.unread_only;
        self.preview_scroll = 0;
        self.column.switch_context(context);
    }

    pub fn toggle_unread_only(&mut self) {
        let mut context = self.context();
        context.unread_only = !context.unread_only;
        self.switch_context(context);
    }

    pub fn cycle_view(&mut self, forward: bool) {
        let mut context = self.context();
        context.view = if forward {
            context.view.next()
        } else {
            context.view.prev()
        };
        self.switch_context(context);
    }

    pub fn active_entry(&self) -> Option<&Entry> {
        self.column
            .active_entry()
            .and_then(|id| self.store.get(id))
    }

    /// Apply pending store notifications to the unread counters.
    pub fn drain_store_events(&mut self) {
        loop {
            match self.store_events.try_recv() {
                Ok(StoreEvent::ReadChanged {
                    feed_id, is_read, ..
                }) => self.count_read_change(feed_id, is_read),
                Ok(StoreEvent::ReadBatchChanged { is_read, changes }) => {
                    for (feed_id, _) in changes {
                        self.count_read_change(feed_id, is_read);
                    }
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("missed {} store notifications, recounting", skipped);
                    self.counts_stale = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn count_read_change(&mut self, feed_id: i64, is_read: bool) {
        let count = self.unread_counts.entry(feed_id).or_insert(0);
        *count = if is_read { (*count - 1).max(0) } else { *count + 1 };
    }

    /// True when the unread counters missed changes and must be reloaded.
    pub fn counts_stale(&self) -> bool {
        self.counts_stale
    }

    pub fn unread_count(&self, item: &SidebarItem) -> i64 {
        match item {
            SidebarItem::Feed { id, .. } => self.unread_counts.get(id).copied().unwrap_or(0),
            SidebarItem::Folder(name) => self
                .feeds
                .iter()
                .filter(|f| f.category.as_deref() == Some(name.as_str()))
                .map(|f| self.unread_counts.get(&f.id).copied().unwrap_or(0))
                .sum(),
            SidebarItem::All => self.unread_counts.values().sum(),
            SidebarItem::Collections => 0,
        }
    }

    pub fn move_up(&mut self) {
        match self.active_pane {
            ActivePane::Feeds => {
                if self.sidebar_index > 0 {
                    self.sidebar_index -= 1;
                    self.sidebar_state.select(Some(self.sidebar_index));
                }
            }
            ActivePane::Preview => {
                self.preview_scroll = self.preview_scroll.saturating_sub(1);
            }
            // The entry list moves its own selection.
            ActivePane::Entries => {}
        }
    }

    pub fn move_down(&mut self) {
        match self.active_pane {
            ActivePane::Feeds => {
                if self.sidebar_index + 1 < self.sidebar.len() {
                    self.sidebar_index += 1;
                    self.sidebar_state.select(Some(self.sidebar_index));
                }
            }
            ActivePane::Preview => {
                self.preview_scroll = self.preview_scroll.saturating_add(1);
            }
            ActivePane::Entries => {}
        }
    }

    pub fn toggle_maximize(&mut self) {
        self.maximized = !self.maximized;
        if self.maximized {
            self.active_pane = ActivePane::Preview;
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}
