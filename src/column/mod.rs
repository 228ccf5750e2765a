//! The entry column.
//!
//! [`EntryColumn`] owns everything about the list on screen for one
//! [`ListContext`]: loaded pages, the row sequence, the scroll window, fast
//! scroll detection, read marking and the selected entry. It never performs
//! I/O. Work that needs it is queued as [`ColumnCommand`]s, and the results
//! come back through [`EntryColumn::apply`].

pub mod header;
pub mod read_marker;
pub mod scroll_seek;
pub mod virtualizer;

use std::collections::HashSet;
use std::time::Instant;

use crossterm::event::KeyCode;
use tracing::{debug, info, warn};

use crate::app::{Result, RillError};
use crate::config::{Config, ListConfig, MarkReadConfig, ScrollSeekConfig};
use crate::domain::row::build_rows;
use crate::domain::{Feed, ListContext, ListRow};
use crate::query::{ApplyOutcome, EntryQuery, FetchKind, PageRequest, QueryEvent};
use crate::render::Renderer;
use crate::store::EntryStore;

use header::{header_title, EmptyState, HeaderInput, HeaderModel};
use read_marker::{ReadPolicy, ReadRangeMarker};
use scroll_seek::{ScrollSeek, VelocityTracker};
use virtualizer::{EntryVirtualizer, KeyDisposition, VirtualizerOptions, VisibleRange};

#[derive(Debug, Clone, Default)]
pub struct ColumnOptions {
    pub list: ListConfig,
    pub scroll_seek: ScrollSeekConfig,
    pub mark_read: MarkReadConfig,
    /// Titles are only translated when a translator is configured.
    pub translation_enabled: bool,
    pub translation_language: String,
    pub user_id: Option<String>,
}

impl ColumnOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            list: config.list.clone(),
            scroll_seek: config.scroll_seek.clone(),
            mark_read: config.mark_read.clone(),
            translation_enabled: config.translation.endpoint.is_some(),
            translation_language: config.translation.language.clone(),
            user_id: config.user.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub generation: u64,
    pub entry_id: String,
    pub text: String,
    pub language: String,
}

/// Asynchronous work requested by the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnCommand {
    LoadPage(PageRequest),
    Translate(TranslateRequest),
    /// Full resync of a feed the user owns.
    RefreshFeed { generation: u64, feed_id: i64 },
}

pub struct EntryColumn {
    options: ColumnOptions,
    query: EntryQuery,
    rows: Vec<ListRow>,
    renderer: Renderer,
    width: u16,
    virtualizer: EntryVirtualizer,
    velocity: VelocityTracker,
    seek: ScrollSeek,
    marker: ReadRangeMarker,
    interacted: bool,
    /// Re-examine the visible rows on the next window sync.
    rescan: bool,
    active: Option<String>,
    translations: HashSet<String>,
    online: bool,
    owner_refresh_pending: bool,
    next_page_since: Option<Instant>,
    commands: Vec<ColumnCommand>,
}

impl EntryColumn {
    pub fn new(context: ListContext, options: ColumnOptions) -> Self {
        let renderer = Renderer::for_view(context.view);
        let virtualizer = EntryVirtualizer::new(
            renderer.layout(0),
            VirtualizerOptions {
                overscan: options.list.overscan,
                end_reached_threshold: options.list.end_reached_threshold,
            },
        );
        let mut column = Self {
            query: EntryQuery::new(context.clone(), options.list.page_size),
            rows: Vec::new(),
            renderer,
            width: 0,
            virtualizer,
            velocity: VelocityTracker::new(options.scroll_seek.settle()),
            seek: ScrollSeek::new(
                options.scroll_seek.enter_velocity,
                options.scroll_seek.exit_velocity,
            ),
            marker: ReadRangeMarker::new(options.mark_read.policy, options.mark_read.dwell()),
            interacted: false,
            rescan: false,
            active: None,
            translations: HashSet::new(),
            online: true,
            owner_refresh_pending: false,
            next_page_since: None,
            commands: Vec::new(),
            options,
        };
        let request = column.query.start(context);
        column.commands.push(ColumnCommand::LoadPage(request));
        column
    }

    pub fn context(&self) -> &ListContext {
        self.query.context()
    }

    pub fn generation(&self) -> u64 {
        self.query.generation()
    }

    pub fn take_commands(&mut self) -> Vec<ColumnCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Start a new list session. Scroll returns to the top and results of
    /// requests made for the old context are dropped when they arrive.
    pub fn switch_context(&mut self, context: ListContext) {
        let renderer = Renderer::for_view(context.view);
        self.switch_context_with_renderer(context, renderer);
    }

    /// Like [`switch_context`](Self::switch_context), drawing rows with
    /// `renderer` instead of the one registered for the context's view.
    pub fn switch_context_with_renderer(&mut self, context: ListContext, renderer: Renderer) {
        if &context == self.query.context() && renderer == self.renderer {
            return;
        }
        info!(
            "entry list: feed {} view {:?} unread_only {} renderer {:?}",
            context.feed, context.view, context.unread_only, renderer
        );

        self.renderer = renderer;
        let request = self.query.start(context);

        self.rows.clear();
        self.virtualizer.reset();
        self.virtualizer.set_layout(self.renderer.layout(self.width));
        self.velocity.reset();
        self.seek.reset();
        self.marker.reset();
        self.interacted = false;
        self.rescan = false;
        self.active = None;
        self.translations.clear();
        self.owner_refresh_pending = false;
        self.next_page_since = None;
        self.commands.push(ColumnCommand::LoadPage(request));
    }

    pub fn set_viewport(
        &mut self,
        width: u16,
        height: u16,
        store: &mut EntryStore,
        now: Instant,
    ) -> Result<()> {
        if width == self.width && height == self.virtualizer.viewport_height() {
            return Ok(());
        }
        self.width = width;
        self.virtualizer.set_layout(self.renderer.layout(width));
        self.virtualizer.set_viewport_height(height);
        self.sync_window(store, now)
    }

    /// Wheel or trackpad scroll by `delta_lines`.
    pub fn on_scroll(&mut self, delta_lines: isize, store: &mut EntryStore, now: Instant) -> Result<()> {
        self.interact();
        let velocity = self.velocity.record(delta_lines as f64, now);
        self.seek.update(velocity);
        self.virtualizer.scroll_by(delta_lines);
        self.sync_window(store, now)
    }

    /// Apply the list's own key handling. Suppressed and ignored keys are
    /// left for the shortcut layer.
    pub fn on_key(
        &mut self,
        code: KeyCode,
        store: &mut EntryStore,
        now: Instant,
    ) -> Result<KeyDisposition> {
        let disposition = self.virtualizer.key_disposition(code);
        match disposition {
            KeyDisposition::ScrollBy(lines) => {
                self.virtualizer.scroll_by(lines);
            }
            KeyDisposition::ScrollToTop => {
                self.virtualizer.scroll_to_top();
            }
            KeyDisposition::ScrollToBottom => {
                self.virtualizer.scroll_to_bottom();
            }
            KeyDisposition::Suppressed | KeyDisposition::Ignored => return Ok(disposition),
        }
        self.interact();
        self.sync_window(store, now)?;
        Ok(disposition)
    }

    /// Row index under a cell of the column area.
    pub fn index_at(&self, x: u16, y: u16) -> Option<usize> {
        let layout = self.virtualizer.layout();
        let per_line = layout.items_per_line();
        let line = self.virtualizer.scroll_line() + (y / layout.line_height()) as usize;
        let cell_width = (self.width as usize / per_line).max(1);
        let column = (x as usize / cell_width).min(per_line - 1);
        let index = line * per_line + column;
        (index < self.rows.len()).then_some(index)
    }

    pub fn click(&mut self, index: usize, store: &mut EntryStore, now: Instant) -> Result<()> {
        self.interact();
        self.open(index, store, now)
    }

    pub fn select_next(&mut self, store: &mut EntryStore, now: Instant) -> Result<()> {
        self.move_selection(true, store, now)
    }

    pub fn select_prev(&mut self, store: &mut EntryStore, now: Instant) -> Result<()> {
        self.move_selection(false, store, now)
    }

    fn move_selection(&mut self, forward: bool, store: &mut EntryStore, now: Instant) -> Result<()> {
        let step = self.virtualizer.layout().items_per_line();
        let visible = self.virtualizer.visible_range();

        // Grids move a whole line of cards at a time.
        let mut candidates: Box<dyn Iterator<Item = usize>> = match (self.active_index(), forward) {
            (Some(i), true) => Box::new((i + step..self.rows.len()).step_by(step)),
            (Some(i), false) => Box::new((0..i).rev().filter(move |j| (i - j) % step == 0)),
            (None, true) => Box::new(visible.start..self.rows.len()),
            (None, false) => Box::new((0..visible.end).rev()),
        };

        let target = candidates.find(|&i| !self.rows[i].is_separator());
        match target {
            Some(index) => {
                self.interact();
                self.open(index, store, now)
            }
            None => Ok(()),
        }
    }

    /// Make the entry at `index` the active one. Opening marks it read,
    /// except in the collections list.
    fn open(&mut self, index: usize, store: &mut EntryStore, now: Instant) -> Result<()> {
        let Some(id) = self.rows.get(index).and_then(ListRow::entry_id).map(String::from) else {
            return Ok(());
        };

        let moved = self.virtualizer.scroll_into_view(index);
        if moved || self.rescan {
            self.sync_window(store, now)?;
        }

        if !self.context().feed.is_collection() {
            if let Some(feed_id) = store.get(&id).map(|e| e.feed_id) {
                store.mark_read(feed_id, &id, true)?;
            }
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    pub fn active_entry(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn active_index(&self) -> Option<usize> {
        let active = self.active.as_deref()?;
        self.rows.iter().position(|row| row.entry_id() == Some(active))
    }

    /// Periodic upkeep: velocity decay, dwell timers, footer delay.
    pub fn tick(&mut self, store: &mut EntryStore, now: Instant) -> Result<()> {
        let was_seeking = self.seek.is_active();
        let velocity = self.velocity.settle(now);
        let seeking = self.seek.update(velocity);
        if was_seeking && !seeking {
            self.request_translations(store);
        }

        let due = self.marker.poll(now);
        self.mark_ids(due, store)?;

        if self.query.is_fetching_next_page() {
            self.next_page_since.get_or_insert(now);
        } else {
            self.next_page_since = None;
        }
        Ok(())
    }

    /// Merge the result of a command.
    pub fn apply(&mut self, event: QueryEvent, store: &mut EntryStore, now: Instant) -> Result<()> {
        match event {
            QueryEvent::PageLoaded { request, result } => {
                match self.query.apply(&request, result, store) {
                    ApplyOutcome::Stale => Ok(()),
                    ApplyOutcome::Applied => {
                        self.online = true;
                        if request.kind != FetchKind::NextPage {
                            self.evict_unlisted(store);
                        }
                        self.rebuild_rows();
                        // A refetch can leave the row count unchanged while
                        // the window still sits at the end.
                        self.virtualizer.rearm_end_reached();
                        self.sync_window(store, now)
                    }
                    ApplyOutcome::Failed(e) => {
                        self.note_failure(&e);
                        Err(e)
                    }
                }
            }
            QueryEvent::Translated {
                generation,
                entry_id,
                language,
                result,
            } => {
                if generation != self.generation() {
                    debug!("dropping translation of {} from an old list", entry_id);
                    return Ok(());
                }
                match result {
                    Ok(title) => {
                        if store.get(&entry_id).is_some() {
                            store.set_translation(&entry_id, Some(&language), Some(&title))?;
                        }
                        Ok(())
                    }
                    Err(e) => {
                        self.note_failure(&e);
                        Err(e)
                    }
                }
            }
            QueryEvent::FeedRefreshed {
                generation,
                feed_id,
                result,
            } => {
                if generation != self.generation() {
                    debug!("dropping refresh of feed {} from an old list", feed_id);
                    return Ok(());
                }
                self.owner_refresh_pending = false;
                match result {
                    Ok(new_entries) => {
                        info!("feed {} refreshed, {} new entries", feed_id, new_entries);
                        self.online = true;
                        let request = self.query.refetch();
                        self.commands.push(ColumnCommand::LoadPage(request));
                        Ok(())
                    }
                    Err(e) => {
                        self.note_failure(&e);
                        Err(e)
                    }
                }
            }
            QueryEvent::FeedsUpdated {
                new_entries,
                offline,
                ..
            } => {
                self.online = !offline;
                if new_entries > 0 {
                    self.query.mark_update_available();
                }
                Ok(())
            }
        }
    }

    /// Resync the feed when the user owns it, otherwise reload the list.
    pub fn refresh(&mut self, feeds: &[Feed]) {
        match self.owned_feed(feeds) {
            Some(feed_id) if self.online => {
                if !self.owner_refresh_pending {
                    self.owner_refresh_pending = true;
                    self.commands.push(ColumnCommand::RefreshFeed {
                        generation: self.generation(),
                        feed_id,
                    });
                }
            }
            _ => {
                let request = self.query.refetch();
                self.commands.push(ColumnCommand::LoadPage(request));
            }
        }
    }

    fn owned_feed(&self, feeds: &[Feed]) -> Option<i64> {
        let feed_id = self.context().feed.feed_id()?;
        feeds
            .iter()
            .find(|f| f.id == feed_id && f.is_owned_by(self.options.user_id.as_deref()))
            .map(|f| f.id)
    }

    /// Mark every loaded entry read.
    pub fn mark_all_read(&self, store: &mut EntryStore) -> Result<usize> {
        let ids = self.query.ids();
        store.mark_all_read(ids.iter().map(|(id, _)| *id))
    }

    /// Turn title translation on or off for the active entry.
    pub fn toggle_translation(&mut self, store: &mut EntryStore) -> Result<bool> {
        if !self.options.translation_enabled {
            return Ok(false);
        }
        let Some(id) = self.active.clone() else {
            return Ok(false);
        };
        let Some(entry) = store.get(&id) else {
            return Ok(false);
        };

        let translated = entry.settings.translation.is_some();
        if translated {
            self.translations.remove(&id);
            store.set_translation(&id, None, None)?;
        } else {
            let language = self.options.translation_language.clone();
            store.set_translation(&id, Some(&language), None)?;
            self.request_translations(store);
        }
        Ok(true)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    fn note_failure(&mut self, error: &RillError) {
        if error.is_offline() {
            warn!("network unreachable: {}", error);
            self.online = false;
        }
    }

    fn interact(&mut self) {
        if !self.interacted {
            self.interacted = true;
            self.rescan = true;
        }
    }

    fn range_marking_enabled(&self) -> bool {
        self.options.mark_read.policy != ReadPolicy::Off && !self.context().view.descriptor().wide_mode
    }

    /// Drop entries of earlier lists from the store. The active entry stays
    /// for the preview pane.
    fn evict_unlisted(&self, store: &mut EntryStore) {
        let keep: HashSet<&str> = self
            .query
            .ids()
            .into_iter()
            .map(|(id, _)| id)
            .chain(self.active.as_deref())
            .collect();
        let evicted = store.retain(|entry| keep.contains(entry.id.as_str()));
        if evicted > 0 {
            debug!("evicted {} entries no longer listed", evicted);
        }
    }

    fn rebuild_rows(&mut self) {
        let separators = !self.renderer.is_grid();
        self.rows = build_rows(self.query.ids(), separators);
        self.virtualizer.set_total_count(self.rows.len());
    }

    /// React to a moved, resized or refilled window.
    fn sync_window(&mut self, store: &mut EntryStore, now: Instant) -> Result<()> {
        if self.virtualizer.check_end_reached() {
            if let Some(request) = self.query.fetch_next_page() {
                debug!(
                    "end of list reached, loading after {:?}",
                    request.after.as_ref().map(|c| c.id.as_str())
                );
                self.commands.push(ColumnCommand::LoadPage(request));
            }
        }

        let changed = self.virtualizer.take_range_change();
        let range = match changed {
            Some(range) => Some(range),
            None if self.rescan => Some(self.virtualizer.visible_range()),
            None => None,
        };
        self.rescan = false;

        if let Some(range) = range {
            debug!(
                "visible rows {}..{} of {}",
                range.start,
                range.end,
                self.rows.len()
            );
            if self.range_marking_enabled() {
                let due = self
                    .marker
                    .on_range_changed(range, &self.rows, self.interacted, now);
                self.mark_ids(due, store)?;
            }
        }

        if !self.seek.is_active() {
            self.request_translations(store);
        }
        Ok(())
    }

    fn mark_ids(&mut self, ids: Vec<String>, store: &mut EntryStore) -> Result<()> {
        for id in ids {
            // Evicted entries are skipped; they are marked when seen again.
            if let Some(feed_id) = store.get(&id).map(|e| e.feed_id) {
                store.mark_read(feed_id, &id, true)?;
            }
        }
        Ok(())
    }

    /// Ask for translated titles of rendered entries that want one.
    fn request_translations(&mut self, store: &EntryStore) {
        if !self.options.translation_enabled {
            return;
        }
        let generation = self.generation();
        for index in self.virtualizer.rendered_range().as_range() {
            let Some(id) = self.rows.get(index).and_then(ListRow::entry_id) else {
                continue;
            };
            let Some(entry) = store.get(id) else {
                continue;
            };
            let (Some(language), Some(title)) = (&entry.settings.translation, &entry.title) else {
                continue;
            };
            if entry.translated_title.is_some() || !self.translations.insert(id.to_string()) {
                continue;
            }
            self.commands.push(ColumnCommand::Translate(TranslateRequest {
                generation,
                entry_id: id.to_string(),
                text: title.clone(),
                language: language.clone(),
            }));
        }
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn renderer(&self) -> Renderer {
        self.renderer
    }

    pub fn virtualizer(&self) -> &EntryVirtualizer {
        &self.virtualizer
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.virtualizer.visible_range()
    }

    /// Rows are drawn as placeholders while this is true.
    pub fn is_seeking(&self) -> bool {
        self.seek.is_active()
    }

    pub fn is_loading(&self) -> bool {
        self.query.is_loading()
    }

    pub fn query(&self) -> &EntryQuery {
        &self.query
    }

    /// Loading row below the list, shown once the next page has been
    /// loading for the configured delay.
    pub fn footer_skeleton_visible(&self, now: Instant) -> bool {
        self.query.is_fetching_next_page()
            && self
                .next_page_since
                .is_some_and(|since| now.saturating_duration_since(since) >= self.options.list.skeleton_delay())
    }

    pub fn header(&self, feeds: &[Feed]) -> HeaderModel {
        let context = self.context();
        let title = header_title(context, feeds);
        HeaderModel::derive(&HeaderInput {
            context,
            title: title.as_deref(),
            total_count: self.query.total_count(),
            active_entry: self.active.as_deref(),
            is_fetching: self.query.is_fetching(),
            is_fetching_next_page: self.query.is_fetching_next_page(),
            owner_refresh_pending: self.owner_refresh_pending,
            has_update: self.query.has_update(),
            online: self.online,
            owned_by_user: self.owned_feed(feeds).is_some(),
        })
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        EmptyState::derive(
            self.query.is_loading(),
            self.query.total_count(),
            self.context().unread_only,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::column::header::RefreshAffordance;
    use crate::domain::{Entry, FeedSelector, ViewType};
    use crate::query::Page;

    fn options(dwell_ms: u64) -> ColumnOptions {
        ColumnOptions {
            list: ListConfig {
                overscan: 0,
                end_reached_threshold: 1,
                page_size: 4,
                skeleton_delay_ms: 100,
            },
            mark_read: MarkReadConfig {
                policy: ReadPolicy::Render,
                dwell_ms,
            },
            translation_enabled: true,
            translation_language: "de".into(),
            user_id: Some("me".into()),
            ..ColumnOptions::default()
        }
    }

    fn ctx(feed: FeedSelector, view: ViewType) -> ListContext {
        ListContext::new(feed, view, false)
    }

    fn entry(id: &str, published: &str) -> Entry {
        let mut entry = Entry::new(1, "https://example.com/feed.xml", id);
        entry.id = id.to_string();
        entry.title = Some(format!("Title {}", id));
        entry.published_at = Some(published.parse().unwrap());
        entry
    }

    /// a, b on Jan 2; c, d on Jan 1.
    fn two_days() -> Vec<Entry> {
        vec![
            entry("a", "2024-01-02T10:00:00Z"),
            entry("b", "2024-01-02T09:00:00Z"),
            entry("c", "2024-01-01T10:00:00Z"),
            entry("d", "2024-01-01T09:00:00Z"),
        ]
    }

    fn load_request(column: &mut EntryColumn) -> PageRequest {
        column
            .take_commands()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                ColumnCommand::LoadPage(request) => Some(request),
                _ => None,
            })
            .expect("a page request")
    }

    fn loaded(request: PageRequest, entries: Vec<Entry>, total: usize, has_next: bool) -> QueryEvent {
        QueryEvent::PageLoaded {
            request,
            result: Ok(Page {
                entries,
                total_count: total,
                has_next,
            }),
        }
    }

    /// Column over `two_days()` in a viewport showing three article rows.
    fn loaded_column(context: ListContext, dwell_ms: u64) -> (EntryColumn, EntryStore, Instant) {
        let mut store = EntryStore::new();
        let now = Instant::now();
        let mut column = EntryColumn::new(context, options(dwell_ms));
        column.set_viewport(80, 9, &mut store, now).unwrap();
        let request = load_request(&mut column);
        column
            .apply(loaded(request, two_days(), 4, false), &mut store, now)
            .unwrap();
        (column, store, now)
    }

    fn read_ids(store: &EntryStore) -> Vec<&str> {
        let mut ids: Vec<&str> = ["a", "b", "c", "d"]
            .into_iter()
            .filter(|id| store.get(id).is_some_and(|e| e.is_read))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_rows_include_day_separators() {
        let (column, _, _) = loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        let separator = |date: &str| ListRow::Separator { date: date.into() };
        assert_eq!(
            column.rows(),
            &[
                separator("2024-01-02"),
                ListRow::entry("a"),
                ListRow::entry("b"),
                separator("2024-01-01"),
                ListRow::entry("c"),
                ListRow::entry("d"),
            ]
        );
        assert_eq!(column.visible_range(), VisibleRange::new(0, 3));
    }

    #[test]
    fn test_nothing_marked_before_interaction() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        let later = now + Duration::from_secs(5);
        column.tick(&mut store, later).unwrap();
        assert!(read_ids(&store).is_empty());

        column.on_scroll(1, &mut store, later).unwrap();
        // Rows 1..4: a, b and a separator.
        assert_eq!(read_ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_dwell_delays_marking() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Articles), 500);
        column.on_scroll(1, &mut store, now).unwrap();
        assert!(read_ids(&store).is_empty());

        column
            .tick(&mut store, now + Duration::from_millis(499))
            .unwrap();
        assert!(read_ids(&store).is_empty());
        column
            .tick(&mut store, now + Duration::from_millis(500))
            .unwrap();
        assert_eq!(read_ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_wide_views_do_not_range_mark() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Pictures), 0);
        assert!(column.rows().iter().all(|r| !r.is_separator()));

        column.on_scroll(1, &mut store, now).unwrap();
        column
            .tick(&mut store, now + Duration::from_secs(5))
            .unwrap();
        assert!(read_ids(&store).is_empty());

        // One line of three cards fits; after scrolling only d is visible.
        column.select_next(&mut store, now).unwrap();
        assert_eq!(column.active_entry(), Some("d"));
        assert_eq!(read_ids(&store), vec!["d"]);
    }

    #[test]
    fn test_arrow_keys_are_left_to_shortcuts() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        let disposition = column.on_key(KeyCode::Down, &mut store, now).unwrap();
        assert_eq!(disposition, KeyDisposition::Suppressed);
        assert_eq!(column.visible_range(), VisibleRange::new(0, 3));
        assert!(read_ids(&store).is_empty());

        let disposition = column.on_key(KeyCode::End, &mut store, now).unwrap();
        assert_eq!(disposition, KeyDisposition::ScrollToBottom);
        assert_eq!(column.visible_range(), VisibleRange::new(3, 6));
    }

    #[test]
    fn test_selection_skips_separators_and_marks_read() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::Feed(1), ViewType::Articles), 10_000);

        column.select_next(&mut store, now).unwrap();
        assert_eq!(column.active_entry(), Some("a"));
        column.select_next(&mut store, now).unwrap();
        column.select_next(&mut store, now).unwrap();
        assert_eq!(column.active_entry(), Some("c"));
        assert_eq!(read_ids(&store), vec!["a", "b", "c"]);

        column.select_prev(&mut store, now).unwrap();
        assert_eq!(column.active_entry(), Some("b"));

        column.clear_selection();
        assert_eq!(column.active_entry(), None);
    }

    #[test]
    fn test_opening_in_collections_does_not_mark() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::Collections, ViewType::Articles), 10_000);
        column.select_next(&mut store, now).unwrap();
        assert_eq!(column.active_entry(), Some("a"));
        assert!(read_ids(&store).is_empty());
    }

    #[test]
    fn test_context_switch_resets_and_drops_stale_pages() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        column.on_scroll(2, &mut store, now).unwrap();
        column.select_next(&mut store, now).unwrap();
        column.refresh(&[]);
        let stale = load_request(&mut column);

        column.switch_context(ctx(FeedSelector::Collections, ViewType::Articles));
        assert_eq!(column.virtualizer().scroll_line(), 0);
        assert!(column.rows().is_empty());
        assert!(column.is_loading());
        assert_eq!(column.active_entry(), None);

        column
            .apply(loaded(stale, two_days(), 4, false), &mut store, now)
            .unwrap();
        assert!(column.rows().is_empty());

        let fresh = load_request(&mut column);
        assert_eq!(fresh.context.feed, FeedSelector::Collections);
        column
            .apply(loaded(fresh, vec![entry("c", "2024-01-01T10:00:00Z")], 1, false), &mut store, now)
            .unwrap();
        assert_eq!(column.rows().len(), 2);
        assert_eq!(column.visible_range().start, 0);
    }

    #[test]
    fn test_end_reached_loads_next_page_once() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        let mut column = EntryColumn::new(ctx(FeedSelector::All, ViewType::Notifications), options(0));
        // Notification rows are one line tall: three visible rows.
        column.set_viewport(80, 3, &mut store, now).unwrap();
        let request = load_request(&mut column);

        let first: Vec<Entry> = two_days().into_iter().collect();
        column
            .apply(loaded(request, first, 8, true), &mut store, now)
            .unwrap();
        assert!(column.take_commands().iter().all(|c| !matches!(c, ColumnCommand::LoadPage(_))));

        // Six rows; the window 3..6 ends at the last row.
        column.on_scroll(3, &mut store, now).unwrap();
        let next = load_request(&mut column);
        assert_eq!(next.kind, FetchKind::NextPage);
        assert_eq!(next.after.as_ref().map(|c| c.id.as_str()), Some("d"));

        column.on_scroll(-1, &mut store, now).unwrap();
        column.on_scroll(1, &mut store, now).unwrap();
        assert!(column.take_commands().iter().all(|c| !matches!(c, ColumnCommand::LoadPage(_))));

        // A failed page is not retried on its own.
        let err = column.apply(
            QueryEvent::PageLoaded {
                request: next,
                result: Err(RillError::Other("boom".into())),
            },
            &mut store,
            now,
        );
        assert!(err.is_err());
        assert!(column.query().has_next_page());
        column.tick(&mut store, now).unwrap();
        assert!(column.take_commands().is_empty());
    }

    #[test]
    fn test_refetch_at_end_of_list_resumes_paging() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        let mut column = EntryColumn::new(ctx(FeedSelector::All, ViewType::Notifications), options(0));
        column.set_viewport(80, 3, &mut store, now).unwrap();
        let request = load_request(&mut column);
        column
            .apply(loaded(request, two_days(), 8, true), &mut store, now)
            .unwrap();
        column.on_scroll(3, &mut store, now).unwrap();
        let next = load_request(&mut column);
        assert_eq!(next.kind, FetchKind::NextPage);

        // A refetch supersedes the next page and comes back the same size.
        column.refresh(&[]);
        let refetch = load_request(&mut column);
        assert_eq!(refetch.kind, FetchKind::Refetch);
        column
            .apply(loaded(next, Vec::new(), 8, false), &mut store, now)
            .unwrap();
        column
            .apply(loaded(refetch, two_days(), 8, true), &mut store, now)
            .unwrap();

        let resumed = load_request(&mut column);
        assert_eq!(resumed.kind, FetchKind::NextPage);
        assert_eq!(resumed.after.map(|c| c.id), Some("d".to_string()));
    }

    #[test]
    fn test_new_list_evicts_entries_of_the_old_one() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        assert_eq!(store.len(), 4);

        column.switch_context(ctx(FeedSelector::Collections, ViewType::Articles));
        let fresh = load_request(&mut column);
        column
            .apply(loaded(fresh, vec![entry("c", "2024-01-01T10:00:00Z")], 1, false), &mut store, now)
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_none());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_refetch_keeps_active_entry() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::Feed(1), ViewType::Articles), 10_000);
        column.select_next(&mut store, now).unwrap();
        assert_eq!(column.active_entry(), Some("a"));

        column.refresh(&[]);
        let refetch = load_request(&mut column);
        let rest = two_days().into_iter().skip(1).collect();
        column
            .apply(loaded(refetch, rest, 3, false), &mut store, now)
            .unwrap();
        assert!(store.get("a").is_some());
        assert_eq!(column.rows().len(), 5);
    }

    #[test]
    fn test_fallback_renderer_for_unknown_view() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        let mut column = EntryColumn::new(ctx(FeedSelector::All, ViewType::Pictures), options(0));
        column.set_viewport(80, 9, &mut store, now).unwrap();
        let generation = column.generation();

        column.switch_context_with_renderer(
            ctx(FeedSelector::Feed(7), ViewType::Pictures),
            Renderer::Fallback,
        );
        assert_eq!(column.renderer(), Renderer::Fallback);
        assert_eq!(column.generation(), generation + 1);
        assert_eq!(column.virtualizer().layout(), Renderer::Fallback.layout(80));

        let request = load_request(&mut column);
        column
            .apply(loaded(request, two_days(), 4, false), &mut store, now)
            .unwrap();
        // A plain list with day separators, one line per row.
        assert_eq!(column.rows().len(), 6);
        assert_eq!(column.visible_range(), VisibleRange::new(0, 6));

        // Same context with the registered renderer starts a new session.
        column.switch_context(ctx(FeedSelector::Feed(7), ViewType::Pictures));
        assert_eq!(column.generation(), generation + 2);
        assert!(column.renderer().is_grid());
    }

    #[test]
    fn test_footer_skeleton_waits_for_delay() {
        let mut store = EntryStore::new();
        let t0 = Instant::now();
        let mut column = EntryColumn::new(ctx(FeedSelector::All, ViewType::Notifications), options(0));
        column.set_viewport(80, 3, &mut store, t0).unwrap();
        let request = load_request(&mut column);
        column
            .apply(loaded(request, two_days(), 8, true), &mut store, t0)
            .unwrap();
        column.on_scroll(3, &mut store, t0).unwrap();
        assert!(column.query().is_fetching_next_page());

        column.tick(&mut store, t0).unwrap();
        assert!(!column.footer_skeleton_visible(t0 + Duration::from_millis(50)));
        assert!(column.footer_skeleton_visible(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_translations_requested_and_stale_results_dropped() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        let mut column = EntryColumn::new(ctx(FeedSelector::All, ViewType::Articles), options(0));
        column.set_viewport(80, 9, &mut store, now).unwrap();
        let request = load_request(&mut column);

        let mut entries = two_days();
        entries[0].settings.translation = Some("de".into());
        entries[1].settings.translation = Some("de".into());
        column
            .apply(loaded(request, entries, 4, false), &mut store, now)
            .unwrap();

        let translations: Vec<TranslateRequest> = column
            .take_commands()
            .into_iter()
            .filter_map(|c| match c {
                ColumnCommand::Translate(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(translations.len(), 2);
        assert_eq!(translations[0].entry_id, "a");
        assert_eq!(translations[0].text, "Title a");

        let generation = column.generation();
        column
            .apply(
                QueryEvent::Translated {
                    generation,
                    entry_id: "a".into(),
                    language: "de".into(),
                    result: Ok("Titel a".into()),
                },
                &mut store,
                now,
            )
            .unwrap();
        assert_eq!(store.get("a").unwrap().display_title(), "Titel a");

        column.switch_context(ctx(FeedSelector::Collections, ViewType::Articles));
        column
            .apply(
                QueryEvent::Translated {
                    generation,
                    entry_id: "b".into(),
                    language: "de".into(),
                    result: Ok("Titel b".into()),
                },
                &mut store,
                now,
            )
            .unwrap();
        assert_eq!(store.get("b").unwrap().translated_title, None);
    }

    #[test]
    fn test_refresh_owned_feed_resyncs() {
        let (mut column, _store, _) =
            loaded_column(ctx(FeedSelector::Feed(1), ViewType::Articles), 0);
        let mut feed = Feed::new("https://example.com/feed.xml".into());
        feed.id = 1;
        feed.owner_user_id = Some("me".into());
        let feeds = vec![feed];

        column.refresh(&feeds);
        column.refresh(&feeds);
        let commands = column.take_commands();
        assert_eq!(
            commands,
            vec![ColumnCommand::RefreshFeed {
                generation: column.generation(),
                feed_id: 1
            }]
        );
        assert_eq!(
            column.header(&feeds).refresh,
            RefreshAffordance::OwnerRefresh { spinning: true }
        );
    }

    #[test]
    fn test_refresh_after_resync_refetches() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::Feed(1), ViewType::Articles), 0);
        let generation = column.generation();
        column
            .apply(
                QueryEvent::FeedRefreshed {
                    generation,
                    feed_id: 1,
                    result: Ok(2),
                },
                &mut store,
                now,
            )
            .unwrap();
        assert_eq!(load_request(&mut column).kind, FetchKind::Refetch);
    }

    #[test]
    fn test_refresh_unowned_refetches() {
        let (mut column, _store, _) = loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        column.refresh(&[]);
        let request = load_request(&mut column);
        assert_eq!(request.kind, FetchKind::Refetch);
        assert_eq!(request.limit, 4);
    }

    #[test]
    fn test_update_hint_in_header() {
        let (mut column, mut store, now) =
            loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        column
            .apply(
                QueryEvent::FeedsUpdated {
                    new_entries: 3,
                    failed: 0,
                    offline: false,
                },
                &mut store,
                now,
            )
            .unwrap();
        let header = column.header(&[]);
        assert_eq!(header.refresh.tooltip(), Some("New entries available"));
        assert_eq!(header.count_label, "4 Items");
    }

    #[test]
    fn test_empty_state_after_load() {
        let mut store = EntryStore::new();
        let now = Instant::now();
        let context = ListContext::new(FeedSelector::All, ViewType::Articles, true);
        let mut column = EntryColumn::new(context, options(0));
        assert_eq!(column.empty_state(), None);

        let request = load_request(&mut column);
        column
            .apply(loaded(request, Vec::new(), 0, false), &mut store, now)
            .unwrap();
        assert_eq!(column.empty_state(), Some(EmptyState::ZeroUnread));
    }

    #[test]
    fn test_mark_all_read() {
        let (column, mut store, _) = loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        assert_eq!(column.mark_all_read(&mut store).unwrap(), 4);
        assert_eq!(read_ids(&store), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_index_at() {
        let (column, _, _) = loaded_column(ctx(FeedSelector::All, ViewType::Articles), 0);
        assert_eq!(column.index_at(5, 0), Some(0));
        assert_eq!(column.index_at(5, 4), Some(1));
        assert_eq!(column.index_at(5, 8), Some(2));
    }
}
