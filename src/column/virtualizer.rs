//! Windowing for the entry column.
//!
//! The virtualizer knows the number of items, the height of one line and the
//! viewport height. From that it derives which items are visible, which are
//! rendered (visible plus overscan), when the rendered window has reached the
//! end of the loaded data, and when the visible range changed.
//!
//! A list has one item per line. A grid packs `columns` items into a line and
//! windows whole lines, so both layouts share the same arithmetic.

use std::ops::Range;

use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    List { row_height: u16 },
    Grid { columns: u16, cell_height: u16 },
}

impl Layout {
    pub fn items_per_line(&self) -> usize {
        match self {
            Layout::List { .. } => 1,
            Layout::Grid { columns, .. } => (*columns).max(1) as usize,
        }
    }

    pub fn line_height(&self) -> u16 {
        match self {
            Layout::List { row_height } => (*row_height).max(1),
            Layout::Grid { cell_height, .. } => (*cell_height).max(1),
        }
    }

    pub fn is_grid(&self) -> bool {
        matches!(self, Layout::Grid { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualizerOptions {
    /// Extra lines rendered above and below the viewport.
    pub overscan: usize,
    /// End-reached fires when the rendered window ends within this many
    /// items of the last loaded item.
    pub end_reached_threshold: usize,
}

impl Default for VirtualizerOptions {
    fn default() -> Self {
        Self {
            overscan: 2,
            end_reached_threshold: 5,
        }
    }
}

/// Visible item indices, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// What the list does with a key press before application shortcuts see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Plain vertical arrows: the list must not scroll on its own; the
    /// shortcut layer moves the selection instead.
    Suppressed,
    ScrollBy(isize),
    ScrollToTop,
    ScrollToBottom,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct EntryVirtualizer {
    layout: Layout,
    options: VirtualizerOptions,
    total_count: usize,
    viewport_height: u16,
    scroll_line: usize,
    last_range: Option<VisibleRange>,
    end_reached_at: Option<usize>,
}

impl EntryVirtualizer {
    pub fn new(layout: Layout, options: VirtualizerOptions) -> Self {
        Self {
            layout,
            options,
            total_count: 0,
            viewport_height: 0,
            scroll_line: 0,
            last_range: None,
            end_reached_at: None,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Switch layout, keeping the first visible item in view.
    pub fn set_layout(&mut self, layout: Layout) {
        if layout == self.layout {
            return;
        }
        let first_item = self.scroll_line * self.layout.items_per_line();
        self.layout = layout;
        self.scroll_line = first_item / layout.items_per_line();
        self.clamp();
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
        self.clamp();
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    pub fn set_total_count(&mut self, total: usize) {
        self.total_count = total;
        self.clamp();
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn scroll_line(&self) -> usize {
        self.scroll_line
    }

    pub fn total_lines(&self) -> usize {
        self.total_count.div_ceil(self.layout.items_per_line())
    }

    /// Lines that fit in the viewport, at least one.
    pub fn visible_lines(&self) -> usize {
        ((self.viewport_height / self.layout.line_height()) as usize).max(1)
    }

    pub fn max_scroll_line(&self) -> usize {
        self.total_lines().saturating_sub(self.visible_lines())
    }

    /// Returns true if the offset changed.
    pub fn scroll_by(&mut self, delta_lines: isize) -> bool {
        let before = self.scroll_line;
        let target = if delta_lines < 0 {
            self.scroll_line.saturating_sub(delta_lines.unsigned_abs())
        } else {
            self.scroll_line.saturating_add(delta_lines as usize)
        };
        self.scroll_line = target.min(self.max_scroll_line());
        self.scroll_line != before
    }

    pub fn scroll_to_top(&mut self) -> bool {
        let changed = self.scroll_line != 0;
        self.scroll_line = 0;
        changed
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        let before = self.scroll_line;
        self.scroll_line = self.max_scroll_line();
        self.scroll_line != before
    }

    /// Scroll the least amount needed to bring `index` into view.
    pub fn scroll_into_view(&mut self, index: usize) -> bool {
        if index >= self.total_count {
            return false;
        }
        let line = index / self.layout.items_per_line();
        let before = self.scroll_line;
        if line < self.scroll_line {
            self.scroll_line = line;
        } else if line >= self.scroll_line + self.visible_lines() {
            self.scroll_line = line + 1 - self.visible_lines();
        }
        self.clamp();
        self.scroll_line != before
    }

    pub fn visible_range(&self) -> VisibleRange {
        let per_line = self.layout.items_per_line();
        let start = (self.scroll_line * per_line).min(self.total_count);
        let end = ((self.scroll_line + self.visible_lines()) * per_line).min(self.total_count);
        VisibleRange::new(start, end)
    }

    /// Visible items plus overscan lines on both sides.
    pub fn rendered_range(&self) -> VisibleRange {
        let per_line = self.layout.items_per_line();
        let first_line = self.scroll_line.saturating_sub(self.options.overscan);
        let last_line = self.scroll_line + self.visible_lines() + self.options.overscan;
        VisibleRange::new(
            (first_line * per_line).min(self.total_count),
            (last_line * per_line).min(self.total_count),
        )
    }

    /// The visible range, if it differs from the one last reported.
    pub fn take_range_change(&mut self) -> Option<VisibleRange> {
        let range = self.visible_range();
        if self.last_range == Some(range) {
            return None;
        }
        self.last_range = Some(range);
        Some(range)
    }

    /// True once each time the rendered window enters the end zone for a
    /// given item count. Leaving the zone re-arms it.
    pub fn check_end_reached(&mut self) -> bool {
        if self.total_count == 0 {
            return false;
        }
        let rendered = self.rendered_range();
        let near_end = rendered.end + self.options.end_reached_threshold >= self.total_count;
        if !near_end {
            self.end_reached_at = None;
            return false;
        }
        if self.end_reached_at == Some(self.total_count) {
            return false;
        }
        self.end_reached_at = Some(self.total_count);
        true
    }

    /// Let the next [`check_end_reached`](Self::check_end_reached) fire even
    /// if the item count has not changed.
    pub fn rearm_end_reached(&mut self) {
        self.end_reached_at = None;
    }

    pub fn key_disposition(&self, code: KeyCode) -> KeyDisposition {
        let page = self.visible_lines() as isize;
        match code {
            KeyCode::Up | KeyCode::Down => KeyDisposition::Suppressed,
            KeyCode::PageUp => KeyDisposition::ScrollBy(-page),
            KeyCode::PageDown => KeyDisposition::ScrollBy(page),
            KeyCode::Home => KeyDisposition::ScrollToTop,
            KeyCode::End => KeyDisposition::ScrollToBottom,
            _ => KeyDisposition::Ignored,
        }
    }

    /// Start over for a new list: top of the list, nothing reported yet.
    pub fn reset(&mut self) {
        self.scroll_line = 0;
        self.total_count = 0;
        self.last_range = None;
        self.end_reached_at = None;
    }

    fn clamp(&mut self) {
        self.scroll_line = self.scroll_line.min(self.max_scroll_line());
    }
}
