//! Row renderers for each view type.
//!
//! Every [`ViewType`] maps to exactly one [`RowRenderer`]. Raw view values
//! that do not name a view resolve to [`Renderer::Fallback`], which draws a
//! generic loading indicator instead of failing.

mod rows;
mod skeleton;

use ratatui::text::Line;

use crate::column::virtualizer::Layout;
use crate::config::ColorConfig;
use crate::domain::{Entry, ViewType};

pub use rows::{separator_lines, strip_html};
pub use skeleton::{Skeleton, DEFAULT_SKELETON_COUNT};

/// Width of one grid card, including its gap.
const CARD_WIDTH: u16 = 26;
const CARD_HEIGHT: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRenderer {
    Article,
    Social,
    Picture,
    Video,
    Audio,
    Notification,
}

pub fn renderer_for(view: ViewType) -> RowRenderer {
    match view {
        ViewType::Articles => RowRenderer::Article,
        ViewType::SocialMedia => RowRenderer::Social,
        ViewType::Pictures => RowRenderer::Picture,
        ViewType::Videos => RowRenderer::Video,
        ViewType::Audios => RowRenderer::Audio,
        ViewType::Notifications => RowRenderer::Notification,
    }
}

/// Renderer resolved from a possibly unknown view value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Registered(RowRenderer),
    Fallback,
}

impl Renderer {
    pub fn lookup(raw_view: i64) -> Self {
        match ViewType::from_raw(raw_view) {
            Some(view) => Renderer::Registered(renderer_for(view)),
            None => Renderer::Fallback,
        }
    }

    pub fn for_view(view: ViewType) -> Self {
        Renderer::Registered(renderer_for(view))
    }

    pub fn is_grid(&self) -> bool {
        matches!(self, Renderer::Registered(renderer) if renderer.is_grid())
    }

    /// The fallback draws one line per row.
    pub fn row_height(&self) -> u16 {
        match self {
            Renderer::Registered(renderer) => renderer.row_height(),
            Renderer::Fallback => 1,
        }
    }

    pub fn layout(&self, width: u16) -> Layout {
        match self {
            Renderer::Registered(renderer) => renderer.layout(width),
            Renderer::Fallback => Layout::List { row_height: 1 },
        }
    }

    /// Lines for one entry row, or the loading indicator for the fallback.
    pub fn entry_lines(
        &self,
        entry: &Entry,
        feed_title: Option<&str>,
        width: u16,
        colors: &ColorConfig,
    ) -> Vec<Line<'static>> {
        match self {
            Renderer::Registered(renderer) => renderer.entry_lines(entry, feed_title, width, colors),
            Renderer::Fallback => rows::loading_lines(colors),
        }
    }

    pub fn skeleton_lines(&self, width: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
        match self {
            Renderer::Registered(renderer) => renderer.skeleton_lines(width, colors),
            Renderer::Fallback => rows::loading_lines(colors),
        }
    }

    pub fn placeholder_lines(&self, colors: &ColorConfig) -> Vec<Line<'static>> {
        match self {
            Renderer::Registered(renderer) => renderer.placeholder_lines(colors),
            Renderer::Fallback => rows::loading_lines(colors),
        }
    }
}

impl RowRenderer {
    pub fn is_grid(self) -> bool {
        matches!(self, RowRenderer::Picture | RowRenderer::Video)
    }

    pub fn row_height(self) -> u16 {
        match self {
            RowRenderer::Article | RowRenderer::Social => 3,
            RowRenderer::Audio => 2,
            RowRenderer::Notification => 1,
            RowRenderer::Picture | RowRenderer::Video => CARD_HEIGHT,
        }
    }

    /// Window layout for a column `width` cells wide.
    pub fn layout(self, width: u16) -> Layout {
        if self.is_grid() {
            Layout::Grid {
                columns: (width / CARD_WIDTH).max(1),
                cell_height: CARD_HEIGHT,
            }
        } else {
            Layout::List {
                row_height: self.row_height(),
            }
        }
    }

    pub fn entry_lines(
        self,
        entry: &Entry,
        feed_title: Option<&str>,
        width: u16,
        colors: &ColorConfig,
    ) -> Vec<Line<'static>> {
        let mut lines = match self {
            RowRenderer::Article => rows::article(entry, feed_title, width, colors),
            RowRenderer::Social => rows::social(entry, feed_title, width, colors),
            RowRenderer::Picture => rows::card(entry, feed_title, "▣", width, colors),
            RowRenderer::Video => rows::card(entry, feed_title, "▶", width, colors),
            RowRenderer::Audio => rows::audio(entry, feed_title, width, colors),
            RowRenderer::Notification => rows::notification(entry, width, colors),
        };
        lines.resize(self.row_height() as usize, Line::default());
        lines
    }

    pub fn skeleton_lines(self, width: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
        rows::skeleton(self.row_height(), width, colors)
    }

    /// Row for an id whose entry is not loaded.
    pub fn placeholder_lines(self, colors: &ColorConfig) -> Vec<Line<'static>> {
        let mut lines = rows::placeholder(colors);
        lines.resize(self.row_height() as usize, Line::default());
        lines
    }
}
