use ratatui::text::{Line, Span};

use crate::config::ColorConfig;
use crate::render::{rows, Renderer, RowRenderer, CARD_HEIGHT, CARD_WIDTH};

pub const DEFAULT_SKELETON_COUNT: usize = 10;

/// Loading placeholders shown before the first page arrives, below the
/// list while the next page loads, and in place of rows during a fast scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skeleton {
    /// One bare placeholder row, no wrapper.
    Single(RowRenderer),
    Column { renderer: RowRenderer, count: usize },
    Grid { renderer: RowRenderer, count: usize },
    /// Generic indicator for views without a renderer.
    Loading,
}

impl Skeleton {
    pub fn new(renderer: Renderer, count: Option<usize>) -> Self {
        let Renderer::Registered(renderer) = renderer else {
            return Skeleton::Loading;
        };
        let count = count.unwrap_or(DEFAULT_SKELETON_COUNT);
        if count == 1 {
            Skeleton::Single(renderer)
        } else if renderer.is_grid() {
            Skeleton::Grid { renderer, count }
        } else {
            Skeleton::Column { renderer, count }
        }
    }

    pub fn lines(&self, width: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
        match *self {
            Skeleton::Single(renderer) => renderer.skeleton_lines(width, colors),
            Skeleton::Column { renderer, count } => (0..count)
                .flat_map(|_| renderer.skeleton_lines(width, colors))
                .collect(),
            Skeleton::Grid { count, .. } => grid_lines(count, width, colors),
            Skeleton::Loading => rows::loading_lines(colors),
        }
    }
}

fn grid_lines(count: usize, width: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
    let columns = ((width / CARD_WIDTH).max(1) as usize).min(count.max(1));
    let card = format!("{} ", "░".repeat(CARD_WIDTH as usize - 2));
    let style = ratatui::style::Style::default().fg(colors.placeholder);

    let mut lines = Vec::new();
    let mut remaining = count;
    while remaining > 0 {
        let in_line = remaining.min(columns);
        for _ in 0..CARD_HEIGHT - 1 {
            lines.push(Line::from(Span::styled(format!(" {}", card.repeat(in_line)), style)));
        }
        lines.push(Line::default());
        remaining -= in_line;
    }
    lines
}
