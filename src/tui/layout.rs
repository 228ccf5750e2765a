use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::column::virtualizer::Layout as RowLayout;
use crate::config::ColorConfig;
use crate::domain::ListRow;
use crate::render::{separator_lines, strip_html, Skeleton};
use crate::tui::app::{ActivePane, SidebarItem, TuiApp};

/// Header lines drawn above the entry rows.
const HEADER_LINES: u16 = 2;
/// Line kept below the rows for the next-page skeleton.
const FOOTER_LINES: u16 = 1;

const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];

struct Panes {
    feeds: Option<Rect>,
    entries: Option<Rect>,
    preview: Rect,
    status: Rect,
}

fn panes(area: Rect, maximized: bool) -> Panes {
    if maximized {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1)])
            .split(area);
        Panes {
            feeds: None,
            entries: None,
            preview: chunks[0],
            status: chunks[1],
        }
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8),      // Feeds pane
                Constraint::Percentage(45), // Entries pane
                Constraint::Min(6),         // Preview pane
                Constraint::Length(1),      // Status bar
            ])
            .split(area);
        Panes {
            feeds: Some(chunks[0]),
            entries: Some(chunks[1]),
            preview: chunks[2],
            status: chunks[3],
        }
    }
}

/// Area the entry rows are drawn in, if the entry pane is shown.
pub fn entry_rows_area(area: Rect, maximized: bool) -> Option<Rect> {
    let entries = panes(area, maximized).entries?;
    let inner = Block::default().borders(Borders::ALL).inner(entries);
    let reserved = HEADER_LINES + FOOTER_LINES;
    Some(Rect {
        y: inner.y + HEADER_LINES.min(inner.height),
        height: inner.height.saturating_sub(reserved),
        ..inner
    })
}

pub fn render(frame: &mut Frame, app: &mut TuiApp, colors: &ColorConfig, now: Instant) {
    let panes = panes(frame.area(), app.maximized);

    if let Some(area) = panes.feeds {
        render_feeds_pane(frame, app, area, colors);
    }
    if let Some(area) = panes.entries {
        render_entries_pane(frame, app, area, colors, now);
    }
    render_preview_pane(frame, app, panes.preview, colors);
    render_status_bar(frame, app, panes.status, colors);
}

fn border_style(active: bool, colors: &ColorConfig) -> Style {
    if active {
        Style::default().fg(colors.active_border)
    } else {
        Style::default().fg(colors.inactive_border)
    }
}

fn selection_style(active: bool, colors: &ColorConfig) -> Style {
    if active {
        Style::default()
            .bg(colors.selection_bg_active)
            .fg(colors.selection_fg_active)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(colors.selection_bg_inactive)
            .fg(colors.selection_fg_inactive)
    }
}

fn render_feeds_pane(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let is_active = app.active_pane == ActivePane::Feeds;

    let items: Vec<ListItem> = app
        .sidebar
        .iter()
        .map(|item| {
            let label = match item {
                SidebarItem::All => "All".to_string(),
                SidebarItem::Collections => "★ Collections".to_string(),
                SidebarItem::Folder(name) => format!("▸ {}", name),
                SidebarItem::Feed { title, .. } => format!("  {}", title),
            };
            let unread = app.unread_count(item);
            if unread > 0 {
                ListItem::new(format!("{} ({})", label, unread))
            } else {
                ListItem::new(label)
            }
        })
        .collect();

    let title = format!(" Feeds ({}) ", app.feeds.len());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let list = List::new(items)
        .block(block)
        .highlight_style(selection_style(is_active, colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

fn render_entries_pane(
    frame: &mut Frame,
    app: &mut TuiApp,
    area: Rect,
    colors: &ColorConfig,
    now: Instant,
) {
    let is_active = app.active_pane == ActivePane::Entries;
    let block = Block::default()
        .title(format!(" {} ", app.column.context().view.descriptor().name))
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    render_entries_header(frame, app, inner, colors, now);

    let Some(rows_area) = entry_rows_area(frame.area(), app.maximized) else {
        return;
    };
    app.entry_rows_area = rows_area;

    let renderer = app.column.renderer();
    if app.column.is_loading() {
        let lines = Skeleton::new(renderer, None).lines(rows_area.width, colors);
        frame.render_widget(Paragraph::new(lines), rows_area);
        return;
    }

    if let Some(empty) = app.column.empty_state() {
        let text = Paragraph::new(empty.label())
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.placeholder));
        let middle = Rect {
            y: rows_area.y + rows_area.height / 2,
            height: 1.min(rows_area.height),
            ..rows_area
        };
        frame.render_widget(text, middle);
        return;
    }

    render_entry_rows(frame, app, rows_area, colors, is_active);

    if app.column.footer_skeleton_visible(now) {
        let footer = Rect {
            y: rows_area.y + rows_area.height,
            height: FOOTER_LINES,
            ..rows_area
        };
        let lines = Skeleton::new(renderer, Some(1)).lines(footer.width, colors);
        frame.render_widget(Paragraph::new(lines), footer);
    }
}

fn render_entries_header(
    frame: &mut Frame,
    app: &TuiApp,
    inner: Rect,
    colors: &ColorConfig,
    now: Instant,
) {
    let header = app.column.header(&app.feeds);

    let mut spans = Vec::new();
    if let Some(title) = &header.title {
        spans.push(Span::styled(
            title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        header.count_label.clone(),
        Style::default().fg(colors.metadata_date),
    ));
    if header.actions_visible {
        spans.push(Span::raw(format!("  [{}]", header.unread_toggle_label)));
        if let Some(tooltip) = header.refresh.tooltip() {
            let glyph = if header.refresh.is_spinning() {
                spinner_frame(app.started_at, now)
            } else {
                '⟳'
            };
            spans.push(Span::styled(
                format!("  {} {}", glyph, tooltip),
                Style::default().fg(colors.accent),
            ));
        }
    }
    if header.show_entry_actions {
        spans.push(Span::styled(
            "  s:Star o:Open",
            Style::default().fg(colors.placeholder),
        ));
    }

    let status = if header.refreshing {
        Line::from(Span::styled(
            "━".repeat(inner.width as usize),
            Style::default().fg(colors.accent),
        ))
    } else if !app.column.is_online() {
        Line::from(Span::styled(
            "Offline",
            Style::default().fg(colors.placeholder),
        ))
    } else {
        Line::default()
    };

    let area = Rect {
        height: HEADER_LINES.min(inner.height),
        ..inner
    };
    frame.render_widget(Paragraph::new(vec![Line::from(spans), status]), area);
}

fn spinner_frame(started_at: Instant, now: Instant) -> char {
    let ticks = now.saturating_duration_since(started_at).as_millis() as usize;
    SPINNER[(ticks / 120) % SPINNER.len()]
}

fn render_entry_rows(
    frame: &mut Frame,
    app: &TuiApp,
    area: Rect,
    colors: &ColorConfig,
    is_active: bool,
) {
    let column = &app.column;
    let layout = column.virtualizer().layout();
    let visible = column.visible_range();
    let per_line = layout.items_per_line();
    let line_height = layout.line_height();
    let cell_width = match layout {
        RowLayout::List { .. } => area.width,
        RowLayout::Grid { .. } => area.width / per_line as u16,
    };
    let renderer = column.renderer();
    let seeking = column.is_seeking();

    for index in visible.as_range() {
        let offset = index - visible.start;
        let line = (offset / per_line) as u16;
        let cell = (offset % per_line) as u16;
        let rect = Rect {
            x: area.x + cell * cell_width,
            y: area.y + line * line_height,
            width: cell_width,
            height: line_height,
        }
        .intersection(area);
        if rect.is_empty() {
            continue;
        }

        let Some(row) = column.rows().get(index) else {
            continue;
        };
        let (lines, selected) = match row {
            ListRow::Separator { date } => (separator_lines(date, line_height, colors), false),
            ListRow::Entry { id } => {
                let selected = column.active_entry() == Some(id.as_str());
                let lines = match app.store.get(id) {
                    _ if seeking => renderer.skeleton_lines(rect.width, colors),
                    Some(entry) => renderer.entry_lines(
                        entry,
                        app.feed_title(entry.feed_id),
                        rect.width,
                        colors,
                    ),
                    None => renderer.placeholder_lines(colors),
                };
                (lines, selected)
            }
        };

        let mut paragraph = Paragraph::new(lines);
        if selected {
            paragraph = paragraph.style(selection_style(is_active, colors));
        }
        frame.render_widget(paragraph, rect);
    }
}

fn render_preview_pane(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let is_active = app.active_pane == ActivePane::Preview;

    let (title, content) = if let Some(entry) = app.active_entry() {
        let mut lines = Vec::new();

        lines.push(Line::from(Span::styled(
            entry.display_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if let (Some(original), Some(_)) = (&entry.title, &entry.translated_title) {
            lines.push(Line::from(Span::styled(
                original.clone(),
                Style::default().fg(colors.placeholder),
            )));
        }
        lines.push(Line::from(""));

        if let Some(feed) = app.feed_title(entry.feed_id) {
            lines.push(Line::from(Span::styled(
                format!("Feed: {}", feed),
                Style::default().fg(colors.metadata_author),
            )));
        }
        if let Some(author) = &entry.author {
            lines.push(Line::from(Span::styled(
                format!("By: {}", author),
                Style::default().fg(colors.metadata_author),
            )));
        }
        if let Some(date) = entry.published_at {
            lines.push(Line::from(Span::styled(
                format!("Date: {}", date.format("%Y-%m-%d %H:%M")),
                Style::default().fg(colors.metadata_date),
            )));
        }
        if let Some(link) = &entry.link {
            lines.push(Line::from(Span::styled(
                format!("Link: {}", link),
                Style::default().fg(colors.metadata_link),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(
            "─".repeat(area.width.saturating_sub(2) as usize),
        ));
        lines.push(Line::from(""));

        let content_text = strip_html(entry.display_content());
        for line in content_text.lines() {
            lines.push(Line::from(line.to_string()));
        }

        (" Preview ".to_string(), Text::from(lines))
    } else {
        (" Preview ".to_string(), Text::from("No entry selected"))
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let status = if let Some((_, ref title)) = app.pending_delete {
        format!("Delete \"{}\"? (y/n)", title)
    } else if app.is_updating {
        "Updating feeds...".to_string()
    } else if let Some(ref msg) = app.status_message {
        msg.clone()
    } else if app.maximized {
        "j/k:Scroll  m:Exit maximize  q:Quit".to_string()
    } else {
        "j/k:Nav  Tab:Pane  u:Unread  [/]:View  r:Read  s:Star  o:Open  R:Refresh  U:Update  A:All read  t:Translate  q:Quit"
            .to_string()
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));

    frame.render_widget(paragraph, area);
}
