use chrono::{Local, NaiveDate};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::config::ColorConfig;
use crate::domain::Entry;

pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    let mut last_was_space = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => {
                if c.is_whitespace() {
                    if !last_was_space {
                        result.push(' ');
                        last_was_space = true;
                    }
                } else {
                    result.push(c);
                    last_was_space = false;
                }
            }
            _ => {}
        }
    }

    result.trim().to_string()
}

/// Cut `text` to `max` characters, ending in an ellipsis when shortened.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

fn marker(entry: &Entry, colors: &ColorConfig) -> Span<'static> {
    if entry.is_starred {
        Span::styled("★ ", Style::default().fg(colors.starred))
    } else if !entry.is_read {
        Span::styled("● ", Style::default().fg(colors.accent))
    } else {
        Span::raw("  ")
    }
}

fn title_style(entry: &Entry, colors: &ColorConfig) -> Style {
    if entry.is_read {
        Style::default().fg(colors.read_item)
    } else {
        Style::default()
            .fg(colors.unread_item)
            .add_modifier(Modifier::BOLD)
    }
}

fn short_date(entry: &Entry) -> String {
    entry
        .published_at
        .unwrap_or(entry.fetched_at)
        .with_timezone(&Local)
        .format("%m/%d %H:%M")
        .to_string()
}

fn meta_line(entry: &Entry, feed_title: Option<&str>, width: u16, colors: &ColorConfig) -> Line<'static> {
    let mut meta = feed_title.unwrap_or_default().to_string();
    if let Some(author) = &entry.author {
        if !meta.is_empty() {
            meta.push_str(" · ");
        }
        meta.push_str(author);
    }
    let date = short_date(entry);
    let room = (width as usize).saturating_sub(date.chars().count() + 4);
    Line::from(vec![
        Span::raw("  "),
        Span::styled(date, Style::default().fg(colors.metadata_date)),
        Span::raw("  "),
        Span::styled(truncate(&meta, room), Style::default().fg(colors.metadata_author)),
    ])
}

fn snippet(entry: &Entry) -> String {
    strip_html(entry.summary.as_deref().unwrap_or_else(|| entry.display_content()))
}

fn title_line(entry: &Entry, width: u16, colors: &ColorConfig) -> Line<'static> {
    let room = (width as usize).saturating_sub(2);
    Line::from(vec![
        marker(entry, colors),
        Span::styled(
            truncate(entry.display_title(), room),
            title_style(entry, colors),
        ),
    ])
}

pub(super) fn article(
    entry: &Entry,
    feed_title: Option<&str>,
    width: u16,
    colors: &ColorConfig,
) -> Vec<Line<'static>> {
    let room = (width as usize).saturating_sub(2);
    vec![
        title_line(entry, width, colors),
        meta_line(entry, feed_title, width, colors),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(truncate(&snippet(entry), room), Style::default().fg(colors.read_item)),
        ]),
    ]
}

pub(super) fn social(
    entry: &Entry,
    feed_title: Option<&str>,
    width: u16,
    colors: &ColorConfig,
) -> Vec<Line<'static>> {
    let room = (width as usize).saturating_sub(2);
    let author = entry
        .author
        .as_deref()
        .or(feed_title)
        .unwrap_or("unknown")
        .to_string();
    let text = snippet(entry);
    let text = if text.is_empty() {
        entry.display_title().to_string()
    } else {
        text
    };

    // Posts have no real title; the body flows over two lines.
    let first: String = text.chars().take(room).collect();
    let rest: String = text.chars().skip(room).collect();
    vec![
        Line::from(vec![
            marker(entry, colors),
            Span::styled(truncate(&author, room / 2), title_style(entry, colors)),
            Span::raw("  "),
            Span::styled(short_date(entry), Style::default().fg(colors.metadata_date)),
        ]),
        Line::from(vec![Span::raw("  "), Span::raw(first)]),
        Line::from(vec![Span::raw("  "), Span::raw(truncate(rest.trim_start(), room))]),
    ]
}

pub(super) fn card(
    entry: &Entry,
    feed_title: Option<&str>,
    glyph: &'static str,
    width: u16,
    colors: &ColorConfig,
) -> Vec<Line<'static>> {
    let inner = (width as usize).saturating_sub(4);
    let title = entry.display_title();
    let first: String = title.chars().take(inner).collect();
    let rest: String = title.chars().skip(inner).collect();
    vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(glyph, Style::default().fg(colors.accent)),
            Span::raw(" "),
            marker(entry, colors),
        ]),
        Line::from(Span::styled(format!(" {}", first), title_style(entry, colors))),
        Line::from(Span::styled(
            format!(" {}", truncate(rest.trim_start(), inner)),
            title_style(entry, colors),
        )),
        Line::from(Span::styled(
            format!(" {}", truncate(feed_title.unwrap_or_default(), inner)),
            Style::default().fg(colors.metadata_author),
        )),
        Line::from(Span::styled(
            format!(" {}", short_date(entry)),
            Style::default().fg(colors.metadata_date),
        )),
    ]
}

pub(super) fn audio(
    entry: &Entry,
    feed_title: Option<&str>,
    width: u16,
    colors: &ColorConfig,
) -> Vec<Line<'static>> {
    let room = (width as usize).saturating_sub(4);
    vec![
        Line::from(vec![
            marker(entry, colors),
            Span::styled("♪ ", Style::default().fg(colors.accent)),
            Span::styled(truncate(entry.display_title(), room), title_style(entry, colors)),
        ]),
        meta_line(entry, feed_title, width, colors),
    ]
}

pub(super) fn notification(entry: &Entry, width: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
    let date = short_date(entry);
    let room = (width as usize).saturating_sub(date.chars().count() + 4);
    vec![Line::from(vec![
        marker(entry, colors),
        Span::styled(date, Style::default().fg(colors.metadata_date)),
        Span::raw("  "),
        Span::styled(truncate(entry.display_title(), room), title_style(entry, colors)),
    ])]
}

pub(super) fn skeleton(height: u16, width: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
    let style = Style::default().fg(colors.placeholder);
    let full = (width as usize).saturating_sub(4);
    (0..height as usize)
        .map(|i| {
            // Alternate bar lengths so stacked skeletons read as rows.
            let len = if i % 2 == 0 { full * 3 / 4 } else { full / 2 };
            Line::from(Span::styled(format!("  {}", "░".repeat(len)), style))
        })
        .collect()
}

pub(super) fn placeholder(colors: &ColorConfig) -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(
        "  …",
        Style::default().fg(colors.placeholder),
    ))]
}

pub(super) fn loading_lines(colors: &ColorConfig) -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(
        "  ◌ Loading...",
        Style::default().fg(colors.placeholder),
    ))]
}

/// Day heading, padded to `height` lines with the label on the last one.
pub fn separator_lines(date: &str, height: u16, colors: &ColorConfig) -> Vec<Line<'static>> {
    let label = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(day) if day == Local::now().date_naive() => "Today".to_string(),
        Ok(day) => day.format("%A, %b %-d %Y").to_string(),
        Err(_) => date.to_string(),
    };
    let mut lines = vec![Line::default(); (height as usize).saturating_sub(1)];
    lines.push(Line::from(Span::styled(
        label,
        Style::default()
            .fg(colors.separator)
            .add_modifier(Modifier::BOLD),
    )));
    lines
}
