use chrono::Utc;
use feed_rs::model::Entry as SourceEntry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, RillError};
use crate::domain::Entry;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Turns RSS/Atom/JSON Feed documents into [`Entry`] records.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn decoded(text: &str) -> String {
    decode_html_entities(text).trim().to_string()
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        feed_id: i64,
        feed_url: &str,
        body: &[u8],
    ) -> Result<(FeedMeta, Vec<Entry>)> {
        let feed = parser::parse(body).map_err(|e| RillError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decoded(&t.content)),
            description: feed.description.map(|d| decoded(&d.content)),
        };

        let entries = feed
            .entries
            .into_iter()
            .filter_map(|source| Self::convert(feed_id, feed_url, source))
            .collect();

        Ok((meta, entries))
    }

    /// Entries with neither an id nor a link cannot be deduplicated and are
    /// dropped.
    fn convert(feed_id: i64, feed_url: &str, source: SourceEntry) -> Option<Entry> {
        let link = source.links.first().map(|l| l.href.clone());
        let source_id = if source.id.is_empty() {
            link.clone()?
        } else {
            source.id.clone()
        };

        let mut entry = Entry::new(feed_id, feed_url, &source_id);
        entry.title = source
            .title
            .map(|t| decoded(&t.content))
            .filter(|t| !t.is_empty());
        entry.link = link;
        entry.content = source
            .content
            .and_then(|c| c.body)
            .map(|b| decode_html_entities(&b).to_string());
        entry.summary = source
            .summary
            .map(|s| decode_html_entities(&s.content).to_string());
        entry.author = source.authors.first().map(|a| a.name.clone());
        entry.published_at = source
            .published
            .or(source.updated)
            .map(|dt| dt.with_timezone(&Utc));

        Some(entry)
    }
}
