use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Per-entry settings that change how the row is augmented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySettings {
    /// Target language for title translation, if the user asked for one.
    pub translation: Option<String>,
}

/// Position of an entry in newest-first order. Paging resumes strictly
/// after it, so entries leaving the result set never shift later pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCursor {
    /// `published_at`, or `fetched_at` when unknown, as stored.
    pub sort_key: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub feed_id: i64,
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_starred: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub settings: EntrySettings,
    /// Title in `settings.translation`, once the translator has answered.
    pub translated_title: Option<String>,
}

impl Entry {
    pub fn new(feed_id: i64, feed_url: &str, source_id: &str) -> Self {
        let id = Self::generate_id(feed_url, source_id);
        Self {
            id,
            feed_id,
            title: None,
            link: None,
            content: None,
            summary: None,
            author: None,
            published_at: None,
            fetched_at: Utc::now(),
            is_read: false,
            is_starred: false,
            read_at: None,
            settings: EntrySettings::default(),
            translated_title: None,
        }
    }

    /// Generate a deterministic ID from feed URL and the source entry id.
    ///
    /// The result is lowercase hex and never contains a space.
    pub fn generate_id(feed_url: &str, source_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(feed_url.as_bytes());
        hasher.update(source_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        self.translated_title
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("(Untitled)")
    }

    /// Get the best available content for display
    pub fn display_content(&self) -> &str {
        self.content
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or("")
    }

    /// Calendar day used to group entries under date separators.
    pub fn day(&self) -> NaiveDate {
        self.published_at.unwrap_or(self.fetched_at).date_naive()
    }

    pub fn cursor(&self) -> EntryCursor {
        EntryCursor {
            sort_key: self.published_at.unwrap_or(self.fetched_at).to_rfc3339(),
            id: self.id.clone(),
        }
    }

    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation_deterministic() {
        let id1 = Entry::generate_id("https://example.com/feed.xml", "entry-123");
        let id2 = Entry::generate_id("https://example.com/feed.xml", "entry-123");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_id_generation_different_inputs() {
        let id1 = Entry::generate_id("https://example.com/feed.xml", "entry-123");
        let id2 = Entry::generate_id("https://example.com/feed.xml", "entry-456");
        let id3 = Entry::generate_id("https://other.com/feed.xml", "entry-123");
        assert_ne!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_id_never_contains_space() {
        let id = Entry::generate_id("https://example.com/feed.xml", "an id with spaces");
        assert_eq!(id.len(), 64);
        assert!(!id.contains(' '));
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_display_title_prefers_translation() {
        let mut entry = Entry::new(1, "https://example.com/feed.xml", "e1");
        assert_eq!(entry.display_title(), "(Untitled)");
        entry.title = Some("Hello".into());
        assert_eq!(entry.display_title(), "Hello");
        entry.translated_title = Some("Bonjour".into());
        assert_eq!(entry.display_title(), "Bonjour");
    }

    #[test]
    fn test_display_content_falls_back_to_summary() {
        let mut entry = Entry::new(1, "https://example.com/feed.xml", "e1");
        assert_eq!(entry.display_content(), "");
        entry.summary = Some("Short summary".into());
        assert_eq!(entry.display_content(), "Short summary");
        entry.content = Some("Full content".into());
        assert_eq!(entry.display_content(), "Full content");
    }

    #[test]
    fn test_day_uses_fetch_time_without_publish_date() {
        let mut entry = Entry::new(1, "https://example.com/feed.xml", "e1");
        assert_eq!(entry.day(), entry.fetched_at.date_naive());
        entry.published_at = Some("2024-01-01T10:00:00Z".parse().unwrap());
        assert_eq!(entry.day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_cursor_sorts_like_stored_dates() {
        let mut newer = Entry::new(1, "https://example.com/feed.xml", "n");
        newer.published_at = Some("2024-01-02T00:00:00Z".parse().unwrap());
        let mut older = Entry::new(1, "https://example.com/feed.xml", "o");
        older.published_at = Some("2024-01-01T23:59:59Z".parse().unwrap());

        assert_eq!(newer.cursor().sort_key, "2024-01-02T00:00:00+00:00");
        assert!(older.cursor().sort_key < newer.cursor().sort_key);
        assert_eq!(older.cursor().id, older.id);
    }
}
