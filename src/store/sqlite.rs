use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, RillError};
use crate::domain::{Entry, EntryCursor, EntrySettings, Feed, FeedSelector, FeedUpdate, ListContext};
use crate::store::{Page, Store};

const FEED_COLUMNS: &str = "id, url, title, description, etag, last_modified, last_fetched_at, \
                            created_at, view, category, owner_user_id";

const ENTRY_SELECT: &str = "SELECT e.id, e.feed_id, e.title, e.link, e.content, e.summary, \
    e.author, e.published_at, e.fetched_at, COALESCE(s.is_read, 0), COALESCE(s.is_starred, 0), \
    s.read_at, s.translation, s.translated_title \
    FROM entries e \
    JOIN feeds f ON f.id = e.feed_id \
    LEFT JOIN entry_state s ON s.entry_id = e.id";

// ?1 view, ?2 unread only, ?3 starred only, ?4 folder, ?5 feed id.
// A single feed lists all of its entries, whatever view it is filed under.
const CONTEXT_FILTER: &str = "WHERE (?5 IS NOT NULL OR f.view = ?1) \
    AND (?2 = 0 OR COALESCE(s.is_read, 0) = 0) \
    AND (?3 = 0 OR COALESCE(s.is_starred, 0) = 1) \
    AND (?4 IS NULL OR f.category = ?4) \
    AND (?5 IS NULL OR f.id = ?5)";

const SORT_KEY: &str = "COALESCE(e.published_at, e.fetched_at)";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            RillError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            etag: row.get(4)?,
            last_modified: row.get(5)?,
            last_fetched_at: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| Self::parse_datetime(&s)),
            created_at: row
                .get::<_, String>(7)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            raw_view: row.get(8)?,
            category: row.get(9)?,
            owner_user_id: row.get(10)?,
        })
    }

    fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
        Ok(Entry {
            id: row.get(0)?,
            feed_id: row.get(1)?,
            title: row.get(2)?,
            link: row.get(3)?,
            content: row.get(4)?,
            summary: row.get(5)?,
            author: row.get(6)?,
            published_at: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| Self::parse_datetime(&s)),
            fetched_at: row
                .get::<_, String>(8)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            is_read: row.get::<_, i32>(9)? != 0,
            is_starred: row.get::<_, i32>(10)? != 0,
            read_at: row
                .get::<_, Option<String>>(11)?
                .and_then(|s| Self::parse_datetime(&s)),
            settings: EntrySettings {
                translation: row.get(12)?,
            },
            translated_title: row.get(13)?,
        })
    }

    fn context_params(ctx: &ListContext) -> (i64, i32, i32, Option<String>, Option<i64>) {
        let folder = match &ctx.feed {
            FeedSelector::Folder(name) => Some(name.clone()),
            _ => None,
        };
        (
            ctx.view.raw(),
            ctx.effective_unread_only() as i32,
            ctx.feed.is_collection() as i32,
            folder,
            ctx.feed.feed_id(),
        )
    }
}

impl Store for SqliteStore {
    fn add_feed(&self, feed: &Feed) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feeds (url, title, description, created_at, view, category, owner_user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                feed.url,
                feed.title,
                feed.description,
                feed.created_at.to_rfc3339(),
                feed.raw_view,
                feed.category,
                feed.owner_user_id,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {} FROM feeds WHERE id = ?1", FEED_COLUMNS),
                params![id],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {} FROM feeds WHERE url = ?1", FEED_COLUMNS),
                params![url],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feeds ORDER BY view, title, url",
            FEED_COLUMNS
        ))?;

        let feeds = stmt
            .query_map([], Self::feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn update_feed(&self, id: i64, update: &FeedUpdate) -> Result<()> {
        let conn = self.conn()?;

        if let Some(ref title) = update.title {
            conn.execute(
                "UPDATE feeds SET title = ?1 WHERE id = ?2",
                params![title, id],
            )?;
        }
        if let Some(ref description) = update.description {
            conn.execute(
                "UPDATE feeds SET description = ?1 WHERE id = ?2",
                params![description, id],
            )?;
        }
        if let Some(ref etag) = update.etag {
            conn.execute("UPDATE feeds SET etag = ?1 WHERE id = ?2", params![etag, id])?;
        }
        if let Some(ref last_modified) = update.last_modified {
            conn.execute(
                "UPDATE feeds SET last_modified = ?1 WHERE id = ?2",
                params![last_modified, id],
            )?;
        }
        if let Some(ref last_fetched_at) = update.last_fetched_at {
            conn.execute(
                "UPDATE feeds SET last_fetched_at = ?1 WHERE id = ?2",
                params![last_fetched_at.to_rfc3339(), id],
            )?;
        }

        Ok(())
    }

    fn delete_feed(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM feeds WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_entries(&self, entries: &[Entry]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO entries
                 (id, feed_id, title, link, content, summary, author, published_at, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for entry in entries {
                count += stmt.execute(params![
                    entry.id,
                    entry.feed_id,
                    entry.title,
                    entry.link,
                    entry.content,
                    entry.summary,
                    entry.author,
                    entry.published_at.map(|d| d.to_rfc3339()),
                    entry.fetched_at.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("{} WHERE e.id = ?1", ENTRY_SELECT),
                params![id],
                Self::entry_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn entry_exists(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn query_page(
        &self,
        ctx: &ListContext,
        after: Option<&EntryCursor>,
        limit: usize,
    ) -> Result<Page> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let (view, unread, starred, folder, feed_id) = Self::context_params(ctx);
        let (after_key, after_id) = match after {
            Some(cursor) => (Some(cursor.sort_key.as_str()), Some(cursor.id.as_str())),
            None => (None, None),
        };

        // One extra row tells whether another page follows.
        let mut entries = {
            let mut stmt = tx.prepare(&format!(
                "{select} {filter}
                 AND (?6 IS NULL OR {key} < ?6 OR ({key} = ?6 AND e.id > ?7))
                 ORDER BY {key} DESC, e.id
                 LIMIT ?8",
                select = ENTRY_SELECT,
                filter = CONTEXT_FILTER,
                key = SORT_KEY
            ))?;
            let rows = stmt
                .query_map(
                    params![
                        view,
                        unread,
                        starred,
                        folder,
                        feed_id,
                        after_key,
                        after_id,
                        limit as i64 + 1
                    ],
                    Self::entry_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let total_count: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM entries e
                 JOIN feeds f ON f.id = e.feed_id
                 LEFT JOIN entry_state s ON s.entry_id = e.id {}",
                CONTEXT_FILTER
            ),
            params![view, unread, starred, folder, feed_id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        let has_next = entries.len() > limit;
        entries.truncate(limit);
        Ok(Page {
            entries,
            total_count: total_count as usize,
            has_next,
        })
    }

    fn set_read(&self, entry_id: &str, is_read: bool) -> Result<()> {
        let conn = self.conn()?;

        let read_at = if is_read {
            Some(Utc::now().to_rfc3339())
        } else {
            None
        };

        conn.execute(
            "INSERT INTO entry_state (entry_id, is_read, read_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(entry_id) DO UPDATE SET is_read = ?2, read_at = ?3",
            params![entry_id, is_read as i32, read_at],
        )?;

        Ok(())
    }

    fn set_starred(&self, entry_id: &str, is_starred: bool) -> Result<()> {
        let conn = self.conn()?;

        let starred_at = if is_starred {
            Some(Utc::now().to_rfc3339())
        } else {
            None
        };

        conn.execute(
            "INSERT INTO entry_state (entry_id, is_starred, starred_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(entry_id) DO UPDATE SET is_starred = ?2, starred_at = ?3",
            params![entry_id, is_starred as i32, starred_at],
        )?;

        Ok(())
    }

    fn set_translation(
        &self,
        entry_id: &str,
        language: Option<&str>,
        translated_title: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO entry_state (entry_id, translation, translated_title) VALUES (?1, ?2, ?3)
             ON CONFLICT(entry_id) DO UPDATE SET translation = ?2, translated_title = ?3",
            params![entry_id, language, translated_title],
        )?;

        Ok(())
    }

    fn get_unread_count(&self, feed_id: i64) -> Result<i64> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries e
             LEFT JOIN entry_state s ON e.id = s.entry_id
             WHERE e.feed_id = ?1 AND (s.is_read IS NULL OR s.is_read = 0)",
            params![feed_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ViewType;

    const FEED_URL: &str = "https://example.com/feed.xml";

    fn store_with_feed(view: ViewType) -> (SqliteStore, i64) {
        let store = SqliteStore::in_memory().unwrap();
        let feed = Feed::new(FEED_URL.into()).with_view(view);
        let id = store.add_feed(&feed).unwrap();
        (store, id)
    }

    fn entry(feed_id: i64, source_id: &str, published: &str) -> Entry {
        let mut entry = Entry::new(feed_id, FEED_URL, source_id);
        entry.title = Some(source_id.to_string());
        entry.published_at = Some(published.parse().unwrap());
        entry
    }

    #[test]
    fn test_add_and_get_feed() {
        let (store, id) = store_with_feed(ViewType::Pictures);
        let feed = store.get_feed(id).unwrap().unwrap();
        assert_eq!(feed.url, FEED_URL);
        assert_eq!(feed.view(), Some(ViewType::Pictures));
    }

    #[test]
    fn test_unknown_view_survives_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut feed = Feed::new(FEED_URL.into());
        feed.raw_view = 42;
        let id = store.add_feed(&feed).unwrap();
        store
            .add_entries(&[entry(id, "e1", "2024-01-01T00:00:00Z")])
            .unwrap();

        let loaded = store.get_feed(id).unwrap().unwrap();
        assert_eq!(loaded.raw_view, 42);
        assert_eq!(loaded.view(), None);

        // The feed's own list is reachable from any view.
        let ctx = ListContext::new(FeedSelector::Feed(id), ViewType::Articles, false);
        assert_eq!(store.query_page(&ctx, None, 10).unwrap().entries.len(), 1);
        let all = ListContext::new(FeedSelector::All, ViewType::Articles, false);
        assert_eq!(store.query_page(&all, None, 10).unwrap().total_count, 0);
    }

    #[test]
    fn test_add_and_get_entry() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let e = entry(feed_id, "e1", "2024-01-01T00:00:00Z");
        store.add_entries(std::slice::from_ref(&e)).unwrap();

        let found = store.get_entry(&e.id).unwrap().unwrap();
        assert_eq!(found.title, Some("e1".into()));
        assert!(!found.is_read);
        assert_eq!(found.published_at, e.published_at);
    }

    #[test]
    fn test_add_entries_dedup() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let entries: Vec<Entry> = (0..3)
            .map(|i| entry(feed_id, &format!("e{}", i), "2024-01-01T00:00:00Z"))
            .collect();

        assert_eq!(store.add_entries(&entries).unwrap(), 3);
        assert_eq!(store.add_entries(&entries).unwrap(), 0);
    }

    #[test]
    fn test_set_read_and_unread_count() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let entries: Vec<Entry> = (0..5)
            .map(|i| entry(feed_id, &format!("e{}", i), "2024-01-01T00:00:00Z"))
            .collect();
        store.add_entries(&entries).unwrap();
        assert_eq!(store.get_unread_count(feed_id).unwrap(), 5);

        store.set_read(&entries[0].id, true).unwrap();
        store.set_read(&entries[1].id, true).unwrap();
        assert_eq!(store.get_unread_count(feed_id).unwrap(), 3);

        let state = store.get_entry(&entries[0].id).unwrap().unwrap();
        assert!(state.is_read);
        assert!(state.read_at.is_some());

        store.set_read(&entries[0].id, false).unwrap();
        let state = store.get_entry(&entries[0].id).unwrap().unwrap();
        assert!(!state.is_read);
        assert!(state.read_at.is_none());
    }

    fn titles(page: &Page) -> Vec<&str> {
        page.entries.iter().filter_map(|e| e.title.as_deref()).collect()
    }

    #[test]
    fn test_query_page_orders_newest_first_and_pages() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let entries = vec![
            entry(feed_id, "old", "2024-01-01T00:00:00Z"),
            entry(feed_id, "new", "2024-01-03T00:00:00Z"),
            entry(feed_id, "mid", "2024-01-02T00:00:00Z"),
        ];
        store.add_entries(&entries).unwrap();

        let ctx = ListContext::new(FeedSelector::All, ViewType::Articles, false);
        let first = store.query_page(&ctx, None, 2).unwrap();
        assert_eq!(titles(&first), vec!["new", "mid"]);
        assert_eq!(first.total_count, 3);
        assert!(first.has_next);

        let cursor = first.entries[1].cursor();
        let second = store.query_page(&ctx, Some(&cursor), 2).unwrap();
        assert_eq!(titles(&second), vec!["old"]);
        assert!(!second.has_next);
    }

    #[test]
    fn test_query_page_breaks_date_ties_by_id() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let entries: Vec<Entry> = (0..5)
            .map(|i| entry(feed_id, &format!("e{}", i), "2024-01-01T00:00:00Z"))
            .collect();
        store.add_entries(&entries).unwrap();

        let ctx = ListContext::new(FeedSelector::All, ViewType::Articles, false);
        let mut seen = Vec::new();
        let mut after = None;
        loop {
            let page = store.query_page(&ctx, after.as_ref(), 2).unwrap();
            seen.extend(page.entries.iter().map(|e| e.id.clone()));
            after = page.entries.last().map(Entry::cursor);
            if !page.has_next {
                break;
            }
        }

        let mut expected: Vec<String> = entries.into_iter().map(|e| e.id).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_unread_pages_survive_marking_read() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let entries: Vec<Entry> = (0..6)
            .map(|i| entry(feed_id, &format!("e{}", i), &format!("2024-01-0{}T00:00:00Z", i + 1)))
            .collect();
        store.add_entries(&entries).unwrap();

        let ctx = ListContext::new(FeedSelector::All, ViewType::Articles, true);
        let first = store.query_page(&ctx, None, 3).unwrap();
        assert_eq!(titles(&first), vec!["e5", "e4", "e3"]);
        for e in &first.entries {
            store.set_read(&e.id, true).unwrap();
        }

        let cursor = first.entries[2].cursor();
        let second = store.query_page(&ctx, Some(&cursor), 3).unwrap();
        assert_eq!(titles(&second), vec!["e2", "e1", "e0"]);
        assert_eq!(second.total_count, 3);
        assert!(!second.has_next);
    }

    #[test]
    fn test_query_page_filters_by_context() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let other = Feed::new("https://example.com/pics.xml".into()).with_view(ViewType::Pictures);
        let other_id = store.add_feed(&other).unwrap();

        let a = entry(feed_id, "a", "2024-01-01T00:00:00Z");
        let b = entry(feed_id, "b", "2024-01-02T00:00:00Z");
        let p = entry(other_id, "p", "2024-01-02T00:00:00Z");
        store.add_entries(&[a.clone(), b.clone(), p]).unwrap();
        store.set_read(&a.id, true).unwrap();
        store.set_starred(&a.id, true).unwrap();

        let all = ListContext::new(FeedSelector::All, ViewType::Articles, false);
        assert_eq!(store.query_page(&all, None, 10).unwrap().total_count, 2);

        let unread = ListContext::new(FeedSelector::All, ViewType::Articles, true);
        let page = store.query_page(&unread, None, 10).unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].id, b.id);

        // Collections ignore the unread filter.
        let starred = ListContext::new(FeedSelector::Collections, ViewType::Articles, true);
        let page = store.query_page(&starred, None, 10).unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].id, a.id);

        let pics = ListContext::new(FeedSelector::Feed(other_id), ViewType::Pictures, false);
        assert_eq!(store.query_page(&pics, None, 10).unwrap().total_count, 1);
    }

    #[test]
    fn test_query_page_by_folder() {
        let store = SqliteStore::in_memory().unwrap();
        let mut tech = Feed::new(FEED_URL.into());
        tech.category = Some("tech".into());
        let tech_id = store.add_feed(&tech).unwrap();
        let plain_id = store
            .add_feed(&Feed::new("https://example.com/other.xml".into()))
            .unwrap();

        store
            .add_entries(&[
                entry(tech_id, "t", "2024-01-01T00:00:00Z"),
                Entry::new(plain_id, "https://example.com/other.xml", "o"),
            ])
            .unwrap();

        let ctx = ListContext::new(FeedSelector::Folder("tech".into()), ViewType::Articles, false);
        let page = store.query_page(&ctx, None, 10).unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].feed_id, tech_id);
    }

    #[test]
    fn test_set_translation() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let e = entry(feed_id, "e1", "2024-01-01T00:00:00Z");
        store.add_entries(std::slice::from_ref(&e)).unwrap();

        store.set_translation(&e.id, Some("fr"), Some("Bonjour")).unwrap();
        let found = store.get_entry(&e.id).unwrap().unwrap();
        assert_eq!(found.settings.translation.as_deref(), Some("fr"));
        assert_eq!(found.translated_title.as_deref(), Some("Bonjour"));
    }

    #[test]
    fn test_delete_feed_cascades_entries() {
        let (store, feed_id) = store_with_feed(ViewType::Articles);
        let e = entry(feed_id, "e1", "2024-01-01T00:00:00Z");
        store.add_entries(std::slice::from_ref(&e)).unwrap();
        assert!(store.entry_exists(&e.id).unwrap());

        store.delete_feed(feed_id).unwrap();
        assert!(store.get_feed(feed_id).unwrap().is_none());
        assert!(!store.entry_exists(&e.id).unwrap());
    }

    #[test]
    fn test_update_feed_partial() {
        let (store, id) = store_with_feed(ViewType::Articles);
        let update = FeedUpdate {
            title: Some("New Title".into()),
            ..Default::default()
        };
        store.update_feed(id, &update).unwrap();

        let feed = store.get_feed(id).unwrap().unwrap();
        assert_eq!(feed.title, Some("New Title".into()));
        assert_eq!(feed.etag, None);
    }

    #[test]
    fn test_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rill.db");

        let id = {
            let store = SqliteStore::new(&path).unwrap();
            store.add_feed(&Feed::new(FEED_URL.into())).unwrap()
        };

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.get_feed(id).unwrap().is_some());
        assert!(store.get_feed_by_url(FEED_URL).unwrap().is_some());
        assert_eq!(store.get_all_feeds().unwrap().len(), 1);
    }
}
