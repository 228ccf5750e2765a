//! In-memory entry model shared by every view of the entry list.
//!
//! [`EntryStore`] is the only writer of entry state. Readers look entries up
//! by id and learn about changes through [`EntryStore::subscribe`]. Every
//! state change is written through to the persistent [`Store`] before it is
//! applied in memory, so a failed write leaves both sides untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::app::{Result, RillError};
use crate::domain::Entry;
use crate::store::Store;

const EVENT_CAPACITY: usize = 256;

/// Change notification published by [`EntryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Upserted { ids: Vec<String> },
    ReadChanged {
        feed_id: i64,
        entry_id: String,
        is_read: bool,
    },
    /// Several entries changed read state in one operation.
    ReadBatchChanged {
        is_read: bool,
        /// `(feed_id, entry_id)` of every entry that changed.
        changes: Vec<(i64, String)>,
    },
    StarChanged { entry_id: String, is_starred: bool },
    TranslationChanged { entry_id: String },
    Evicted { count: usize },
}

pub struct EntryStore {
    entries: HashMap<String, Entry>,
    backend: Option<Arc<dyn Store + Send + Sync>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    /// A store that keeps state in memory only.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: HashMap::new(),
            backend: None,
            events,
        }
    }

    pub fn with_backend(backend: Arc<dyn Store + Send + Sync>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::new()
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge freshly loaded entries.
    ///
    /// Content fields are replaced; read, star and translation state of
    /// entries already held is kept, since this store is where that state
    /// changes and a page loaded earlier may carry an older copy.
    pub fn upsert(&mut self, incoming: Vec<Entry>) {
        if incoming.is_empty() {
            return;
        }

        let mut ids = Vec::with_capacity(incoming.len());
        for mut entry in incoming {
            ids.push(entry.id.clone());
            if let Some(existing) = self.entries.get(&entry.id) {
                entry.is_read = existing.is_read;
                entry.read_at = existing.read_at;
                entry.is_starred = existing.is_starred;
                entry.settings = existing.settings.clone();
                entry.translated_title = existing.translated_title.clone();
            }
            self.entries.insert(entry.id.clone(), entry);
        }

        self.emit(StoreEvent::Upserted { ids });
    }

    /// Set the read state of an entry.
    ///
    /// Returns `Ok(false)` without touching the backend or notifying anyone
    /// when the entry already has the requested state.
    pub fn mark_read(&mut self, feed_id: i64, entry_id: &str, is_read: bool) -> Result<bool> {
        let entry = self
            .entries
            .get(entry_id)
            .ok_or_else(|| RillError::EntryNotFound(entry_id.to_string()))?;
        if entry.feed_id != feed_id {
            debug!(
                "mark_read for {} names feed {}, entry belongs to {}",
                entry.short_id(),
                feed_id,
                entry.feed_id
            );
        }

        match self.write_read(entry_id, is_read)? {
            Some(feed_id) => {
                self.emit(StoreEvent::ReadChanged {
                    feed_id,
                    entry_id: entry_id.to_string(),
                    is_read,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Mark every listed entry read and publish one batch notification.
    /// Unknown ids are skipped. On a failed write the entries changed so far
    /// are still announced before the error is returned.
    pub fn mark_all_read<'a, I>(&mut self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut changes = Vec::new();
        let mut failure = None;
        for id in ids {
            if !self.entries.contains_key(id) {
                continue;
            }
            match self.write_read(id, true) {
                Ok(Some(feed_id)) => changes.push((feed_id, id.to_string())),
                Ok(None) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let changed = changes.len();
        if changed > 0 {
            self.emit(StoreEvent::ReadBatchChanged {
                is_read: true,
                changes,
            });
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(changed),
        }
    }

    /// Write a read state through to the backend and memory. Returns the
    /// entry's feed when the state changed.
    fn write_read(&mut self, entry_id: &str, is_read: bool) -> Result<Option<i64>> {
        let Some(entry) = self.entries.get(entry_id) else {
            return Err(RillError::EntryNotFound(entry_id.to_string()));
        };
        if entry.is_read == is_read {
            return Ok(None);
        }
        let feed_id = entry.feed_id;

        if let Some(backend) = &self.backend {
            backend.set_read(entry_id, is_read)?;
        }

        if let Some(entry) = self.entries.get_mut(entry_id) {
            entry.is_read = is_read;
            entry.read_at = is_read.then(Utc::now);
        }
        Ok(Some(feed_id))
    }

    pub fn set_starred(&mut self, entry_id: &str, is_starred: bool) -> Result<bool> {
        let entry = self
            .entries
            .get(entry_id)
            .ok_or_else(|| RillError::EntryNotFound(entry_id.to_string()))?;

        if entry.is_starred == is_starred {
            return Ok(false);
        }

        if let Some(backend) = &self.backend {
            backend.set_starred(entry_id, is_starred)?;
        }

        if let Some(entry) = self.entries.get_mut(entry_id) {
            entry.is_starred = is_starred;
        }

        self.emit(StoreEvent::StarChanged {
            entry_id: entry_id.to_string(),
            is_starred,
        });
        Ok(true)
    }

    /// Record the translation language of an entry and, once known, the
    /// translated title.
    pub fn set_translation(
        &mut self,
        entry_id: &str,
        language: Option<&str>,
        translated_title: Option<&str>,
    ) -> Result<bool> {
        let entry = self
            .entries
            .get(entry_id)
            .ok_or_else(|| RillError::EntryNotFound(entry_id.to_string()))?;

        if entry.settings.translation.as_deref() == language
            && entry.translated_title.as_deref() == translated_title
        {
            return Ok(false);
        }

        if let Some(backend) = &self.backend {
            backend.set_translation(entry_id, language, translated_title)?;
        }

        if let Some(entry) = self.entries.get_mut(entry_id) {
            entry.settings.translation = language.map(String::from);
            entry.translated_title = translated_title.map(String::from);
        }

        self.emit(StoreEvent::TranslationChanged {
            entry_id: entry_id.to_string(),
        });
        Ok(true)
    }

    /// Drop entries that `keep` rejects. Rows for evicted ids render as
    /// placeholders until they are loaded again.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Entry) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|_, entry| keep(entry));
        let count = before - self.entries.len();
        if count > 0 {
            self.emit(StoreEvent::Evicted { count });
        }
        count
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
