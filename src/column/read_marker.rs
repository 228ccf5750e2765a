//! Marks entries read as the user moves through the list.
//!
//! The marker turns visible-range events into entry ids to mark read. It
//! never reports anything before the user has scrolled or clicked, skips date
//! separators, and reports each id at most once per list session.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use crate::column::virtualizer::VisibleRange;
use crate::domain::ListRow;

/// Which rows count as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Rows that stayed visible for the dwell time.
    #[default]
    Render,
    /// Rows scrolled past the top edge of the viewport.
    Scroll,
    /// Only entries opened explicitly are marked read.
    Off,
}

#[derive(Debug, Clone)]
pub struct ReadRangeMarker {
    policy: ReadPolicy,
    dwell: Duration,
    /// Entry ids in the current candidate set, in row order, with the time
    /// they became candidates.
    pending: Vec<(String, Instant)>,
    issued: HashSet<String>,
}

impl ReadRangeMarker {
    pub fn new(policy: ReadPolicy, dwell: Duration) -> Self {
        Self {
            policy,
            dwell,
            pending: Vec::new(),
            issued: HashSet::new(),
        }
    }

    /// Handle a visible-range change and return ids that are due now.
    pub fn on_range_changed(
        &mut self,
        range: VisibleRange,
        rows: &[ListRow],
        interacted: bool,
        now: Instant,
    ) -> Vec<String> {
        if !interacted || self.policy == ReadPolicy::Off {
            self.pending.clear();
            return Vec::new();
        }

        let end = range.end.min(rows.len());
        let start = range.start.min(end);
        let candidates = match self.policy {
            ReadPolicy::Render => &rows[start..end],
            ReadPolicy::Scroll => &rows[..start],
            ReadPolicy::Off => &rows[..0],
        };

        let previous: HashMap<String, Instant> = std::mem::take(&mut self.pending)
            .into_iter()
            .collect();
        for id in candidates.iter().filter_map(ListRow::entry_id) {
            if self.issued.contains(id) {
                continue;
            }
            // Rows that stay visible keep their original timestamp.
            let since = previous.get(id).copied().unwrap_or(now);
            self.pending.push((id.to_string(), since));
        }

        debug!(
            "range {}..{}: {} entries pending read",
            range.start,
            range.end,
            self.pending.len()
        );

        self.poll(now)
    }

    /// Ids whose dwell time has elapsed. Scroll policy rows are already
    /// out of view and need no dwell.
    pub fn poll(&mut self, now: Instant) -> Vec<String> {
        let dwell = match self.policy {
            ReadPolicy::Scroll => Duration::ZERO,
            _ => self.dwell,
        };

        let mut due = Vec::new();
        let issued = &mut self.issued;
        self.pending.retain(|(id, since)| {
            if now.saturating_duration_since(*since) >= dwell {
                if issued.insert(id.clone()) {
                    due.push(id.clone());
                }
                false
            } else {
                true
            }
        });
        due
    }

    /// Forget everything; used when the list context changes.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.issued.clear();
    }
}
