use std::fmt;
use std::str::FromStr;

use crate::constants::{FEED_COLLECTION_LIST, ROUTE_FEED_IN_FOLDER, ROUTE_FEED_PENDING};
use crate::domain::ViewType;

/// Which feeds the entry column is showing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FeedSelector {
    /// Every feed subscribed under the current view.
    #[default]
    All,
    /// Starred entries across all feeds.
    Collections,
    /// Feeds filed under a category.
    Folder(String),
    /// A single concrete feed.
    Feed(i64),
}

impl FeedSelector {
    pub fn is_collection(&self) -> bool {
        matches!(self, FeedSelector::Collections)
    }

    pub fn feed_id(&self) -> Option<i64> {
        match self {
            FeedSelector::Feed(id) => Some(*id),
            _ => None,
        }
    }
}

/// True for ids that address a real, stored feed rather than a virtual list.
pub fn is_biz_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 19 && id.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for FeedSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == ROUTE_FEED_PENDING {
            Ok(FeedSelector::All)
        } else if s == FEED_COLLECTION_LIST {
            Ok(FeedSelector::Collections)
        } else if let Some(folder) = s.strip_prefix(ROUTE_FEED_IN_FOLDER) {
            if folder.is_empty() {
                Err("Empty folder name".to_string())
            } else {
                Ok(FeedSelector::Folder(folder.to_string()))
            }
        } else if is_biz_id(s) {
            s.parse::<i64>()
                .map(FeedSelector::Feed)
                .map_err(|e| format!("Invalid feed id {}: {}", s, e))
        } else {
            Err(format!("Unknown feed selector: {}", s))
        }
    }
}

impl fmt::Display for FeedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSelector::All => f.write_str(ROUTE_FEED_PENDING),
            FeedSelector::Collections => f.write_str(FEED_COLLECTION_LIST),
            FeedSelector::Folder(name) => write!(f, "{}{}", ROUTE_FEED_IN_FOLDER, name),
            FeedSelector::Feed(id) => write!(f, "{}", id),
        }
    }
}

/// Everything that determines the ordered entry list on screen.
///
/// Changing any field starts a new list session: pages, window and
/// read-marking state are all dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ListContext {
    pub feed: FeedSelector,
    pub view: ViewType,
    pub unread_only: bool,
}

impl ListContext {
    pub fn new(feed: FeedSelector, view: ViewType, unread_only: bool) -> Self {
        Self {
            feed,
            view,
            unread_only,
        }
    }

    /// The collections list ignores the unread filter.
    pub fn effective_unread_only(&self) -> bool {
        self.unread_only && !self.feed.is_collection()
    }
}
