use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ViewType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Stored view value. May name a view this build does not know.
    pub raw_view: i64,
    /// Folder the feed is filed in, if any.
    pub category: Option<String>,
    /// User that may trigger a full resync of this feed.
    pub owner_user_id: Option<String>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            id: 0,
            url,
            title: None,
            description: None,
            etag: None,
            last_modified: None,
            last_fetched_at: None,
            created_at: Utc::now(),
            raw_view: ViewType::default().raw(),
            category: None,
            owner_user_id: None,
        }
    }

    pub fn with_view(mut self, view: ViewType) -> Self {
        self.raw_view = view.raw();
        self
    }

    /// View the feed is subscribed under, if it is a known one.
    pub fn view(&self) -> Option<ViewType> {
        ViewType::from_raw(self.raw_view)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    pub fn is_owned_by(&self, user_id: Option<&str>) -> bool {
        match (self.owner_user_id.as_deref(), user_id) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}
