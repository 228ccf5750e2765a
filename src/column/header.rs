//! Header and empty-state models for the entry column.
//!
//! Both are derived from the current list state on every frame; nothing here
//! holds state of its own.

use crate::domain::{Feed, FeedSelector, ListContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshAffordance {
    /// Offline: no refresh control at all.
    Hidden,
    /// Full resync of a feed the current user owns.
    OwnerRefresh { spinning: bool },
    /// Re-read the local store.
    ClientRefetch { spinning: bool, has_update: bool },
}

impl RefreshAffordance {
    pub fn tooltip(&self) -> Option<&'static str> {
        match self {
            RefreshAffordance::Hidden => None,
            RefreshAffordance::OwnerRefresh { .. } => Some("Refresh"),
            RefreshAffordance::ClientRefetch {
                has_update: true, ..
            } => Some("New entries available"),
            RefreshAffordance::ClientRefetch { .. } => Some("Refetch"),
        }
    }

    pub fn is_spinning(&self) -> bool {
        match self {
            RefreshAffordance::Hidden => false,
            RefreshAffordance::OwnerRefresh { spinning }
            | RefreshAffordance::ClientRefetch { spinning, .. } => *spinning,
        }
    }
}

/// Everything the header depends on.
#[derive(Debug, Clone)]
pub struct HeaderInput<'a> {
    pub context: &'a ListContext,
    pub title: Option<&'a str>,
    pub total_count: usize,
    pub active_entry: Option<&'a str>,
    pub is_fetching: bool,
    pub is_fetching_next_page: bool,
    pub owner_refresh_pending: bool,
    pub has_update: bool,
    pub online: bool,
    /// The selected feed is a concrete feed owned by the current user.
    pub owned_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderModel {
    pub title: Option<String>,
    pub count_label: String,
    pub refresh: RefreshAffordance,
    pub actions_visible: bool,
    pub show_entry_actions: bool,
    pub unread_toggle_label: &'static str,
    pub refreshing: bool,
}

impl HeaderModel {
    pub fn derive(input: &HeaderInput<'_>) -> Self {
        let unread_only = input.context.unread_only;
        let in_collections = input.context.feed.is_collection();

        let count_label = if unread_only && !in_collections {
            format!("{} Unread Items", input.total_count)
        } else {
            format!("{} Items", input.total_count)
        };

        let refreshing = input.is_fetching && !input.is_fetching_next_page;

        let refresh = if !input.online {
            RefreshAffordance::Hidden
        } else if input.owned_by_user && input.context.feed.feed_id().is_some() {
            RefreshAffordance::OwnerRefresh {
                spinning: input.owner_refresh_pending,
            }
        } else {
            RefreshAffordance::ClientRefetch {
                spinning: refreshing,
                has_update: input.has_update,
            }
        };

        Self {
            title: input.title.map(String::from),
            count_label,
            refresh,
            actions_visible: !in_collections && input.title.is_some(),
            show_entry_actions: input.context.view.descriptor().wide_mode
                && input.active_entry.is_some(),
            unread_toggle_label: if unread_only { "Unread Only" } else { "All" },
            refreshing,
        }
    }
}

/// Title shown above the list for a selector.
pub fn header_title(context: &ListContext, feeds: &[Feed]) -> Option<String> {
    match &context.feed {
        FeedSelector::All => Some(context.view.descriptor().name.to_string()),
        FeedSelector::Collections => Some("Collections".to_string()),
        FeedSelector::Folder(name) => Some(name.clone()),
        FeedSelector::Feed(id) => feeds
            .iter()
            .find(|f| f.id == *id)
            .map(|f| f.display_title().to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    ZeroUnread,
    ZeroItems,
}

impl EmptyState {
    /// `None` while the first page is still loading or when there is data.
    pub fn derive(is_loading: bool, total_count: usize, unread_only: bool) -> Option<Self> {
        if is_loading || total_count > 0 {
            return None;
        }
        Some(if unread_only {
            EmptyState::ZeroUnread
        } else {
            EmptyState::ZeroItems
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmptyState::ZeroUnread => "Zero Unread",
            EmptyState::ZeroItems => "Zero Items",
        }
    }
}
