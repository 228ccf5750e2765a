//! Application-wide constants shared by routing, the CLI and the TUI.

/// Feed selector for the list of starred entries.
pub const FEED_COLLECTION_LIST: &str = "collections";

/// Feed selector for every feed of the current view.
pub const ROUTE_FEED_PENDING: &str = "all";

/// Prefix of feed selectors addressing a folder (feed category).
pub const ROUTE_FEED_IN_FOLDER: &str = "folder-";

pub const APP_NAME: &str = "rill";
