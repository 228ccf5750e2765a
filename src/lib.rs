//! # Rill
//!
//! A terminal feed reader built around a virtualized entry column.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Store → Query → Column → Render → UI
//! ```
//!
//! Pages of entries are loaded off the UI loop and handed back tagged with
//! the context session they were requested for, so results that arrive after
//! the user switched feeds or views are dropped.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a feed
//! rill add https://blog.rust-lang.org/feed.xml
//!
//! # Add a picture feed into a folder
//! rill add https://example.com/photos.xml --view pictures --category art
//!
//! # Update all feeds
//! rill update
//!
//! # Launch TUI on unread articles
//! rill tui --unread
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetchers, normalizer and the optional translator.
pub mod app;

/// Command-line interface using clap.
///
/// - `add <url>` - Add a new feed
/// - `remove <url>` - Remove a feed
/// - `update` - Update all feeds
/// - `list [--entries]` - List feeds or entries
/// - `mark-read <id>` - Mark one entry read
/// - `tui` - Launch the TUI
pub mod cli;

/// The entry column: windowing, scroll seek, read marking and the header.
pub mod column;

/// Configuration loaded from `~/.config/rill/config.toml`.
pub mod config;

pub mod constants;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): feed metadata and the view it belongs to
/// - [`Entry`](domain::Entry): feed entries with SHA256 IDs
/// - [`ListContext`](domain::ListContext): which entries a column shows
/// - [`ListRow`](domain::ListRow): entries interleaved with day separators
pub mod domain;

/// HTTP fetching with conditional request support.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS, Atom and JSON Feed documents into [`Entry`](domain::Entry)
/// structs.
pub mod normalizer;

/// Paged entry queries with stale-result detection.
pub mod query;

/// Per-view row renderers and loading skeletons.
pub mod render;

/// SQLite persistence and the in-memory entry store.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`EntryStore`](store::EntryStore): single-writer cache with change notifications
pub mod store;

/// Title translation.
pub mod translation;

/// Terminal user interface.
///
/// Feeds, entries and preview panes. The entry pane is driven by
/// [`EntryColumn`](column::EntryColumn).
pub mod tui;
