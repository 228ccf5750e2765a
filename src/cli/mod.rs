pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::{FeedSelector, ViewType};
use crate::fetcher::parallel::DEFAULT_WORKERS;

#[derive(Parser)]
#[command(name = "rill")]
#[command(about = "A terminal feed reader", long_about = None)]
pub struct Cli {
    /// Number of parallel workers for fetching feeds
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new feed
    Add {
        /// URL of the feed to add
        url: String,
        /// View the feed is listed under (articles, social, pictures, videos, audios, notifications)
        #[arg(long, default_value = "articles")]
        view: ViewType,
        /// Folder to file the feed in
        #[arg(long)]
        category: Option<String>,
        /// User allowed to trigger a full resync
        #[arg(long)]
        owner: Option<String>,
    },
    /// Remove a feed
    Remove {
        /// URL of the feed to remove
        url: String,
    },
    /// Update all feeds
    Update,
    /// List feeds or entries
    List {
        /// Show entries instead of feeds
        #[arg(long)]
        entries: bool,
        /// Only unread entries
        #[arg(long)]
        unread: bool,
        /// Only entries of feeds in this view
        #[arg(long, default_value = "articles")]
        view: ViewType,
        /// all, collections, folder-<name> or a feed id
        #[arg(long, default_value = "all")]
        feed: FeedSelector,
        /// Maximum number of entries
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Mark an entry as read
    MarkRead {
        /// Entry id as shown by `list --entries`
        entry_id: String,
    },
    /// Launch the TUI
    Tui {
        /// View to start in
        #[arg(long)]
        view: Option<ViewType>,
        /// all, collections, folder-<name> or a feed id
        #[arg(long)]
        feed: Option<FeedSelector>,
        /// Start with only unread entries listed
        #[arg(long)]
        unread: bool,
    },
}
