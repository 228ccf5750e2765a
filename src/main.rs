use std::fs::File;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rill::app::AppContext;
use rill::cli::{commands, Cli, Commands};
use rill::config::Config;
use rill::constants::APP_NAME;
use rill::domain::ListContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file.
    let is_tui = matches!(cli.command, Commands::Tui { .. });
    let (stderr_layer, file_layer) = if is_tui {
        let path = AppContext::data_dir()?.join(format!("{}.log", APP_NAME));
        let file = File::create(path)?;
        let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
        (None, Some(layer))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let ctx = AppContext::with_workers(None, cli.workers)?.with_translation(&config.translation);

    match cli.command {
        Commands::Add {
            url,
            view,
            category,
            owner,
        } => {
            commands::add_feed(&ctx, &url, view, category, owner).await?;
        }
        Commands::Remove { url } => {
            commands::remove_feed(&ctx, &url).await?;
        }
        Commands::Update => {
            commands::update_feeds(&ctx).await?;
        }
        Commands::List {
            entries,
            unread,
            view,
            feed,
            limit,
        } => {
            if entries {
                let context = ListContext::new(feed, view, unread);
                commands::list_entries(&ctx, &context, limit)?;
            } else {
                commands::list_feeds(&ctx)?;
            }
        }
        Commands::MarkRead { entry_id } => {
            commands::mark_read(&ctx, &entry_id)?;
        }
        Commands::Tui { view, feed, unread } => {
            let initial =
                rill::tui::initial_context(feed, view, unread || config.general.unread_only);
            rill::tui::run(Arc::new(ctx), Arc::new(config), initial).await?;
        }
    }

    Ok(())
}
