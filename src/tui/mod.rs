pub mod app;
pub mod event;
pub mod layout;

use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, MouseButton, MouseEvent, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Position, Terminal};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::app::{AppContext, Result};
use crate::column::virtualizer::KeyDisposition;
use crate::column::{ColumnCommand, ColumnOptions, TranslateRequest};
use crate::config::Config;
use crate::domain::{FeedSelector, ListContext, ViewType};
use crate::fetcher::parallel::refresh_feed;
use crate::query::{run_request, QueryEvent, StorePageSource};
use crate::store::{EntryStore, Store};

use self::app::{ActivePane, SidebarItem, TuiApp};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(50);

pub async fn run(ctx: Arc<AppContext>, config: Arc<Config>, initial: ListContext) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, config, initial).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Tui,
    ctx: Arc<AppContext>,
    config: Arc<Config>,
    initial: ListContext,
) -> Result<()> {
    let options = ColumnOptions::from_config(&config);
    let store = EntryStore::with_backend(ctx.store.clone());
    let mut tui_app = TuiApp::new(initial, options, store);
    let mut event_handler = EventHandler::new(TICK_RATE);
    let sender = event_handler.sender();

    let result = load_feeds(&mut tui_app, &ctx);
    report(&mut tui_app, result);
    let initial_feed = tui_app.column.context().feed.clone();
    tui_app.open_selector(initial_feed);

    loop {
        let now = Instant::now();
        let size = terminal.size()?;
        let area = ratatui::layout::Rect::new(0, 0, size.width, size.height);
        if let Some(rows) = layout::entry_rows_area(area, tui_app.maximized) {
            let result = tui_app
                .column
                .set_viewport(rows.width, rows.height, &mut tui_app.store, now);
            report(&mut tui_app, result);
        }

        dispatch(&mut tui_app, &ctx, &sender);
        tui_app.drain_store_events();
        if tui_app.counts_stale() {
            let result = load_feeds(&mut tui_app, &ctx);
            report(&mut tui_app, result);
        }
        terminal.draw(|frame| layout::render(frame, &mut tui_app, &config.colors, now))?;

        match event_handler.next()? {
            AppEvent::Key(key) => {
                if let Some((feed_id, feed_title)) = tui_app.pending_delete.take() {
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => {
                            let result = delete_feed(&mut tui_app, &ctx, feed_id, &feed_title);
                            report(&mut tui_app, result);
                        }
                        _ => {
                            tui_app.set_status("Delete cancelled".to_string());
                        }
                    }
                    continue;
                }

                if tui_app.active_pane == ActivePane::Entries {
                    let result = tui_app
                        .column
                        .on_key(key.code, &mut tui_app.store, Instant::now());
                    match result {
                        Ok(KeyDisposition::Suppressed) | Ok(KeyDisposition::Ignored) => {}
                        Ok(_) => continue,
                        Err(e) => {
                            report(&mut tui_app, Err(e));
                            continue;
                        }
                    }
                }

                let action = config.keybindings.get_action(&key);
                perform(&mut tui_app, action, &ctx, &sender);
            }
            AppEvent::Mouse(mouse) => handle_mouse(&mut tui_app, mouse),
            AppEvent::Resize => {}
            AppEvent::Tick => {
                let result = tui_app.column.tick(&mut tui_app.store, Instant::now());
                report(&mut tui_app, result);
            }
            AppEvent::Query(event) => handle_query_event(&mut tui_app, &ctx, event),
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

fn delete_feed(tui_app: &mut TuiApp, ctx: &AppContext, feed_id: i64, title: &str) -> Result<()> {
    ctx.store.delete_feed(feed_id)?;
    info!("deleted feed {}", feed_id);
    if tui_app.column.context().feed == FeedSelector::Feed(feed_id) {
        let context = ListContext::new(FeedSelector::All, tui_app.view, tui_app.unread_only);
        tui_app.switch_context(context);
    }
    tui_app.set_status(format!("Deleted feed: {}", title));
    load_feeds(tui_app, ctx)
}

/// Run a key action. Failures end up in the status bar.
fn perform(
    tui_app: &mut TuiApp,
    action: Action,
    ctx: &Arc<AppContext>,
    sender: &UnboundedSender<QueryEvent>,
) {
    let result = handle_action(tui_app, action, ctx, sender);
    report(tui_app, result);
}

fn handle_action(
    tui_app: &mut TuiApp,
    action: Action,
    ctx: &Arc<AppContext>,
    sender: &UnboundedSender<QueryEvent>,
) -> Result<()> {
    let now = Instant::now();
    match action {
        Action::Quit => {
            tui_app.should_quit = true;
        }
        Action::MoveUp => {
            if tui_app.active_pane == ActivePane::Entries {
                let result = tui_app.column.select_prev(&mut tui_app.store, now);
                tui_app.preview_scroll = 0;
                report(tui_app, result);
            } else {
                tui_app.move_up();
            }
        }
        Action::MoveDown => {
            if tui_app.active_pane == ActivePane::Entries {
                let result = tui_app.column.select_next(&mut tui_app.store, now);
                tui_app.preview_scroll = 0;
                report(tui_app, result);
            } else {
                tui_app.move_down();
            }
        }
        Action::ToggleMaximize => {
            tui_app.toggle_maximize();
        }
        Action::NextPane => {
            tui_app.active_pane = tui_app.active_pane.next();
        }
        Action::PrevPane => {
            tui_app.active_pane = tui_app.active_pane.prev();
        }
        Action::Select => match tui_app.active_pane {
            ActivePane::Feeds => {
                tui_app.open_sidebar_item();
                tui_app.active_pane = ActivePane::Entries;
            }
            ActivePane::Entries => {
                if tui_app.column.active_entry().is_none() {
                    let result = tui_app.column.select_next(&mut tui_app.store, now);
                    report(tui_app, result);
                }
                tui_app.active_pane = ActivePane::Preview;
            }
            ActivePane::Preview => {}
        },
        Action::ClearSelection => {
            tui_app.column.clear_selection();
            tui_app.clear_status();
        }
        Action::ToggleRead => {
            if let Some(entry) = tui_app.active_entry() {
                let (feed_id, id, is_read) = (entry.feed_id, entry.id.clone(), entry.is_read);
                tui_app.store.mark_read(feed_id, &id, !is_read)?;
            }
        }
        Action::ToggleStar => {
            if let Some(entry) = tui_app.active_entry() {
                let (id, is_starred) = (entry.id.clone(), entry.is_starred);
                tui_app.store.set_starred(&id, !is_starred)?;
            }
        }
        Action::OpenInBrowser => {
            if let Some(entry) = tui_app.active_entry() {
                if let Some(link) = entry.link.clone() {
                    let (feed_id, id) = (entry.feed_id, entry.id.clone());
                    if let Err(e) = open::that(&link) {
                        tui_app.set_status(format!("Failed to open browser: {}", e));
                    } else if !tui_app.column.context().feed.is_collection() {
                        tui_app.store.mark_read(feed_id, &id, true)?;
                    }
                }
            }
        }
        Action::Refresh => {
            tui_app.column.refresh(&tui_app.feeds);
        }
        Action::UpdateAll => {
            if !tui_app.is_updating {
                tui_app.is_updating = true;
                spawn_update_all(ctx, sender);
            }
        }
        Action::ToggleUnreadOnly => {
            tui_app.toggle_unread_only();
        }
        Action::MarkAllRead => {
            let marked = tui_app.column.mark_all_read(&mut tui_app.store)?;
            tui_app.set_status(format!("Marked {} entries read", marked));
        }
        Action::NextView => tui_app.cycle_view(true),
        Action::PrevView => tui_app.cycle_view(false),
        Action::Translate => {
            if !tui_app.column.toggle_translation(&mut tui_app.store)? {
                tui_app.set_status("Translation is not configured".to_string());
            }
        }
        Action::DeleteFeed => {
            if tui_app.active_pane == ActivePane::Feeds {
                let target = match tui_app.selected_sidebar_item() {
                    Some(SidebarItem::Feed { id, title }) => Some((*id, title.clone())),
                    _ => None,
                };
                if target.is_some() {
                    tui_app.pending_delete = target;
                }
            }
        }
        Action::None => {}
    }
    Ok(())
}

fn handle_mouse(tui_app: &mut TuiApp, mouse: MouseEvent) {
    let area = tui_app.entry_rows_area;
    if !area.contains(Position::new(mouse.column, mouse.row)) {
        return;
    }
    let now = Instant::now();
    let result = match mouse.kind {
        MouseEventKind::ScrollDown => tui_app.column.on_scroll(1, &mut tui_app.store, now),
        MouseEventKind::ScrollUp => tui_app.column.on_scroll(-1, &mut tui_app.store, now),
        MouseEventKind::Down(MouseButton::Left) => {
            tui_app.active_pane = ActivePane::Entries;
            match tui_app
                .column
                .index_at(mouse.column - area.x, mouse.row - area.y)
            {
                Some(index) => tui_app.column.click(index, &mut tui_app.store, now),
                None => Ok(()),
            }
        }
        _ => Ok(()),
    };
    report(tui_app, result);
}

fn handle_query_event(tui_app: &mut TuiApp, ctx: &AppContext, event: QueryEvent) {
    let summary = match &event {
        QueryEvent::FeedsUpdated {
            new_entries,
            failed,
            ..
        } => {
            tui_app.is_updating = false;
            Some(if *failed > 0 {
                format!("Updated: {} new entries, {} feeds failed", new_entries, failed)
            } else {
                format!("Updated: {} new entries", new_entries)
            })
        }
        QueryEvent::FeedRefreshed {
            result: Ok(count), ..
        } => Some(format!("Feed refreshed: {} new entries", count)),
        _ => None,
    };
    let reload = summary.is_some();

    let result = tui_app.column.apply(event, &mut tui_app.store, Instant::now());
    report(tui_app, result);

    if let Some(summary) = summary {
        tui_app.set_status(summary);
    }
    if reload {
        let result = load_feeds(tui_app, ctx);
        report(tui_app, result);
    }
}

/// Show a failed column operation in the status bar.
fn report(tui_app: &mut TuiApp, result: Result<()>) {
    if let Err(e) = result {
        warn!("{}", e);
        let message = if e.is_offline() {
            "Offline: could not reach the network".to_string()
        } else {
            format!("Error: {}", e)
        };
        tui_app.set_status(message);
    }
}

/// Start the work the column asked for. Results arrive as query events.
fn dispatch(tui_app: &mut TuiApp, ctx: &Arc<AppContext>, sender: &UnboundedSender<QueryEvent>) {
    for command in tui_app.column.take_commands() {
        let sender = sender.clone();
        match command {
            ColumnCommand::LoadPage(request) => {
                let source = StorePageSource::new(ctx.store.clone());
                tokio::spawn(async move {
                    let event = run_request(&source, request).await;
                    let _ = sender.send(event);
                });
            }
            ColumnCommand::Translate(TranslateRequest {
                generation,
                entry_id,
                text,
                language,
            }) => {
                let Some(translator) = ctx.translator.clone() else {
                    continue;
                };
                tokio::spawn(async move {
                    let result = translator.translate(&text, &language).await;
                    let _ = sender.send(QueryEvent::Translated {
                        generation,
                        entry_id,
                        language,
                        result,
                    });
                });
            }
            ColumnCommand::RefreshFeed {
                generation,
                feed_id,
            } => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let result = match ctx.store.get_feed(feed_id) {
                        Ok(Some(feed)) => {
                            refresh_feed(ctx.fetcher.as_ref(), &feed, ctx.store.as_ref(), &ctx.normalizer)
                                .await
                        }
                        Ok(None) => Err(crate::app::RillError::FeedNotFound(feed_id.to_string())),
                        Err(e) => Err(e),
                    };
                    let _ = sender.send(QueryEvent::FeedRefreshed {
                        generation,
                        feed_id,
                        result,
                    });
                });
            }
        }
    }
}

fn spawn_update_all(ctx: &Arc<AppContext>, sender: &UnboundedSender<QueryEvent>) {
    let ctx = ctx.clone();
    let sender = sender.clone();
    tokio::spawn(async move {
        let feeds = match ctx.store.get_all_feeds() {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!("could not list feeds: {}", e);
                Vec::new()
            }
        };
        let results = ctx
            .parallel_fetcher
            .fetch_all(feeds, ctx.store.clone(), &ctx.normalizer)
            .await;

        let mut new_entries = 0;
        let mut failed = 0;
        let mut offline = 0;
        for (feed_id, result) in &results {
            match result {
                Ok(count) => new_entries += count,
                Err(e) => {
                    warn!("feed {} failed: {}", feed_id, e);
                    failed += 1;
                    if e.is_offline() {
                        offline += 1;
                    }
                }
            }
        }
        let _ = sender.send(QueryEvent::FeedsUpdated {
            new_entries,
            failed,
            offline: failed > 0 && offline == failed,
        });
    });
}

fn load_feeds(tui_app: &mut TuiApp, ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;
    let mut unread_counts = HashMap::new();
    for feed in &feeds {
        unread_counts.insert(feed.id, ctx.store.get_unread_count(feed.id)?);
    }
    tui_app.set_feeds(feeds, unread_counts);
    Ok(())
}

/// Starting context from the command line.
pub fn initial_context(
    feed: Option<FeedSelector>,
    view: Option<ViewType>,
    unread_only: bool,
) -> ListContext {
    ListContext::new(
        feed.unwrap_or_default(),
        view.unwrap_or_default(),
        unread_only,
    )
}
