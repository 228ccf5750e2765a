use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::app::Result;
use crate::query::QueryEvent;

pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    /// A background request finished.
    Query(QueryEvent),
}

/// Merges terminal input with results sent back by spawned tasks.
pub struct EventHandler {
    tick_rate: Duration,
    sender: UnboundedSender<QueryEvent>,
    receiver: UnboundedReceiver<QueryEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            tick_rate,
            sender,
            receiver,
        }
    }

    pub fn sender(&self) -> UnboundedSender<QueryEvent> {
        self.sender.clone()
    }

    /// Finished requests come first so results are never starved by input.
    pub fn next(&mut self) -> Result<AppEvent> {
        match self.receiver.try_recv() {
            Ok(event) => return Ok(AppEvent::Query(event)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        if event::poll(self.tick_rate)? {
            return Ok(match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Event::Mouse(mouse) => AppEvent::Mouse(mouse),
                Event::Resize(_, _) => AppEvent::Resize,
                _ => AppEvent::Tick,
            });
        }
        Ok(AppEvent::Tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    NextPane,
    PrevPane,
    Select,
    ClearSelection,
    ToggleRead,
    ToggleStar,
    OpenInBrowser,
    /// Refresh the current list, or resync the feed if the user owns it.
    Refresh,
    /// Fetch every subscribed feed.
    UpdateAll,
    ToggleUnreadOnly,
    MarkAllRead,
    NextView,
    PrevView,
    Translate,
    ToggleMaximize,
    DeleteFeed,
    None,
}
