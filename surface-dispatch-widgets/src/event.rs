//! Terminal events and the crossterm poller

use std::time::Duration;

use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Raw event from crossterm before processing
#[derive(Debug)]
pub enum RawEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// An event as seen by a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Keyboard event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Periodic tick
    Tick,
}

impl EventKind {
    /// `Esc`, `Ctrl+C` or `Ctrl+Q`. Plain letters never quit, since a
    /// focused text field needs them.
    pub fn is_quit(&self) -> bool {
        match self {
            EventKind::Key(key) => {
                matches!(key.code, KeyCode::Esc)
                    || (key.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')))
            }
            _ => false,
        }
    }
}

/// Spawn the event polling task with cancellation support
///
/// Polls crossterm for key presses and resizes and forwards them through
/// `tx`. Release and repeat key events are dropped.
pub fn spawn_event_poller(
    tx: mpsc::UnboundedSender<RawEvent>,
    poll_timeout: Duration,
    loop_sleep: Duration,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        const MAX_EVENTS_PER_BATCH: usize = 20;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Event poller cancelled, draining buffer");
                    while event::poll(Duration::ZERO).unwrap_or(false) {
                        let _ = event::read();
                    }
                    break;
                }
                _ = tokio::time::sleep(loop_sleep) => {
                    let mut events_processed = 0;
                    while events_processed < MAX_EVENTS_PER_BATCH
                        && event::poll(poll_timeout).unwrap_or(false)
                    {
                        events_processed += 1;
                        let raw = match event::read() {
                            Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => {
                                Some(RawEvent::Key(key))
                            }
                            Ok(event::Event::Resize(w, h)) => Some(RawEvent::Resize(w, h)),
                            _ => None,
                        };
                        if let Some(raw) = raw {
                            if tx.send(raw).is_err() {
                                debug!("Event channel closed, stopping poller");
                                return;
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Process a raw event into an EventKind
pub fn process_raw_event(raw: RawEvent) -> EventKind {
    match raw {
        RawEvent::Key(key) => EventKind::Key(key),
        RawEvent::Resize(w, h) => EventKind::Resize(w, h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::key;

    #[test]
    fn test_quit_keys() {
        assert!(EventKind::Key(key("esc")).is_quit());
        assert!(EventKind::Key(key("ctrl+c")).is_quit());
        assert!(EventKind::Key(key("ctrl+q")).is_quit());
        assert!(!EventKind::Key(key("q")).is_quit());
        assert!(!EventKind::Key(key("enter")).is_quit());
        assert!(!EventKind::Tick.is_quit());
    }

    #[test]
    fn test_process_raw_event() {
        assert_eq!(process_raw_event(RawEvent::Resize(80, 24)), EventKind::Resize(80, 24));
        assert_eq!(
            process_raw_event(RawEvent::Key(key("tab"))),
            EventKind::Key(key("tab"))
        );
    }
}
