use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::debug;

/// Terminal events funneled to the main loop, plus a periodic tick that
/// drives redraws so recency markers age without input.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// The terminal was resized to (columns, rows).
    Resize(u16, u16),
    Tick,
}

/// Bridges crossterm's async `EventStream` with the application event loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    // Dropping the handler closes the channel, which ends the task.
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut ticks = tokio::time::interval(tick_rate);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    _ = ticks.tick() => Some(Event::Tick),
                    maybe_event = reader.next() => match maybe_event {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Some(Event::Key(key))
                        }
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Some(Event::Resize(w, h)),
                        Some(Ok(_)) => None,
                        Some(Err(e)) => {
                            debug!(error = %e, "terminal event stream failed");
                            break;
                        }
                        None => break,
                    },
                };

                if let Some(event) = event {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    /// Wait for the next event. Fails once the background task has exited.
    pub async fn next(&mut self) -> anyhow::Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Event channel closed"))
    }
}

/// Timer for automatic reloads, first firing one `period` from now.
///
/// Ticks missed while the loop was busy collapse into one instead of
/// firing back to back.
pub async fn refresh_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    timer.tick().await;
    timer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_timer_skips_missed_ticks() {
        let timer = refresh_timer(Duration::from_secs(300)).await;
        assert_eq!(timer.missed_tick_behavior(), MissedTickBehavior::Skip);
        assert_eq!(timer.period(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn refresh_timer_does_not_fire_at_startup() {
        let mut timer = refresh_timer(Duration::from_secs(300)).await;
        let early = tokio::time::timeout(Duration::from_millis(50), timer.tick()).await;
        assert!(early.is_err());
    }
}
