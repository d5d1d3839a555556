//! Tokio frame transport
//!
//! Hosts without their own redraw loop can hand a shared engine to a
//! `FrameDriver`, which delivers pending frames at a fixed interval and
//! forwards cool-down scroll intents over a channel. While the engine has
//! no pending frame and no cool-down running, the driver parks until the
//! engine wakes it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SyncEngine;
use super::frame::FrameClock;
use super::scroll::ScrollIntent;

/// Engine shared between the host and the driver task
pub type SharedEngine = Arc<Mutex<SyncEngine>>;

/// Background task ticking a shared engine; aborted on drop
#[derive(Debug)]
pub struct FrameDriver {
    handle: JoinHandle<()>,
}

impl FrameDriver {
    /// Spawn on the current tokio runtime
    pub fn spawn<C>(
        engine: SharedEngine,
        clock: C,
        interval: Duration,
        intents: mpsc::UnboundedSender<ScrollIntent>,
    ) -> Self
    where
        C: FrameClock + 'static,
    {
        let interval = interval.max(Duration::from_millis(1));
        let waker = Arc::new(Notify::new());
        engine.lock().set_waker(waker.clone());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!("Frame driver started ({:?})", interval);

            loop {
                let now = clock.now_ms();
                let (intent, busy) = {
                    let mut engine = engine.lock();
                    if let Some(token) = engine.pending_frame() {
                        engine.on_frame(token, now);
                    }
                    let intent = engine.poll_scroll(now);
                    (intent, engine.needs_polling())
                };

                if let Some(intent) = intent {
                    if intents.send(intent).is_err() {
                        tracing::debug!("Scroll intent receiver dropped, stopping frame driver");
                        break;
                    }
                }

                if busy {
                    ticker.tick().await;
                } else {
                    tracing::trace!("Frame driver idle");
                    waker.notified().await;
                    ticker.reset();
                }
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
