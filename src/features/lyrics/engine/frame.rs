//! Frame scheduling
//!
//! The engine never owns a timer. It hands out a token when it wants the
//! next frame, and a host (the [`FrameDriver`](super::FrameDriver) or a UI
//! toolkit's redraw callback) passes the token back with the frame time.
//! At most one token is outstanding; cancelling makes any in-flight
//! callback a no-op.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl fmt::Display for FrameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    pending: Option<FrameToken>,
    next_id: u64,
}

impl FrameLoop {
    /// Request a frame, replacing any pending request
    pub fn request(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.pending = Some(token);
        token
    }

    /// Drop the pending request; returns whether there was one
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Consume `token` if it is the pending one; stale tokens return false
    pub fn take(&mut self, token: FrameToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

/// Monotonic wall clock in milliseconds
pub trait FrameClock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Milliseconds since construction, on tokio's clock so paused-time tests work
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
