//! Lyrics synchronization engine
//!
//! Maps a loosely cooperative media clock onto line and syllable highlight
//! state, and keeps that state animating smoothly between clock updates.
//!
//! ## Key Components
//!
//! - `SyncEngine`: owns the document and wires everything below together
//! - `resolver`: which lines and syllables contain a given time
//! - `continuity`: seek and line-change detection
//! - `scheduler`: per-line, per-track syllable animation
//! - `gap`: instrumental gap detection
//! - `scroll`: auto-follow with a manual-scroll cool-down
//! - `frame`: frame tokens and the wall clock
//! - `driver`: a tokio task that delivers frames to a shared engine
//!
//! The engine never reads a clock itself. Every entry point that needs wall
//! time takes a `now_ms` argument from the host's monotonic clock.

pub mod continuity;
pub mod driver;
pub mod frame;
pub mod gap;
pub mod granularity;
pub mod resolver;
pub mod scheduler;
pub mod scroll;

pub use continuity::{ClockSignal, Continuity, SEEK_THRESHOLD_MS, STOP_SENTINEL_MS};
pub use driver::{FrameDriver, SharedEngine};
pub use frame::{FrameClock, FrameLoop, FrameToken, MonotonicClock};
pub use gap::{GAP_THRESHOLD_MS, InstrumentalGap, find_gap};
pub use granularity::{Granularity, GranularityPolicy, SampledTimingPolicy};
pub use resolver::{find_active_lines, find_active_syllable};
pub use scheduler::{AnimationScheduler, LineAnimation, Track, TrackAnimation, TrackPhase};
pub use scroll::{SCROLL_COOLDOWN_MS, ScrollIntent, ScrollReason, ScrollTarget};

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Notify;

use super::types::LyricDocument;
use scroll::{ScrollFollower, selection_target};

/// Configuration for the sync engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncEngineConfig {
    /// Animate syllable progress between clock updates
    pub interpolate: bool,
    /// Emit scroll intents that follow playback
    pub auto_scroll: bool,
    pub granularity: SampledTimingPolicy,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            interpolate: true,
            auto_scroll: true,
            granularity: SampledTimingPolicy::default(),
        }
    }
}

/// What a clock update changed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SyncUpdate {
    /// `None` when the update was ignored, stopped playback or had no document
    pub continuity: Option<Continuity>,
    pub stopped: bool,
    pub active_changed: bool,
    pub gap_changed: bool,
    pub scroll: Option<ScrollIntent>,
    /// Frame the host should deliver to [`SyncEngine::on_frame`]
    pub frame: Option<FrameToken>,
}

/// Progress of one track of one line
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackState {
    pub syllable_index: Option<usize>,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRenderState {
    pub line_index: usize,
    pub main: TrackState,
    pub background: TrackState,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub time_ms: f64,
    pub active_lines: Vec<usize>,
    pub lines: Vec<LineRenderState>,
    pub gap: Option<InstrumentalGap>,
    pub granularity: Granularity,
}

/// A click on a line, for the host to seek with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineClick {
    pub line_index: usize,
    pub timestamp_ms: u64,
}

/// Lyrics synchronization engine
pub struct SyncEngine {
    config: SyncEngineConfig,
    policy: Box<dyn GranularityPolicy>,
    document: Option<Arc<LyricDocument>>,
    granularity: Granularity,
    current_time_ms: f64,
    active_lines: Vec<usize>,
    gap: Option<InstrumentalGap>,
    scheduler: AnimationScheduler,
    frames: FrameLoop,
    scroll: ScrollFollower,
    waker: Option<Arc<Notify>>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(SyncEngineConfig::default())
    }
}

impl SyncEngine {
    pub fn new(config: SyncEngineConfig) -> Self {
        Self {
            policy: Box::new(config.granularity),
            scroll: ScrollFollower::new(config.auto_scroll),
            config,
            document: None,
            granularity: Granularity::default(),
            current_time_ms: 0.0,
            active_lines: Vec::new(),
            gap: None,
            scheduler: AnimationScheduler::new(),
            frames: FrameLoop::default(),
            waker: None,
        }
    }

    /// Replace the granularity heuristic
    pub fn with_policy(mut self, policy: impl GranularityPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        if let Some(document) = &self.document {
            self.granularity = self.policy.classify(document);
        }
        self
    }

    pub fn config(&self) -> &SyncEngineConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&LyricDocument> {
        self.document.as_deref()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn current_time(&self) -> f64 {
        self.current_time_ms
    }

    pub fn active_lines(&self) -> &[usize] {
        &self.active_lines
    }

    pub fn gap(&self) -> Option<&InstrumentalGap> {
        self.gap.as_ref()
    }

    pub fn animation(&self, line: usize) -> Option<&LineAnimation> {
        self.scheduler.line(line)
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.frames.pending()
    }

    pub fn wants_more_ticks(&self) -> bool {
        self.frames.pending().is_some()
    }

    /// Whether a frame or the scroll cool-down still needs polling
    pub fn needs_polling(&self) -> bool {
        self.wants_more_ticks() || self.scroll.cooldown_pending()
    }

    /// Notified whenever the engine goes from idle to needing polls
    pub fn set_waker(&mut self, waker: Arc<Notify>) {
        self.waker = Some(waker);
    }

    fn wake(&self) {
        if let Some(waker) = &self.waker {
            waker.notify_one();
        }
    }

    /// Swap the document, or clear it with `None`
    ///
    /// Any pending frame is cancelled first so no tick ever runs against a
    /// mix of old and new state. The new document is resolved at the current
    /// clock position straight away.
    pub fn set_document(&mut self, document: Option<LyricDocument>, now_ms: f64) -> SyncUpdate {
        self.frames.cancel();
        self.scheduler.clear();
        self.active_lines.clear();
        self.gap = None;
        let reset = self.scroll.reset();

        self.document = document.filter(|d| !d.is_empty()).map(Arc::new);
        self.granularity = match &self.document {
            Some(document) => self.policy.classify(document),
            None => Granularity::default(),
        };
        tracing::debug!(
            "Lyrics document set: {} lines, {:?}",
            self.document.as_ref().map_or(0, |d| d.len()),
            self.granularity
        );

        let mut update = self.apply_position(self.current_time_ms, now_ms, true);
        update.scroll = update.scroll.or(Some(reset));
        update
    }

    /// Feed a media clock position in milliseconds
    ///
    /// `-1` stops playback; NaN and infinities are ignored.
    pub fn set_current_time(&mut self, time_ms: f64, now_ms: f64) -> SyncUpdate {
        match ClockSignal::from_raw(time_ms) {
            ClockSignal::Stop => self.stop(),
            ClockSignal::Invalid => {
                tracing::warn!("Ignoring non-finite clock value {}", time_ms);
                SyncUpdate::default()
            }
            ClockSignal::Position(time_ms) => self.apply_position(time_ms, now_ms, false),
        }
    }

    fn apply_position(&mut self, time_ms: f64, now_ms: f64, force_resync: bool) -> SyncUpdate {
        let previous_time = self.current_time_ms;
        self.current_time_ms = time_ms;

        let Some(document) = self.document.clone() else {
            return SyncUpdate::default();
        };

        let active = find_active_lines(&document, time_ms);
        let continuity = continuity::classify(previous_time, &self.active_lines, time_ms, &active);
        let active_changed = active != self.active_lines;
        self.active_lines = active;

        if force_resync || continuity.is_discontinuity() || !self.config.interpolate {
            if continuity == Continuity::Jump {
                tracing::debug!("Seek {:.0} -> {:.0} ms", previous_time, time_ms);
            }
            self.resync(&document, time_ms, now_ms);
        } else if self.scheduler.resume_idle(&document, time_ms, now_ms) {
            self.arm_frame();
        }

        let gap = find_gap(&document, time_ms);
        let gap_changed = gap != self.gap;
        self.gap = gap;

        let scroll = if active_changed || gap_changed {
            let target = selection_target(&self.active_lines, self.gap.as_ref());
            self.scroll.on_selection_changed(target, now_ms)
        } else {
            None
        };

        SyncUpdate {
            continuity: Some(continuity),
            stopped: false,
            active_changed,
            gap_changed,
            scroll,
            frame: self.frames.pending(),
        }
    }

    fn resync(&mut self, document: &LyricDocument, time_ms: f64, now_ms: f64) {
        self.frames.cancel();
        self.scheduler
            .start_from_lines(document, &self.active_lines, time_ms, now_ms);
        if self.config.interpolate {
            self.arm_frame();
        }
    }

    fn arm_frame(&mut self) {
        if self.frames.pending().is_none() && self.scheduler.wants_more_ticks() {
            let token = self.frames.request();
            tracing::trace!("Armed {}", token);
            self.wake();
        }
    }

    /// Deliver a frame; returns whether another frame is wanted
    ///
    /// Tokens that were cancelled or superseded are ignored.
    pub fn on_frame(&mut self, token: FrameToken, now_ms: f64) -> bool {
        if !self.frames.take(token) {
            tracing::trace!("Dropping stale {}", token);
            return false;
        }
        let Some(document) = self.document.clone() else {
            return false;
        };
        if self.scheduler.tick(&document, now_ms) {
            self.frames.request();
            self.wake();
            true
        } else {
            false
        }
    }

    /// Clear all playback state, as if nothing had played yet
    pub fn stop(&mut self) -> SyncUpdate {
        self.frames.cancel();
        self.scheduler.clear();
        let active_changed = !self.active_lines.is_empty();
        self.active_lines.clear();
        let gap_changed = self.gap.take().is_some();
        self.current_time_ms = 0.0;
        tracing::debug!("Playback stopped, lyric state cleared");
        SyncUpdate {
            continuity: None,
            stopped: true,
            active_changed,
            gap_changed,
            scroll: Some(self.scroll.reset()),
            frame: None,
        }
    }

    /// Toggle interpolation; the current position is re-resolved either way
    pub fn set_interpolate(&mut self, interpolate: bool, now_ms: f64) {
        if self.config.interpolate == interpolate {
            return;
        }
        self.config.interpolate = interpolate;
        if let Some(document) = self.document.clone() {
            self.resync(&document, self.current_time_ms, now_ms);
        }
    }

    pub fn set_auto_scroll(&mut self, enabled: bool, now_ms: f64) -> Option<ScrollIntent> {
        self.config.auto_scroll = enabled;
        self.scroll.set_auto_follow(enabled, now_ms)
    }

    /// A scroll event reported by the view
    pub fn on_user_scroll(&mut self, now_ms: f64) {
        self.scroll.on_scroll_event(now_ms);
        if self.scroll.cooldown_pending() {
            self.wake();
        }
    }

    /// Bracket a scroll the host performs on the engine's behalf
    pub fn begin_programmatic_scroll(&mut self) {
        self.scroll.begin_programmatic();
    }

    pub fn end_programmatic_scroll(&mut self) {
        self.scroll.end_programmatic();
    }

    /// Check the manual-scroll cool-down
    pub fn poll_scroll(&mut self, now_ms: f64) -> Option<ScrollIntent> {
        self.scroll.poll(now_ms)
    }

    pub fn click_line(&self, index: usize) -> Option<LineClick> {
        let line = self.document.as_ref()?.line(index)?;
        Some(LineClick {
            line_index: index,
            timestamp_ms: line.start_ms,
        })
    }

    /// Current track state of a line; zeroed for inactive lines
    pub fn track_state(&self, line: usize, track: Track) -> TrackState {
        let Some(animation) = self.scheduler.line(line) else {
            return TrackState::default();
        };
        let state = animation.track(track);
        let progress = match state.syllable_index {
            Some(_) if !self.config.interpolate => 1.0,
            Some(_) => state.progress,
            None => 0.0,
        };
        TrackState {
            syllable_index: state.syllable_index,
            progress: clamp_unit(progress),
        }
    }

    /// Fill level of one syllable in [0, 1]
    pub fn syllable_progress(&self, line: usize, track: Track, syllable: usize) -> f64 {
        if self.scheduler.line(line).is_none() {
            return 0.0;
        }
        let Some(target) = self
            .document
            .as_ref()
            .and_then(|d| d.line(line))
            .and_then(|l| track.syllables(l).get(syllable))
        else {
            return 0.0;
        };

        let state = self.track_state(line, track);
        match state.syllable_index {
            Some(active) if syllable < active => 1.0,
            Some(active) if syllable == active => state.progress,
            Some(_) => 0.0,
            None if self.current_time_ms > target.end_ms as f64 => 1.0,
            None => 0.0,
        }
    }

    pub fn snapshot(&self) -> RenderState {
        let lines = self
            .scheduler
            .active()
            .map(|(line_index, _)| LineRenderState {
                line_index,
                main: self.track_state(line_index, Track::Main),
                background: self.track_state(line_index, Track::Background),
            })
            .collect();
        RenderState {
            time_ms: self.current_time_ms,
            active_lines: self.active_lines.clone(),
            lines,
            gap: self.gap,
            granularity: self.granularity,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
