//! Per-line syllable animation
//!
//! Each active line runs two independent tracks (main and background
//! vocals). A track animates one syllable window at a time against wall
//! time, then hands over to the next syllable by shifting its window start
//! by the difference in syllable start times. The media clock is only
//! consulted when a track is (re)seeded; between seeds progress is pure
//! wall-clock extrapolation.

use serde::Serialize;

use super::resolver::{find_active_lines, find_active_syllable};
use crate::features::lyrics::types::{LyricDocument, LyricLine, Syllable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Main,
    Background,
}

impl Track {
    pub fn syllables(self, line: &LyricLine) -> &[Syllable] {
        match self {
            Self::Main => &line.main_syllables,
            Self::Background => &line.background_syllables,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackPhase {
    /// No syllable has been seeded yet
    #[default]
    Idle,
    Running,
    /// Past the last syllable
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackAnimation {
    pub syllable_index: Option<usize>,
    /// Wall time at which the current syllable started
    pub window_start_ms: f64,
    pub window_duration_ms: f64,
    pub progress: f64,
    pub phase: TrackPhase,
}

fn window_progress(now_ms: f64, window_start_ms: f64, duration_ms: f64) -> f64 {
    let elapsed = now_ms - window_start_ms;
    if !elapsed.is_finite() || elapsed < 0.0 {
        0.0
    } else if duration_ms <= 0.0 {
        1.0
    } else {
        (elapsed / duration_ms).min(1.0)
    }
}

impl TrackAnimation {
    /// Seed from the media position; idle when no syllable is active
    pub fn seed(syllables: &[Syllable], time_ms: f64, now_ms: f64) -> Self {
        let Some(index) = find_active_syllable(syllables, time_ms) else {
            return Self::default();
        };
        let syllable = &syllables[index];
        let window_start_ms = now_ms - (time_ms - syllable.start_ms as f64);
        let window_duration_ms = syllable.duration_ms() as f64;
        Self {
            syllable_index: Some(index),
            window_start_ms,
            window_duration_ms,
            progress: window_progress(now_ms, window_start_ms, window_duration_ms),
            phase: TrackPhase::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == TrackPhase::Running
    }

    /// Advance to `now_ms`; returns whether the track wants more frames
    pub fn tick(&mut self, syllables: &[Syllable], now_ms: f64) -> bool {
        if !self.is_running() {
            return false;
        }
        loop {
            let Some(index) = self.syllable_index else {
                self.phase = TrackPhase::Idle;
                return false;
            };
            self.progress = window_progress(now_ms, self.window_start_ms, self.window_duration_ms);
            if self.progress < 1.0 {
                return true;
            }

            match (syllables.get(index), syllables.get(index + 1)) {
                (Some(current), Some(next)) => {
                    self.syllable_index = Some(index + 1);
                    self.window_start_ms += next.start_ms as f64 - current.start_ms as f64;
                    self.window_duration_ms = next.duration_ms() as f64;
                }
                _ => {
                    self.phase = TrackPhase::Exhausted;
                    self.window_duration_ms = 0.0;
                    self.progress = 1.0;
                    return false;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineAnimation {
    pub main: TrackAnimation,
    pub background: TrackAnimation,
}

impl LineAnimation {
    pub fn seed(line: &LyricLine, time_ms: f64, now_ms: f64) -> Self {
        Self {
            main: TrackAnimation::seed(&line.main_syllables, time_ms, now_ms),
            background: TrackAnimation::seed(&line.background_syllables, time_ms, now_ms),
        }
    }

    pub fn track(&self, track: Track) -> &TrackAnimation {
        match track {
            Track::Main => &self.main,
            Track::Background => &self.background,
        }
    }

    fn track_mut(&mut self, track: Track) -> &mut TrackAnimation {
        match track {
            Track::Main => &mut self.main,
            Track::Background => &mut self.background,
        }
    }

    pub fn is_running(&self) -> bool {
        self.main.is_running() || self.background.is_running()
    }
}

const TRACKS: [Track; 2] = [Track::Main, Track::Background];

/// Animation state for every line of the current document
///
/// Only active lines hold state; everything else is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationScheduler {
    lines: Vec<Option<LineAnimation>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Reset and seed every line active at `time_ms`
    pub fn start_from(&mut self, document: &LyricDocument, time_ms: f64, now_ms: f64) {
        let active = find_active_lines(document, time_ms);
        self.start_from_lines(document, &active, time_ms, now_ms);
    }

    /// Reset and seed the given lines, already known to be active
    pub fn start_from_lines(
        &mut self,
        document: &LyricDocument,
        active: &[usize],
        time_ms: f64,
        now_ms: f64,
    ) {
        self.lines.clear();
        self.lines.resize(document.len(), None);
        for &index in active {
            if let Some(line) = document.line(index) {
                self.lines[index] = Some(LineAnimation::seed(line, time_ms, now_ms));
            }
        }
    }

    /// Seed tracks that were idle but now have an active syllable
    ///
    /// Covers lines entered between syllables, and syllables starting after
    /// an inter-word pause. Returns whether anything started running.
    pub fn resume_idle(&mut self, document: &LyricDocument, time_ms: f64, now_ms: f64) -> bool {
        let mut resumed = false;
        for (index, slot) in self.lines.iter_mut().enumerate() {
            let (Some(animation), Some(line)) = (slot.as_mut(), document.line(index)) else {
                continue;
            };
            for track in TRACKS {
                let state = animation.track_mut(track);
                if state.phase != TrackPhase::Idle {
                    continue;
                }
                let seeded = TrackAnimation::seed(track.syllables(line), time_ms, now_ms);
                if seeded.is_running() {
                    *state = seeded;
                    resumed = true;
                }
            }
        }
        resumed
    }

    /// Advance every running track; returns whether any still runs
    pub fn tick(&mut self, document: &LyricDocument, now_ms: f64) -> bool {
        let mut running = false;
        for (index, slot) in self.lines.iter_mut().enumerate() {
            let (Some(animation), Some(line)) = (slot.as_mut(), document.line(index)) else {
                continue;
            };
            running |= animation.main.tick(&line.main_syllables, now_ms);
            running |= animation
                .background
                .tick(&line.background_syllables, now_ms);
        }
        running
    }

    pub fn wants_more_ticks(&self) -> bool {
        self.lines.iter().flatten().any(LineAnimation::is_running)
    }

    pub fn line(&self, index: usize) -> Option<&LineAnimation> {
        self.lines.get(index).and_then(Option::as_ref)
    }

    /// Lines holding animation state, ascending
    pub fn active(&self) -> impl Iterator<Item = (usize, &LineAnimation)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|a| (i, a)))
    }
}
