//! Clock update classification
//!
//! Decides whether a new playback position continues smoothly from the last
//! one or requires resetting animation state.

/// Largest jump still treated as normal playback (exclusive)
pub const SEEK_THRESHOLD_MS: f64 = 500.0;

/// Position value hosts send when playback stops
pub const STOP_SENTINEL_MS: f64 = -1.0;

/// What a raw clock value means
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockSignal {
    Position(f64),
    Stop,
    /// NaN or infinite
    Invalid,
}

impl ClockSignal {
    pub fn from_raw(time_ms: f64) -> Self {
        if time_ms == STOP_SENTINEL_MS {
            Self::Stop
        } else if time_ms.is_finite() {
            Self::Position(time_ms)
        } else {
            Self::Invalid
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    Continuous,
    /// The active line set differs from the previous update
    LinesChanged,
    /// Same lines, but the position moved by more than the seek threshold
    Jump,
}

impl Continuity {
    pub fn is_discontinuity(self) -> bool {
        self != Self::Continuous
    }
}

/// Classify a transition between two positions
///
/// Line sets compare in order, so a reordered set counts as a change.
pub fn classify(
    previous_time_ms: f64,
    previous_active: &[usize],
    time_ms: f64,
    active: &[usize],
) -> Continuity {
    if previous_active != active {
        Continuity::LinesChanged
    } else if (time_ms - previous_time_ms).abs() > SEEK_THRESHOLD_MS {
        Continuity::Jump
    } else {
        Continuity::Continuous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_signal() {
        assert_eq!(ClockSignal::from_raw(-1.0), ClockSignal::Stop);
        assert_eq!(ClockSignal::from_raw(1200.0), ClockSignal::Position(1200.0));
        assert_eq!(ClockSignal::from_raw(0.0), ClockSignal::Position(0.0));
        assert_eq!(ClockSignal::from_raw(f64::NAN), ClockSignal::Invalid);
        assert_eq!(ClockSignal::from_raw(f64::INFINITY), ClockSignal::Invalid);
        assert_eq!(ClockSignal::from_raw(-0.5), ClockSignal::Position(-0.5));
        assert_eq!(ClockSignal::from_raw(-2.0), ClockSignal::Position(-2.0));
    }

    #[test]
    fn test_small_step_same_lines_is_continuous() {
        assert_eq!(classify(1000.0, &[2], 1250.0, &[2]), Continuity::Continuous);
        assert_eq!(classify(1000.0, &[2], 1500.0, &[2]), Continuity::Continuous);
        assert_eq!(classify(1000.0, &[], 1100.0, &[]), Continuity::Continuous);
    }

    #[test]
    fn test_jump_beyond_threshold() {
        assert_eq!(classify(1000.0, &[2], 1500.5, &[2]), Continuity::Jump);
        assert_eq!(classify(5000.0, &[2], 1000.0, &[2]), Continuity::Jump);
    }

    #[test]
    fn test_line_change_wins() {
        assert_eq!(classify(1000.0, &[2], 1010.0, &[2, 3]), Continuity::LinesChanged);
        assert_eq!(classify(1000.0, &[2], 9000.0, &[5]), Continuity::LinesChanged);
        assert_eq!(classify(1000.0, &[2, 3], 1010.0, &[3, 2]), Continuity::LinesChanged);
        assert!(Continuity::LinesChanged.is_discontinuity());
        assert!(!Continuity::Continuous.is_discontinuity());
    }
}
