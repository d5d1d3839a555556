//! Instrumental gap detection
//!
//! A gap is a stretch of silence before the first line or between two
//! consecutive lines that is long enough to show an indicator for. Shorter
//! pauses are ignored so ordinary breaths do not flicker the indicator.

use serde::Serialize;

use crate::features::lyrics::types::LyricDocument;

/// Minimum silence that counts as an instrumental gap (inclusive)
pub const GAP_THRESHOLD_MS: u64 = 3000;

/// A silence long enough to show the "no lyrics right now" indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentalGap {
    /// The indicator is placed before this line
    pub insert_before: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl InstrumentalGap {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// How far through the gap `time_ms` is, in [0, 1]
    pub fn progress(&self, time_ms: f64) -> f64 {
        let duration = self.duration_ms() as f64;
        if duration <= 0.0 || !time_ms.is_finite() {
            return 0.0;
        }
        ((time_ms - self.start_ms as f64) / duration).clamp(0.0, 1.0)
    }
}

/// Find the gap containing `time_ms`, if any; the first match wins
pub fn find_gap(document: &LyricDocument, time_ms: f64) -> Option<InstrumentalGap> {
    let lines = document.lines();
    let first = lines.first()?;

    if time_ms < first.start_ms as f64 && first.start_ms >= GAP_THRESHOLD_MS {
        return Some(InstrumentalGap {
            insert_before: 0,
            start_ms: 0,
            end_ms: first.start_ms,
        });
    }

    lines.windows(2).enumerate().find_map(|(i, pair)| {
        let (current, next) = (&pair[0], &pair[1]);
        let silence = next.start_ms.saturating_sub(current.end_ms);
        let inside = time_ms > current.end_ms as f64 && time_ms < next.start_ms as f64;
        (inside && silence >= GAP_THRESHOLD_MS).then_some(InstrumentalGap {
            insert_before: i + 1,
            start_ms: current.end_ms,
            end_ms: next.start_ms,
        })
    })
}
