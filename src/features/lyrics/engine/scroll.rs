//! Auto-scroll follower
//!
//! Tracks which row the view should keep centered and whether the user has
//! taken over scrolling. The engine emits intents; the host performs the
//! scroll and brackets it with `begin_programmatic`/`end_programmatic` so the
//! resulting scroll events are not mistaken for user input.

use serde::Serialize;

use super::gap::InstrumentalGap;

/// How long auto-follow stays suspended after a manual scroll
pub const SCROLL_COOLDOWN_MS: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum ScrollTarget {
    Line(usize),
    /// The gap indicator, which sits before this line
    GapBefore(usize),
    /// Back to the beginning of the view
    Top,
}

impl ScrollTarget {
    /// Row index to center on
    pub fn line_index(self) -> usize {
        match self {
            Self::Line(i) | Self::GapBefore(i) => i,
            Self::Top => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollReason {
    /// Playback moved to a new row
    Follow,
    /// Auto-follow came back after the user's cool-down expired
    Resume,
    /// Playback stopped or the document changed
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollIntent {
    pub target: ScrollTarget,
    pub reason: ScrollReason,
}

/// Where the view should be centered: the lowest active line, else the gap
pub fn selection_target(active: &[usize], gap: Option<&InstrumentalGap>) -> Option<ScrollTarget> {
    active
        .iter()
        .min()
        .map(|&i| ScrollTarget::Line(i))
        .or_else(|| gap.map(|g| ScrollTarget::GapBefore(g.insert_before)))
}

#[derive(Debug, Clone)]
pub struct ScrollFollower {
    auto_follow: bool,
    last_manual_ms: Option<f64>,
    programmatic: bool,
    target: Option<ScrollTarget>,
}

impl Default for ScrollFollower {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ScrollFollower {
    pub fn new(auto_follow: bool) -> Self {
        Self {
            auto_follow,
            last_manual_ms: None,
            programmatic: false,
            target: None,
        }
    }

    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    pub fn target(&self) -> Option<ScrollTarget> {
        self.target
    }

    /// Whether a manual scroll is still holding off auto-follow
    pub fn is_suppressed(&self, now_ms: f64) -> bool {
        self.last_manual_ms
            .is_some_and(|last| now_ms - last < SCROLL_COOLDOWN_MS)
    }

    /// Whether a manual scroll is waiting for [`poll`](Self::poll) to clear it
    pub fn cooldown_pending(&self) -> bool {
        self.last_manual_ms.is_some()
    }

    /// Record a new selection; returns the scroll to perform, if allowed
    pub fn on_selection_changed(
        &mut self,
        target: Option<ScrollTarget>,
        now_ms: f64,
    ) -> Option<ScrollIntent> {
        self.target = target;
        if !self.auto_follow || self.is_suppressed(now_ms) {
            return None;
        }
        target.map(|target| ScrollIntent {
            target,
            reason: ScrollReason::Follow,
        })
    }

    /// A scroll event from the view
    pub fn on_scroll_event(&mut self, now_ms: f64) {
        if self.programmatic {
            return;
        }
        tracing::debug!("Manual scroll, auto-follow paused");
        self.last_manual_ms = Some(now_ms);
    }

    pub fn begin_programmatic(&mut self) {
        self.programmatic = true;
    }

    pub fn end_programmatic(&mut self) {
        self.programmatic = false;
    }

    /// Re-center once the cool-down has run out
    pub fn poll(&mut self, now_ms: f64) -> Option<ScrollIntent> {
        let last = self.last_manual_ms?;
        if now_ms - last < SCROLL_COOLDOWN_MS {
            return None;
        }
        self.last_manual_ms = None;
        if !self.auto_follow {
            return None;
        }
        self.target.map(|target| ScrollIntent {
            target,
            reason: ScrollReason::Resume,
        })
    }

    /// Enabling auto-follow re-centers on the current selection
    pub fn set_auto_follow(&mut self, enabled: bool, now_ms: f64) -> Option<ScrollIntent> {
        let was = self.auto_follow;
        self.auto_follow = enabled;
        if !enabled || was || self.is_suppressed(now_ms) {
            return None;
        }
        self.target.map(|target| ScrollIntent {
            target,
            reason: ScrollReason::Follow,
        })
    }

    pub fn reset(&mut self) -> ScrollIntent {
        self.target = None;
        self.last_manual_ms = None;
        ScrollIntent {
            target: ScrollTarget::Top,
            reason: ScrollReason::Reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_prefers_lowest_active_line() {
        let gap = InstrumentalGap {
            insert_before: 4,
            start_ms: 0,
            end_ms: 5000,
        };
        assert_eq!(selection_target(&[3, 2], Some(&gap)), Some(ScrollTarget::Line(2)));
        assert_eq!(selection_target(&[], Some(&gap)), Some(ScrollTarget::GapBefore(4)));
        assert_eq!(selection_target(&[], None), None);
    }

    #[test]
    fn test_follow_until_manual_scroll() {
        let mut follower = ScrollFollower::default();
        let intent = follower.on_selection_changed(Some(ScrollTarget::Line(1)), 0.0);
        assert_eq!(intent.map(|i| i.reason), Some(ScrollReason::Follow));

        follower.on_scroll_event(100.0);
        assert!(follower.on_selection_changed(Some(ScrollTarget::Line(2)), 1000.0).is_none());
        assert!(follower.poll(2099.0).is_none());

        let resumed = follower.poll(2100.0).unwrap();
        assert_eq!(resumed.target, ScrollTarget::Line(2));
        assert_eq!(resumed.reason, ScrollReason::Resume);
        assert!(follower.poll(3000.0).is_none());
        assert!(follower.on_selection_changed(Some(ScrollTarget::Line(3)), 3000.0).is_some());
    }

    #[test]
    fn test_repeated_manual_scroll_extends_cooldown() {
        let mut follower = ScrollFollower::default();
        follower.on_selection_changed(Some(ScrollTarget::Line(0)), 0.0);
        follower.on_scroll_event(0.0);
        follower.on_scroll_event(1500.0);
        assert!(follower.poll(2500.0).is_none());
        assert!(follower.poll(3500.0).is_some());
    }

    #[test]
    fn test_programmatic_scroll_ignored() {
        let mut follower = ScrollFollower::default();
        follower.begin_programmatic();
        follower.on_scroll_event(0.0);
        follower.end_programmatic();
        assert!(!follower.is_suppressed(10.0));
        assert!(follower.on_selection_changed(Some(ScrollTarget::Line(1)), 10.0).is_some());
    }

    #[test]
    fn test_disabled_follow_emits_nothing() {
        let mut follower = ScrollFollower::new(false);
        assert!(follower.on_selection_changed(Some(ScrollTarget::Line(1)), 0.0).is_none());
        let intent = follower.set_auto_follow(true, 10.0).unwrap();
        assert_eq!(intent.target, ScrollTarget::Line(1));
        assert!(follower.set_auto_follow(true, 20.0).is_none());
    }

    #[test]
    fn test_reset_goes_to_top() {
        let mut follower = ScrollFollower::default();
        follower.on_selection_changed(Some(ScrollTarget::Line(5)), 0.0);
        follower.on_scroll_event(10.0);
        let intent = follower.reset();
        assert_eq!(intent.target, ScrollTarget::Top);
        assert_eq!(intent.target.line_index(), 0);
        assert!(follower.target().is_none());
        assert!(!follower.is_suppressed(20.0));
    }
}
