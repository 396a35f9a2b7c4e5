use tracing::{debug, info};

use crate::constants::{NEAR_END_MARGIN_SECONDS, WATCHING_THRESHOLD_SECONDS};
use crate::models::{EndingMarker, EpisodeMedia, OpeningInterval};

/// Which overlay affordances should be visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipAdvanceState {
    pub show_skip: bool,
    pub show_next: bool,
}

/// Result of evaluating one time update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyDecision {
    pub state: SkipAdvanceState,
    /// Jump past the opening
    pub seek_to: Option<f64>,
    /// Run the next-episode action
    pub advance: bool,
    /// Conditions hold; callers deduplicate the remote calls
    pub mark_watching: bool,
    pub mark_watched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyThresholds {
    pub watching_threshold: f64,
    pub near_end_margin: f64,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            watching_threshold: WATCHING_THRESHOLD_SECONDS,
            near_end_margin: NEAR_END_MARGIN_SECONDS,
        }
    }
}

/// Opening skip and end-of-episode advance rules.
#[derive(Debug, Clone)]
pub struct SkipAdvancePolicy {
    thresholds: PolicyThresholds,
    opening: Option<OpeningInterval>,
    ending: Option<EndingMarker>,
    duration: f64,
    has_next: bool,
    auto_skip: bool,
    auto_next: bool,
    // Reset on every source load
    has_skipped_opening: bool,
    // Reset on every episode
    advance_triggered: bool,
    state: SkipAdvanceState,
}

impl SkipAdvancePolicy {
    pub fn new(thresholds: PolicyThresholds) -> Self {
        Self {
            thresholds,
            opening: None,
            ending: None,
            duration: 0.0,
            has_next: false,
            auto_skip: false,
            auto_next: false,
            has_skipped_opening: false,
            advance_triggered: false,
            state: SkipAdvanceState::default(),
        }
    }

    pub fn load_episode(&mut self, episode: &EpisodeMedia, has_next: bool) {
        self.opening = episode.opening.filter(|o| o.stop > o.start);
        self.ending = episode.ending;
        self.duration = episode.duration;
        self.has_next = has_next;
        self.has_skipped_opening = false;
        self.advance_triggered = false;
        self.state = SkipAdvanceState::default();
    }

    pub fn set_has_next(&mut self, has_next: bool) {
        self.has_next = has_next;
    }

    pub fn set_auto_skip(&mut self, enabled: bool) {
        self.auto_skip = enabled;
    }

    pub fn set_auto_next(&mut self, enabled: bool) {
        self.auto_next = enabled;
    }

    /// A new source was loaded for the same episode.
    pub fn reset_source(&mut self) {
        self.has_skipped_opening = false;
    }

    pub fn has_skipped_opening(&self) -> bool {
        self.has_skipped_opening
    }

    pub fn state(&self) -> SkipAdvanceState {
        self.state
    }

    pub fn is_near_end(&self, time: f64) -> bool {
        match self.ending {
            Some(ending) => time >= ending.start,
            None => self.duration > 0.0 && time >= self.duration - self.thresholds.near_end_margin,
        }
    }

    pub fn evaluate(&mut self, time: f64) -> PolicyDecision {
        let mut decision = PolicyDecision::default();

        if let Some(opening) = self.opening
            && opening.contains(time)
        {
            if !self.auto_skip {
                decision.state.show_skip = true;
            } else if !self.has_skipped_opening {
                info!("Skipping opening {:.0}s -> {:.0}s", time, opening.stop);
                self.has_skipped_opening = true;
                decision.seek_to = Some(opening.stop);
            }
        }

        if self.is_near_end(time) {
            decision.mark_watched = true;
            if !self.auto_next {
                decision.state.show_next = self.has_next;
            } else if self.has_next && !self.advance_triggered {
                debug!("Near end at {:.0}s, advancing", time);
                self.advance_triggered = true;
                decision.advance = true;
            }
        }

        // Watched also counts the last seconds of the file, even past an ending marker
        if self.duration > 0.0 && time >= self.duration - self.thresholds.near_end_margin {
            decision.mark_watched = true;
        }
        decision.mark_watching = time >= self.thresholds.watching_threshold;
        self.state = decision.state;
        decision
    }

    /// Manual skip. Returns where to seek, if an opening is known.
    pub fn skip_opening(&mut self) -> Option<f64> {
        self.state.show_skip = false;
        self.opening.map(|opening| opening.stop)
    }

    pub fn hide_next(&mut self) {
        self.state.show_next = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::episode_fixture;

    fn policy(auto_skip: bool, auto_next: bool, has_next: bool) -> SkipAdvancePolicy {
        let mut policy = SkipAdvancePolicy::new(PolicyThresholds::default());
        policy.load_episode(&episode_fixture(), has_next);
        policy.set_auto_skip(auto_skip);
        policy.set_auto_next(auto_next);
        policy
    }

    #[test]
    fn test_skip_affordance_without_auto_skip() {
        let mut policy = policy(false, false, true);

        assert!(!policy.evaluate(89.0).state.show_skip);
        let inside = policy.evaluate(90.0);
        assert!(inside.state.show_skip);
        assert_eq!(inside.seek_to, None);
        assert!(!policy.evaluate(180.0).state.show_skip);
    }

    #[test]
    fn test_auto_skip_once_per_load() {
        let mut policy = policy(true, false, true);

        let first = policy.evaluate(100.0);
        assert_eq!(first.seek_to, Some(180.0));
        assert!(!first.state.show_skip);
        assert!(policy.has_skipped_opening());

        // User seeks back into the opening
        assert_eq!(policy.evaluate(120.0).seek_to, None);

        policy.reset_source();
        assert_eq!(policy.evaluate(120.0).seek_to, Some(180.0));
    }

    #[test]
    fn test_near_end_without_ending_marker() {
        let mut episode = episode_fixture();
        episode.ending = None;
        episode.duration = 120.0;
        let mut policy = SkipAdvancePolicy::new(PolicyThresholds::default());
        policy.load_episode(&episode, true);

        assert!(!policy.is_near_end(109.0));
        assert!(policy.is_near_end(110.0));

        episode.duration = 0.0;
        policy.load_episode(&episode, true);
        assert!(!policy.is_near_end(5000.0));
    }

    #[test]
    fn test_near_end_uses_ending_marker() {
        let policy = policy(false, false, true);
        assert!(!policy.is_near_end(1379.0));
        assert!(policy.is_near_end(1380.0));
    }

    #[test]
    fn test_watched_near_file_end_with_early_ending_marker() {
        let mut episode = episode_fixture();
        episode.ending = Some(EndingMarker {
            start: 1500.0,
            stop: None,
        });
        let mut policy = SkipAdvancePolicy::new(PolicyThresholds::default());
        policy.load_episode(&episode, true);

        let decision = policy.evaluate(1395.0);
        assert!(decision.mark_watched);
        assert!(!decision.state.show_next);
    }

    #[test]
    fn test_next_affordance_requires_next_episode() {
        let mut with_next = policy(false, false, true);
        let decision = with_next.evaluate(1385.0);
        assert!(decision.state.show_next);
        assert!(decision.mark_watched);
        assert!(!decision.advance);

        let mut without_next = policy(false, false, false);
        assert!(!without_next.evaluate(1385.0).state.show_next);
    }

    #[test]
    fn test_auto_next_advances_once() {
        let mut policy = policy(false, true, true);

        let first = policy.evaluate(1385.0);
        assert!(first.advance);
        assert!(!first.state.show_next);

        assert!(!policy.evaluate(1388.0).advance);
    }

    #[test]
    fn test_mark_watching_threshold() {
        let mut policy = policy(false, false, true);
        assert!(!policy.evaluate(29.0).mark_watching);
        assert!(policy.evaluate(30.0).mark_watching);
    }

    #[test]
    fn test_manual_skip() {
        let mut policy = policy(false, false, true);
        policy.evaluate(95.0);
        assert_eq!(policy.skip_opening(), Some(180.0));
        assert!(!policy.state().show_skip);
    }
}
