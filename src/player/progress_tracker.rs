use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Rate limit for time-update processing.
///
/// The first update always passes; after that at most one per interval.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    interval: Duration,
    last_processed: Option<Instant>,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_processed: None,
        }
    }

    pub fn should_process(&mut self) -> bool {
        self.should_process_at(Instant::now())
    }

    pub fn should_process_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_processed
            && now.saturating_duration_since(last) < self.interval
        {
            trace!("Time update throttled");
            return false;
        }
        self.last_processed = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_processed = None;
    }
}

/// Position to resume from when playback starts.
///
/// Only a fresh start (position exactly zero) with a saved position seeks.
pub fn resume_position(saved_seconds: u64, current_time: f64) -> Option<f64> {
    (saved_seconds > 0 && current_time == 0.0).then_some(saved_seconds as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_throttle_interval() {
        let mut tracker = ProgressTracker::new(Duration::from_millis(2500));

        assert!(tracker.should_process());
        assert!(!tracker.should_process());

        tokio::time::advance(Duration::from_millis(2499)).await;
        assert!(!tracker.should_process());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(tracker.should_process());
        assert!(!tracker.should_process());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_lets_next_update_through() {
        let mut tracker = ProgressTracker::new(Duration::from_millis(2500));
        assert!(tracker.should_process());

        tracker.reset();
        assert!(tracker.should_process());
    }

    #[test]
    fn test_resume_position() {
        assert_eq!(resume_position(120, 0.0), Some(120.0));
        assert_eq!(resume_position(120, 0.5), None);
        assert_eq!(resume_position(0, 0.0), None);
    }
}
