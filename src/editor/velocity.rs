use std::collections::VecDeque;

use crate::clock::Millis;
use crate::config;

/// Keystroke rate over a sliding window, normalized to `0.0..=1.0`.
///
/// The value only changes when an event is recorded; between keystrokes it
/// holds the last computed rate.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    window_ms: Millis,
    max_events: usize,
    events: VecDeque<Millis>,
    velocity: f32,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new(config::VELOCITY_WINDOW_MS, config::VELOCITY_MAX_EVENTS)
    }
}

impl VelocityTracker {
    pub fn new(window_ms: Millis, max_events: usize) -> Self {
        assert!(max_events > 0, "max_events must be positive");
        Self {
            window_ms,
            max_events,
            events: VecDeque::with_capacity(max_events * 2),
            velocity: 0.0,
        }
    }

    pub fn record_event(&mut self, at: Millis) {
        self.events.push_back(at);
        while let Some(&oldest) = self.events.front() {
            if at - oldest >= self.window_ms {
                self.events.pop_front();
            } else {
                break;
            }
        }
        self.velocity = (self.events.len() as f32 / self.max_events as f32).min(1.0);
    }

    pub fn current_velocity(&self) -> f32 {
        self.velocity
    }

    pub fn events_in_window(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(VelocityTracker::default().current_velocity(), 0.0);
    }

    #[test]
    fn ten_events_in_one_second_saturates() {
        let mut tracker = VelocityTracker::default();
        for i in 0..10 {
            tracker.record_event(1_000 + i * 90);
        }
        assert_eq!(tracker.current_velocity(), 1.0);
    }

    #[test]
    fn burst_beyond_max_stays_clamped() {
        let mut tracker = VelocityTracker::default();
        for i in 0..40 {
            tracker.record_event(5_000 + i * 10);
        }
        assert_eq!(tracker.current_velocity(), 1.0);
    }

    #[test]
    fn old_events_leave_the_window() {
        let mut tracker = VelocityTracker::default();
        tracker.record_event(0);
        tracker.record_event(1_500);
        assert_eq!(tracker.events_in_window(), 1);
        assert!((tracker.current_velocity() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn window_edge_is_exclusive() {
        let mut tracker = VelocityTracker::default();
        tracker.record_event(0);
        tracker.record_event(1_000);
        assert_eq!(tracker.events_in_window(), 1);
        tracker.record_event(1_999);
        assert_eq!(tracker.events_in_window(), 2);
    }

    #[test]
    fn holds_value_between_events() {
        let mut tracker = VelocityTracker::default();
        tracker.record_event(0);
        tracker.record_event(100);
        let before = tracker.current_velocity();
        // no decay without a new event
        assert_eq!(tracker.current_velocity(), before);
        assert!(before > 0.0 && before <= 1.0);
    }
}
