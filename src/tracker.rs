//! Buffering/progress tracker
//!
//! Samples playback position and network-buffer progress on a fixed interval
//! and republishes them for presentation. Polling, not event subscription:
//! buffered ranges and current time are cheap to read, and the interval gate
//! means a host ticking at frame rate still republishes at the configured
//! cadence. Purely observational; never mutates playback state.

use std::time::Duration;

use crate::media::MediaElement;

/// Default republish cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Primary playhead position in seconds
    pub position: f64,
    /// Furthest contiguous buffered range end over duration, `[0, 1]`
    pub buffered_fraction: f64,
}

/// Interval-gated observer of the primary decode path.
pub struct ProgressTracker {
    interval: Duration,
    since_last: Duration,
    /// Buffered fraction is monotone non-decreasing while loading; enforce
    /// it here so jittery range reporting never walks progress backwards.
    last_buffered: f64,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            // Fire on the first poll after creation
            since_last: interval,
            last_buffered: 0.0,
        }
    }

    /// Advance the tracker clock; returns a sample when the interval elapsed.
    pub fn poll(&mut self, dt: Duration, element: &dyn MediaElement) -> Option<Progress> {
        self.since_last += dt;
        if self.since_last < self.interval {
            return None;
        }
        self.since_last = Duration::ZERO;

        let buffered = match element.duration() {
            Some(duration) if duration > 0.0 => {
                (element.buffered_to() / duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };
        self.last_buffered = self.last_buffered.max(buffered);

        Some(Progress {
            position: element.position(),
            buffered_fraction: self.last_buffered,
        })
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaElement, MockElement, MockScript};

    fn loaded_element() -> MockElement {
        let mut element = MockElement::new(MockScript {
            duration: 100.0,
            buffer_chunk_secs: 25.0,
            ..MockScript::default()
        });
        element.load("mock://r");
        element.poll_events();
        element
    }

    #[test]
    fn test_first_poll_fires_immediately() {
        let element = loaded_element();
        let mut tracker = ProgressTracker::default();
        let sample = tracker.poll(Duration::ZERO, &element);
        assert_eq!(
            sample,
            Some(Progress {
                position: 0.0,
                buffered_fraction: 0.0
            })
        );
    }

    #[test]
    fn test_interval_gating() {
        let element = loaded_element();
        let mut tracker = ProgressTracker::new(Duration::from_millis(250));
        tracker.poll(Duration::ZERO, &element);

        assert!(tracker.poll(Duration::from_millis(100), &element).is_none());
        assert!(tracker.poll(Duration::from_millis(100), &element).is_none());
        assert!(tracker.poll(Duration::from_millis(100), &element).is_some());
    }

    #[test]
    fn test_buffered_fraction_from_ranges() {
        let mut element = loaded_element();
        element.tick(Duration::from_millis(100)); // buffers 25s of 100s
        element.poll_events();

        let mut tracker = ProgressTracker::default();
        let sample = tracker.poll(Duration::ZERO, &element).unwrap();
        assert_eq!(sample.buffered_fraction, 0.25);
    }

    #[test]
    fn test_buffered_fraction_monotone() {
        let mut element = loaded_element();
        element.tick(Duration::from_millis(100));
        element.poll_events();

        let mut tracker = ProgressTracker::new(Duration::from_millis(100));
        let first = tracker.poll(Duration::from_millis(100), &element).unwrap();
        assert_eq!(first.buffered_fraction, 0.25);

        // Even if the element reports a smaller range later, the published
        // fraction never decreases
        let mut fresh = MockElement::new(MockScript {
            duration: 100.0,
            buffer_chunk_secs: 5.0,
            ..MockScript::default()
        });
        fresh.load("mock://r");
        fresh.poll_events();
        fresh.tick(Duration::from_millis(100));
        let second = tracker.poll(Duration::from_millis(100), &fresh).unwrap();
        assert_eq!(second.buffered_fraction, 0.25);
    }

    #[test]
    fn test_no_duration_reports_zero() {
        let element = MockElement::new(MockScript::default()); // never loaded
        let mut tracker = ProgressTracker::default();
        let sample = tracker.poll(Duration::ZERO, &element).unwrap();
        assert_eq!(sample.buffered_fraction, 0.0);
    }

    #[test]
    fn test_position_tracks_playback() {
        let mut element = loaded_element();
        element.play().unwrap();
        element.tick(Duration::from_secs(3));
        element.poll_events();

        let mut tracker = ProgressTracker::default();
        let sample = tracker.poll(Duration::ZERO, &element).unwrap();
        assert_eq!(sample.position, 3.0);
    }
}
