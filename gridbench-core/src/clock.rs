//! Monotonic Timing
//!
//! Thin wrappers over `std::time::Instant`. External-process latencies are
//! milliseconds-scale, so wall-clock resolution is sufficient; there is no
//! cycle-counter path here.

use std::time::Duration;

/// A monotonic timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: std::time::Instant,
}

impl Timestamp {
    /// Capture the current instant.
    #[inline]
    pub fn now() -> Self {
        Self {
            instant: std::time::Instant::now(),
        }
    }

    /// Elapsed time since this timestamp.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }

    /// Elapsed time since this timestamp, in seconds.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.instant.elapsed().as_secs_f64()
    }
}

/// Timer for measuring one timed trial.
pub struct Timer {
    start: Timestamp,
}

impl Timer {
    /// Start a new timer.
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Timestamp::now(),
        }
    }

    /// Stop the timer and return the elapsed duration.
    #[inline]
    pub fn stop(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_elapsed() {
        let start = Timestamp::now();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(5));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_timer_measures_sleep() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();

        assert!(elapsed.as_secs_f64() >= 0.005);
    }

    #[test]
    fn test_timestamps_are_monotonic() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(b.elapsed() <= a.elapsed());
    }
}
