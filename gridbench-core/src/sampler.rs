//! Adaptive Sampling Controller
//!
//! Runs a repeatable action through a warmup phase and then timed trials
//! under an adaptive stopping rule, producing a mean duration in seconds.
//!
//! The rule guarantees a minimum statistical floor (`min_runs` trials *and*
//! `min_total_seconds` of cumulative wall time) and a hard ceiling
//! (`max_runs`) bounding total duration regardless of how fast or slow the
//! individual runs are.

use crate::clock::Timer;
use crate::error::BenchError;
use std::future::Future;

/// Validated sampling parameters.
///
/// Construction enforces the invariants; a violated configuration is a
/// [`BenchError::Config`] at construction time, not a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Untimed invocations before measurement begins.
    pub warmup_count: u32,
    /// Minimum number of timed trials.
    pub min_runs: u32,
    /// Hard ceiling on timed trials.
    pub max_runs: u32,
    /// Minimum cumulative measured wall time, in seconds.
    pub min_total_seconds: f64,
}

impl SamplingConfig {
    /// Build a configuration, validating `min_runs >= 1`,
    /// `max_runs >= min_runs` and `min_total_seconds >= 0` eagerly.
    pub fn new(
        warmup_count: u32,
        min_runs: u32,
        max_runs: u32,
        min_total_seconds: f64,
    ) -> Result<Self, BenchError> {
        if min_runs < 1 {
            return Err(BenchError::Config(format!(
                "min_runs must be at least 1 (got {min_runs})"
            )));
        }
        if max_runs < min_runs {
            return Err(BenchError::Config(format!(
                "max_runs ({max_runs}) must be >= min_runs ({min_runs})"
            )));
        }
        if !(min_total_seconds >= 0.0) {
            return Err(BenchError::Config(format!(
                "min_total_seconds must be >= 0 (got {min_total_seconds})"
            )));
        }
        Ok(Self {
            warmup_count,
            min_runs,
            max_runs,
            min_total_seconds,
        })
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            warmup_count: 1,
            min_runs: 3,
            max_runs: 10,
            min_total_seconds: 0.5,
        }
    }
}

/// Running aggregate over the timed trials of one sampling session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleSet {
    count: u32,
    cumulative_seconds: f64,
}

impl SampleSet {
    /// Record one completed timed trial.
    pub fn record(&mut self, seconds: f64) {
        self.count += 1;
        self.cumulative_seconds += seconds;
    }

    /// Number of completed timed trials.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Cumulative measured seconds.
    pub fn cumulative_seconds(&self) -> f64 {
        self.cumulative_seconds
    }

    /// Whether another timed trial should run under `config`.
    ///
    /// Always takes at least one trial. Then: stop at `max_runs`; otherwise
    /// continue until both the `min_runs` floor and the `min_total_seconds`
    /// floor are satisfied.
    pub fn should_continue(&self, config: &SamplingConfig) -> bool {
        if self.count == 0 {
            return true;
        }
        if self.count >= config.max_runs {
            return false;
        }
        self.count < config.min_runs || self.cumulative_seconds < config.min_total_seconds
    }

    /// Arithmetic mean of the recorded trials, or `None` if none ran.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.cumulative_seconds / self.count as f64)
        }
    }
}

/// Run `run_once` through warmup and adaptive timed trials, returning the
/// mean trial duration in seconds.
///
/// Failures propagate immediately, during warmup and timed trials alike;
/// no partial mean is ever returned. If the configuration somehow permits
/// zero timed runs, an explicit error is returned rather than NaN.
pub async fn sample<F, Fut>(config: &SamplingConfig, mut run_once: F) -> Result<f64, BenchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), BenchError>>,
{
    for _ in 0..config.warmup_count {
        run_once().await?;
    }

    let mut set = SampleSet::default();
    while set.should_continue(config) {
        let timer = Timer::start();
        run_once().await?;
        set.record(timer.stop().as_secs_f64());
    }

    set.mean()
        .ok_or_else(|| BenchError::Config("no timed runs executed".to_string()))
}
