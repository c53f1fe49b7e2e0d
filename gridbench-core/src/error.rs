//! Error Taxonomy
//!
//! Every failure the harness can produce is one of these variants. Outcome
//! classification (timeout vs. failure vs. overflow) is done by matching on
//! the variant, never by parsing diagnostic strings.

use std::time::Duration;
use thiserror::Error;

/// Failure classification for benchmark invocations and configuration.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The executable could not be spawned at all.
    #[error("failed to spawn '{program}': {message}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// OS-level reason.
        message: String,
        /// Whether the program was simply not found on the search path.
        not_found: bool,
    },

    /// The process ran but exited non-zero.
    #[error("command failed{}: {message}", match .code { Some(c) => format!(" with exit code {c}"), None => String::new() })]
    ProcessFailed {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Trimmed stderr, falling back to stdout, falling back to a generic message.
        message: String,
    },

    /// Captured output exceeded the configured ceiling.
    #[error("output exceeded limit: {captured} bytes captured (ceiling {limit})")]
    OutputOverflow {
        /// Bytes captured before the ceiling was hit.
        captured: usize,
        /// The configured ceiling.
        limit: usize,
    },

    /// The wall-clock deadline fired before the process exited.
    #[error("timed out after {:.1}s", .timeout.as_secs_f64())]
    Timeout {
        /// The configured timeout (not measured elapsed time).
        timeout: Duration,
    },

    /// Invalid sampling or environment configuration, detected eagerly.
    #[error("configuration error: {0}")]
    Config(String),

    /// A compile/build step consulted through the artifact cache failed.
    #[error("build failed for '{key}': {source}")]
    CacheBuild {
        /// The cache key whose build failed.
        key: String,
        /// The underlying invocation failure.
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    /// Whether this failure is a deadline expiry, including a timeout that
    /// occurred inside a cached build step.
    pub fn is_timeout(&self) -> bool {
        match self {
            BenchError::Timeout { .. } => true,
            BenchError::CacheBuild { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
