#![warn(missing_docs)]
//! Gridbench Core
//!
//! Leaf utilities shared by the rest of the harness:
//! - Monotonic clock and trial timer
//! - The adaptive sampling controller (warmup + stopping rule → mean seconds)
//! - The `BenchError` taxonomy every layer classifies against

mod clock;
mod error;
mod sampler;

pub use clock::{Timer, Timestamp};
pub use error::BenchError;
pub use sampler::{sample, SampleSet, SamplingConfig};
