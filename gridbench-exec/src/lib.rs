#![warn(missing_docs)]
//! Gridbench Exec
//!
//! Process plumbing for the harness:
//! - `Supervisor` launches one external command, bounds its wall time and
//!   captured output, guarantees termination of the whole process tree and
//!   classifies the outcome
//! - `ProcessRegistry` tracks every live child so a process-wide interrupt
//!   can reach them all
//! - `ArtifactCache` memoizes expensive one-time build steps
//! - `Shutdown` is the one-shot interrupt path

mod cache;
mod registry;
mod shutdown;
mod supervisor;

pub use cache::ArtifactCache;
pub use registry::{ProcessRegistry, RegistrationGuard};
pub use shutdown::Shutdown;
pub use supervisor::{terminate, CommandInvocation, Supervisor, DEFAULT_OUTPUT_LIMIT};
