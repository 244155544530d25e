//! Sandboxed compilation and execution of submitted source code
//!
//! - [`languages`]: runtime profiles per supported language
//! - [`staging`]: per-execution scratch directories
//! - [`backend`]: the isolation contract, with [`DockerBackend`] as the engine
//! - [`executor`]: [`ExecutionSandbox`], tying the pieces together

pub mod backend;
pub mod container;
pub mod executor;
pub mod languages;
pub mod output;
pub mod staging;

use std::time::Duration;

pub use backend::{IsolationBackend, LaunchOutcome, LaunchSpec};
pub use container::DockerBackend;
pub use executor::{ExecutionSandbox, SandboxSettings};
pub use languages::{RuntimeProfile, RuntimeRegistry};
pub use output::{CappedBuffer, CapturedOutput};
pub use staging::{CleanupPolicy, StagingArea, StagingProvider};

/// Per-execution resource limits
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionLimits {
    pub wall_timeout: Duration,
    /// In cores
    pub cpu_quota: f64,
    pub memory_quota_bytes: u64,
    /// Applied to stdout and stderr independently
    pub output_byte_cap: usize,
}
