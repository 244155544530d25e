//! Isolation backend contract
//!
//! The sandbox only needs one thing from an isolation mechanism: launch an
//! isolated environment from a base image with a writable mounted directory,
//! a command line and resource limits, then report the exit code and the
//! captured output. [`DockerBackend`](super::DockerBackend) is the production
//! implementation; any engine honoring this contract can be substituted.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

use super::output::CapturedOutput;

/// Everything needed to launch one isolated process
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    /// Unique id of this launch, used to name the container
    pub label: String,
    pub image: String,
    /// Host directory mounted read-write into the environment
    pub host_dir: PathBuf,
    /// Mount point of `host_dir`, also the working directory
    pub workdir: String,
    pub command: Vec<String>,
    pub memory_bytes: u64,
    /// CPU quota in cores
    pub cpu_quota: f64,
    pub pids_limit: i64,
    pub network_disabled: bool,
    /// Wall-clock budget; the backend kills the process when it expires
    pub timeout: Duration,
    /// Cap applied to stdout and stderr independently
    pub output_cap: usize,
}

/// What came back from one launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub exit_code: i64,
    pub stdout: CapturedOutput,
    pub stderr: CapturedOutput,
    pub timed_out: bool,
    /// The engine killed the process for exceeding its memory limit
    pub oom_killed: bool,
    pub elapsed: Duration,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IsolationBackend: Send + Sync {
    /// Check that the engine is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Run one command to completion (or until its timeout)
    async fn launch(&self, spec: LaunchSpec) -> AppResult<LaunchOutcome>;
}
