//! Execution sandbox - one compile+run cycle per submission

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::{
    constants::{CONTAINER_WORKDIR, SIGKILL_EXIT_CODE, TIMEOUT_GRACE_MS},
    error::{AppError, AppResult},
    models::{Classification, ExecutionResult},
};

use super::{
    ExecutionLimits,
    backend::{IsolationBackend, LaunchOutcome, LaunchSpec},
    languages::{RuntimeProfile, RuntimeRegistry},
    output::CapturedOutput,
    staging::{StagingArea, StagingProvider},
};

/// Sandbox tunables that are not per-call limits
#[derive(Debug, Clone)]
pub struct SandboxSettings {
    pub max_concurrency: usize,
    pub max_source_bytes: usize,
    pub compile_timeout: Duration,
    pub pids_limit: i64,
}

/// Runs submissions in isolation, at most `max_concurrency` at a time.
///
/// Callers beyond the limit wait in FIFO order for a slot.
pub struct ExecutionSandbox {
    registry: Arc<RuntimeRegistry>,
    backend: Arc<dyn IsolationBackend>,
    staging: StagingProvider,
    permits: Semaphore,
    settings: SandboxSettings,
}

impl ExecutionSandbox {
    pub fn new(
        registry: Arc<RuntimeRegistry>,
        backend: Arc<dyn IsolationBackend>,
        staging: StagingProvider,
        settings: SandboxSettings,
    ) -> Self {
        Self {
            registry,
            backend,
            permits: Semaphore::new(settings.max_concurrency.max(1)),
            staging,
            settings,
        }
    }

    pub fn registry(&self) -> &RuntimeRegistry {
        &self.registry
    }

    /// Check that the isolation backend is reachable
    pub async fn health_check(&self) -> AppResult<()> {
        self.backend.ping().await
    }

    /// Reject unsupported languages and oversized payloads up front
    pub fn validate(&self, language: &str, source: &str) -> AppResult<&RuntimeProfile> {
        let profile = self.registry.resolve(language)?;
        if source.len() > self.settings.max_source_bytes {
            return Err(AppError::PayloadTooLarge {
                size: source.len(),
                limit: self.settings.max_source_bytes,
            });
        }
        Ok(profile)
    }

    /// Compile (when needed) and run `source` under `limits`
    pub async fn execute(
        &self,
        language: &str,
        source: &str,
        limits: &ExecutionLimits,
    ) -> AppResult<ExecutionResult> {
        let profile = self.validate(language, source)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::SandboxUnavailable("execution slots closed".to_string()))?;

        // Removed once this scope and every launch holding it are done
        let staging = Arc::new(self.staging.allocate().await?);
        staging.write_file(profile.entry_file(), source).await?;

        info!(
            language = %language,
            staging = %staging.id(),
            "Executing submission"
        );

        if let Some(command) = profile.compile_command() {
            let spec = self.launch_spec(&staging, profile, command, limits, self.settings.compile_timeout);
            let outcome = self.launch(&staging, spec).await?;

            if outcome.timed_out || outcome.exit_code != 0 {
                debug!(
                    language = %language,
                    exit_code = outcome.exit_code,
                    timed_out = outcome.timed_out,
                    "Compilation failed"
                );
                let mut stderr = outcome.stderr;
                if outcome.timed_out {
                    stderr.text.push_str("\ncompilation timed out");
                }
                return Ok(Self::result(
                    Classification::CompileError,
                    outcome.exit_code,
                    outcome.stdout,
                    stderr,
                    outcome.elapsed,
                ));
            }
        }

        let spec = self.launch_spec(
            &staging,
            profile,
            profile.run_command(),
            limits,
            limits.wall_timeout,
        );
        let outcome = self.launch(&staging, spec).await?;
        let classification = classify_run(&outcome);

        debug!(
            language = %language,
            exit_code = outcome.exit_code,
            classification = %classification,
            wall_time_ms = outcome.elapsed.as_millis() as u64,
            "Run step finished"
        );

        Ok(Self::result(
            classification,
            outcome.exit_code,
            outcome.stdout,
            outcome.stderr,
            outcome.elapsed,
        ))
    }

    fn launch_spec(
        &self,
        staging: &StagingArea,
        profile: &RuntimeProfile,
        command: Vec<String>,
        limits: &ExecutionLimits,
        timeout: Duration,
    ) -> LaunchSpec {
        LaunchSpec {
            label: format!("{}-{}", staging.id(), uuid::Uuid::new_v4().simple()),
            image: profile.image().to_string(),
            host_dir: staging.path().to_path_buf(),
            workdir: CONTAINER_WORKDIR.to_string(),
            command,
            memory_bytes: limits.memory_quota_bytes,
            cpu_quota: limits.cpu_quota,
            pids_limit: self.settings.pids_limit,
            network_disabled: true,
            timeout,
            output_cap: limits.output_byte_cap,
        }
    }

    /// Launch with a deadline of our own on top of the backend's, so a
    /// backend that fails to kill its process cannot hang the caller.
    ///
    /// The launch runs on its own task holding `staging`. When our deadline
    /// fires first the task is detached, not aborted: the directory stays
    /// mounted until the backend has torn its environment down.
    async fn launch(
        &self,
        staging: &Arc<StagingArea>,
        spec: LaunchSpec,
    ) -> AppResult<LaunchOutcome> {
        let deadline = spec.timeout + Duration::from_millis(TIMEOUT_GRACE_MS);
        let started = Instant::now();

        let backend = self.backend.clone();
        let held = staging.clone();
        let task = tokio::spawn(async move {
            let outcome = backend.launch(spec).await;
            drop(held);
            outcome
        });

        match tokio::time::timeout(deadline, task).await {
            Ok(joined) => joined.map_err(|e| {
                AppError::InternalExecutionFailure(format!("launch task failed: {}", e))
            })?,
            Err(_) => {
                warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "Isolation backend overran its deadline, treating as timeout"
                );
                Ok(LaunchOutcome {
                    exit_code: SIGKILL_EXIT_CODE,
                    stdout: CapturedOutput::default(),
                    stderr: CapturedOutput::default(),
                    timed_out: true,
                    oom_killed: false,
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    fn result(
        classification: Classification,
        exit_code: i64,
        stdout: CapturedOutput,
        stderr: CapturedOutput,
        elapsed: Duration,
    ) -> ExecutionResult {
        ExecutionResult {
            classification,
            exit_code,
            stdout: stdout.text,
            stdout_truncated: stdout.truncated,
            stderr: stderr.text,
            stderr_truncated: stderr.truncated,
            wall_time_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Classify a finished run step
fn classify_run(outcome: &LaunchOutcome) -> Classification {
    if outcome.timed_out {
        Classification::Timeout
    } else if outcome.oom_killed || outcome.exit_code == SIGKILL_EXIT_CODE {
        Classification::ResourceLimitExceeded
    } else if outcome.exit_code != 0 {
        Classification::RuntimeError
    } else {
        Classification::Success
    }
}
