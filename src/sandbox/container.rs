//! Docker container management for submission execution

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use bollard::{
    Docker,
    container::LogOutput,
    models::{ContainerCreateBody, HostConfig, HostConfigLogConfig},
    query_parameters::{
        CreateContainerOptionsBuilder, InspectContainerOptions, KillContainerOptionsBuilder,
        LogsOptionsBuilder, RemoveContainerOptionsBuilder, StartContainerOptions,
        WaitContainerOptionsBuilder,
    },
};
use futures::StreamExt;

use crate::{
    constants::{CONTAINER_LABEL, LOG_RETENTION_FACTOR, MIN_LOG_RETENTION_BYTES, SIGKILL_EXIT_CODE},
    error::{AppError, AppResult},
};

use super::{
    backend::{IsolationBackend, LaunchOutcome, LaunchSpec},
    output::{CappedBuffer, CapturedOutput},
};

/// Isolation backend running each launch in a throwaway Docker container
#[derive(Clone)]
pub struct DockerBackend {
    docker: Docker,
}

impl DockerBackend {
    /// Create a new backend over an engine connection
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect to the engine at `socket_path`, or the platform default
    pub fn connect(socket_path: Option<&str>) -> AppResult<Self> {
        let docker = match socket_path {
            Some(path) => {
                Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)?
            }
            None => Docker::connect_with_socket_defaults()?,
        };
        Ok(Self::new(docker))
    }

    /// Whether `image` is present locally
    pub async fn has_image(&self, image: &str) -> bool {
        self.docker.inspect_image(image).await.is_ok()
    }

    /// Engine version string, for startup logging
    pub async fn version(&self) -> AppResult<String> {
        let version = self.docker.version().await?;
        Ok(version.version.unwrap_or_default())
    }
}

#[async_trait]
impl IsolationBackend for DockerBackend {
    async fn ping(&self) -> AppResult<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| AppError::SandboxUnavailable(e.to_string()))
    }

    async fn launch(&self, spec: LaunchSpec) -> AppResult<LaunchOutcome> {
        // Run the whole container lifecycle on its own task so the container
        // is still killed and removed if the caller is cancelled.
        let docker = self.docker.clone();
        tokio::spawn(async move { run_container(docker, spec).await })
            .await
            .map_err(|e| AppError::InternalExecutionFailure(format!("container task failed: {}", e)))?
    }
}

/// Create, run and always remove one container
async fn run_container(docker: Docker, spec: LaunchSpec) -> AppResult<LaunchOutcome> {
    let container_name = format!("coderoom-{}", spec.label);

    let options = CreateContainerOptionsBuilder::default()
        .name(&container_name)
        .build();

    let config = ContainerCreateBody {
        image: Some(spec.image.clone()),
        cmd: Some(spec.command.clone()),
        working_dir: Some(spec.workdir.clone()),
        network_disabled: Some(spec.network_disabled),
        tty: Some(false),
        env: Some(vec!["LANG=C.UTF-8".to_string()]),
        labels: Some({
            let mut labels = HashMap::new();
            labels.insert(CONTAINER_LABEL.to_string(), spec.label.clone());
            labels
        }),
        host_config: Some(host_config(&spec)),
        ..Default::default()
    };

    let container = docker.create_container(Some(options), config).await?;
    tracing::debug!(
        container = %container.id,
        image = %spec.image,
        cmd = ?spec.command,
        "Created sandbox container"
    );

    let outcome = drive_container(&docker, &container.id, &spec).await;

    let remove = RemoveContainerOptionsBuilder::default().force(true).build();
    if let Err(e) = docker.remove_container(&container.id, Some(remove)).await {
        tracing::warn!(container = %container.id, "Failed to remove container: {}", e);
    }

    outcome
}

/// Resource limits, mount and lockdown for one launch
fn host_config(spec: &LaunchSpec) -> HostConfig {
    HostConfig {
        binds: Some(vec![format!(
            "{}:{}:rw",
            spec.host_dir.display(),
            spec.workdir
        )]),
        memory: Some(spec.memory_bytes as i64),
        memory_swap: Some(spec.memory_bytes as i64), // no swap on top of the limit
        nano_cpus: Some((spec.cpu_quota * 1_000_000_000.0) as i64),
        network_mode: Some(if spec.network_disabled { "none" } else { "bridge" }.to_string()),
        pids_limit: Some(spec.pids_limit),
        cap_drop: Some(vec!["ALL".to_string()]),
        security_opt: Some(vec!["no-new-privileges".to_string()]),
        log_config: Some(HostConfigLogConfig {
            typ: Some("json-file".to_string()),
            config: Some(HashMap::from([
                ("max-size".to_string(), log_max_size(spec.output_cap)),
                ("max-file".to_string(), "1".to_string()),
            ])),
        }),
        ..Default::default()
    }
}

/// json-file `max-size` for a given output cap, in KiB
fn log_max_size(output_cap: usize) -> String {
    let bytes = output_cap
        .saturating_mul(LOG_RETENTION_FACTOR)
        .max(MIN_LOG_RETENTION_BYTES);
    format!("{}k", bytes.div_ceil(1024))
}

/// Start the container and wait for it under the wall timeout
async fn drive_container(docker: &Docker, id: &str, spec: &LaunchSpec) -> AppResult<LaunchOutcome> {
    let started = Instant::now();
    docker
        .start_container(id, None::<StartContainerOptions>)
        .await?;

    let wait_options = WaitContainerOptionsBuilder::default()
        .condition("not-running")
        .build();
    let mut wait = Box::pin(docker.wait_container(id, Some(wait_options)));

    let (exit_code, timed_out) = match tokio::time::timeout(spec.timeout, wait.next()).await {
        Ok(Some(Ok(response))) => (response.status_code, false),
        // bollard reports non-zero exits as an error carrying the code
        Ok(Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. }))) => {
            (code, false)
        }
        Ok(Some(Err(e))) => return Err(e.into()),
        Ok(None) => {
            return Err(AppError::InternalExecutionFailure(
                "container wait stream ended without a status".to_string(),
            ));
        }
        Err(_) => {
            tracing::debug!(container = %id, timeout_ms = spec.timeout.as_millis() as u64, "Killing container after wall timeout");
            let kill = KillContainerOptionsBuilder::default().signal("SIGKILL").build();
            if let Err(e) = docker.kill_container(id, Some(kill)).await {
                // The process may have exited on its own in the meantime
                tracing::debug!(container = %id, "Kill after timeout failed: {}", e);
            }
            (SIGKILL_EXIT_CODE, true)
        }
    };
    let elapsed = started.elapsed();

    let oom_killed = docker
        .inspect_container(id, None::<InspectContainerOptions>)
        .await?
        .state
        .and_then(|state| state.oom_killed)
        .unwrap_or(false);

    let (stdout, stderr) = collect_logs(docker, id, spec.output_cap).await?;

    Ok(LaunchOutcome {
        exit_code,
        stdout,
        stderr,
        timed_out,
        oom_killed,
        elapsed,
    })
}

/// Read the container's stdout/stderr, each capped at `cap` bytes
async fn collect_logs(
    docker: &Docker,
    id: &str,
    cap: usize,
) -> AppResult<(CapturedOutput, CapturedOutput)> {
    let options = LogsOptionsBuilder::default()
        .stdout(true)
        .stderr(true)
        .build();
    let mut logs = Box::pin(docker.logs(id, Some(options)));

    let mut stdout = CappedBuffer::new(cap);
    let mut stderr = CappedBuffer::new(cap);

    while let Some(msg) = logs.next().await {
        match msg? {
            LogOutput::StdOut { message } => stdout.push(&message),
            LogOutput::StdErr { message } => stderr.push(&message),
            _ => {}
        }
        if stdout.is_truncated() && stderr.is_truncated() {
            break;
        }
    }

    Ok((stdout.finish(), stderr.finish()))
}
