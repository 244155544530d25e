//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coderoom::{
    AppResult,
    config::{Config, DockerConfig, JwtConfig, RoomConfig, SandboxConfig, ServerConfig},
    db::MemoryStore,
    models::Principal,
    sandbox::{
        CapturedOutput, ExecutionSandbox, IsolationBackend, LaunchOutcome, LaunchSpec,
        RuntimeRegistry, SandboxSettings, StagingProvider,
    },
    services::{IdentityService, RoomService, SubmissionEvaluator},
    state::AppState,
};
use uuid::Uuid;

/// Pretends to run the staged program: prints the first double-quoted
/// string found in the source, and fails javac when no `;` is present
pub struct EchoBackend;

#[async_trait]
impl IsolationBackend for EchoBackend {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn launch(&self, spec: LaunchSpec) -> AppResult<LaunchOutcome> {
        let source = staged_source(&spec.host_dir);
        let (exit_code, stdout) = if spec.command[0] == "javac" {
            (if source.contains(';') { 0 } else { 1 }, String::new())
        } else {
            match source.split('"').nth(1) {
                Some(text) => (0, format!("{}\n", text)),
                None => (1, String::new()),
            }
        };

        Ok(LaunchOutcome {
            exit_code,
            stdout: CapturedOutput {
                text: stdout,
                truncated: false,
            },
            stderr: CapturedOutput::default(),
            timed_out: false,
            oom_killed: false,
            elapsed: Duration::from_millis(3),
        })
    }
}

fn staged_source(dir: &Path) -> String {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .find_map(|entry| std::fs::read_to_string(entry.path()).ok())
        .unwrap_or_default()
}

pub fn test_config(staging_root: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        },
        jwt: JwtConfig {
            secret: "integration-secret".to_string(),
            expiry_hours: 1,
        },
        docker: DockerConfig { socket_path: None },
        sandbox: SandboxConfig {
            staging_root: staging_root.to_path_buf(),
            ..SandboxConfig::default()
        },
        room: RoomConfig::default(),
    }
}

pub fn build_sandbox(backend: Arc<dyn IsolationBackend>, config: &SandboxConfig) -> ExecutionSandbox {
    ExecutionSandbox::new(
        Arc::new(RuntimeRegistry::with_image_overrides(&config.image_overrides)),
        backend,
        StagingProvider::new(&config.staging_root, config.cleanup_policy),
        SandboxSettings {
            max_concurrency: config.max_concurrency,
            max_source_bytes: config.max_source_bytes,
            compile_timeout: config.compile_timeout(),
            pids_limit: config.pids_limit,
        },
    )
}

/// Application state wired to `backend` and an empty in-memory store
pub fn app_state(backend: Arc<dyn IsolationBackend>, config: Config) -> AppState {
    let sandbox = Arc::new(build_sandbox(backend, &config.sandbox));
    let evaluator = Arc::new(SubmissionEvaluator::new(
        sandbox.clone(),
        config.sandbox.limits(),
        config.room.full_score,
    ));
    let store = Arc::new(MemoryStore::new());
    let rooms = RoomService::new(store.clone(), store, evaluator, config.room.clone());
    let identity = IdentityService::new(&config.jwt);
    AppState::new(rooms, identity, sandbox)
}

/// A principal and a bearer token for it
pub fn user(state: &AppState, name: &str) -> (Principal, String) {
    let principal = Principal::new(Uuid::new_v4(), name);
    let (token, _) = state.identity().issue_token(&principal).unwrap();
    (principal, token)
}
