//! Sandbox tests against a real Docker engine.
//!
//! Ignored by default; run with `cargo test -- --ignored` on a host with
//! Docker and the runtime images pulled.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use coderoom::{
    config::SandboxConfig,
    models::Classification,
    sandbox::{DockerBackend, ExecutionSandbox},
};

fn docker_sandbox(staging_root: &std::path::Path) -> (ExecutionSandbox, SandboxConfig) {
    let config = SandboxConfig {
        staging_root: staging_root.to_path_buf(),
        wall_timeout_ms: 2_000,
        ..SandboxConfig::default()
    };
    let backend = DockerBackend::connect(None).expect("docker socket");
    (common::build_sandbox(Arc::new(backend), &config), config)
}

#[tokio::test]
#[ignore = "requires a Docker engine"]
async fn test_python_hello_succeeds() {
    let staging = tempfile::tempdir().unwrap();
    let (sandbox, config) = docker_sandbox(staging.path());

    let result = sandbox
        .execute("python", "print(\"hi\")", &config.limits())
        .await
        .unwrap();

    assert_eq!(result.classification, Classification::Success);
    assert_eq!(result.stdout.trim_end(), "hi");
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
#[ignore = "requires a Docker engine"]
async fn test_java_syntax_error_is_compile_error() {
    let staging = tempfile::tempdir().unwrap();
    let (sandbox, config) = docker_sandbox(staging.path());
    let source = "public class Main { public static void main(String[] a) { System.out.println(\"hi\") } }";

    let result = sandbox.execute("java", source, &config.limits()).await.unwrap();

    assert_eq!(result.classification, Classification::CompileError);
    assert!(!result.stderr.is_empty());
}

#[tokio::test]
#[ignore = "requires a Docker engine"]
async fn test_sleeping_program_times_out() {
    let staging = tempfile::tempdir().unwrap();
    let (sandbox, config) = docker_sandbox(staging.path());
    let limits = config.limits();

    let started = Instant::now();
    let result = sandbox
        .execute("python", "import time\ntime.sleep(30)", &limits)
        .await
        .unwrap();

    assert_eq!(result.classification, Classification::Timeout);
    assert!(started.elapsed() < limits.wall_timeout + Duration::from_secs(10));
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
#[ignore = "requires a Docker engine"]
async fn test_non_zero_exit_is_runtime_error() {
    let staging = tempfile::tempdir().unwrap();
    let (sandbox, config) = docker_sandbox(staging.path());

    let result = sandbox
        .execute("javascript", "process.exit(3)", &config.limits())
        .await
        .unwrap();

    assert_eq!(result.classification, Classification::RuntimeError);
    assert_eq!(result.exit_code, 3);
}
