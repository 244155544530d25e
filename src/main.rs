//! CodeRoom - Application Entry Point
//!
//! This is the main entry point for the CodeRoom server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coderoom::{
    config::CONFIG,
    db::MemoryStore,
    handlers,
    sandbox::{
        CleanupPolicy, DockerBackend, ExecutionSandbox, RuntimeRegistry, SandboxSettings,
        StagingProvider,
    },
    services::{IdentityService, RoomService, SubmissionEvaluator},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CodeRoom server...");

    // Initialize Docker client
    tracing::info!("Connecting to Docker...");
    let docker = DockerBackend::connect(CONFIG.docker.socket_path.as_deref())?;
    tracing::info!("Connected to Docker version: {}", docker.version().await?);

    let registry = Arc::new(RuntimeRegistry::with_image_overrides(
        &CONFIG.sandbox.image_overrides,
    ));
    for profile in registry.profiles() {
        if !docker.has_image(profile.image()).await {
            tracing::warn!(
                language = profile.language(),
                image = profile.image(),
                "Runtime image not present locally; submissions will fail until it is pulled"
            );
        }
    }

    let sandbox_config = &CONFIG.sandbox;
    if sandbox_config.cleanup_policy == CleanupPolicy::Never {
        tracing::warn!(
            root = %sandbox_config.staging_root.display(),
            "Staging cleanup disabled; submission sources will accumulate on disk"
        );
    }

    let sandbox = Arc::new(ExecutionSandbox::new(
        registry,
        Arc::new(docker),
        StagingProvider::new(&sandbox_config.staging_root, sandbox_config.cleanup_policy),
        SandboxSettings {
            max_concurrency: sandbox_config.max_concurrency,
            max_source_bytes: sandbox_config.max_source_bytes,
            compile_timeout: sandbox_config.compile_timeout(),
            pids_limit: sandbox_config.pids_limit,
        },
    ));
    let evaluator = Arc::new(SubmissionEvaluator::new(
        sandbox.clone(),
        sandbox_config.limits(),
        CONFIG.room.full_score,
    ));

    let store = Arc::new(MemoryStore::new());
    let rooms = RoomService::new(store.clone(), store, evaluator, CONFIG.room.clone());
    let identity = IdentityService::new(&CONFIG.jwt);

    // Create application state
    let state = AppState::new(rooms, identity, sandbox);
    let app = handlers::app(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        max_concurrency = sandbox_config.max_concurrency,
        "Server listening on http://{}",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
