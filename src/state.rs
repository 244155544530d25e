//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{
    sandbox::{ExecutionSandbox, RuntimeRegistry},
    services::{IdentityService, RoomService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    rooms: RoomService,
    identity: IdentityService,
    sandbox: Arc<ExecutionSandbox>,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        rooms: RoomService,
        identity: IdentityService,
        sandbox: Arc<ExecutionSandbox>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                rooms,
                identity,
                sandbox,
            }),
        }
    }

    pub fn rooms(&self) -> &RoomService {
        &self.inner.rooms
    }

    pub fn identity(&self) -> &IdentityService {
        &self.inner.identity
    }

    pub fn sandbox(&self) -> &ExecutionSandbox {
        &self.inner.sandbox
    }

    pub fn registry(&self) -> &RuntimeRegistry {
        self.inner.sandbox.registry()
    }
}
