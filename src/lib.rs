//! CodeRoom - Multiplayer coding rooms with sandboxed judging
//!
//! Users gather in a room, ready up, and submit solutions for each round.
//! Every submission is compiled and run in a throwaway container under CPU,
//! memory and wall-clock limits; its output decides the round score.
//!
//! # Architecture
//!
//! - **Sandbox**: runtime profiles, staging, and container execution
//! - **Services**: evaluation, identity, and room orchestration
//! - **Models**: the room state machine and submission records
//! - **Repositories**: storage contracts with an in-memory implementation
//! - **Handlers**: HTTP request handlers (thin layer)

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod sandbox;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
