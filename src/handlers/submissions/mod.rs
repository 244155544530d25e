//! Submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Submission routes; creation lives under the room routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/{id}", get(handler::get_submission))
}

/// Routes scoped to the calling user
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me/submissions", get(handler::list_my_submissions))
}
