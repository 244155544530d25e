//! Runtime listing

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Supported runtime
#[derive(Debug, Serialize)]
pub struct RuntimeResponse {
    pub language: String,
    pub display_name: String,
    pub image: String,
    pub compiled: bool,
}

async fn list_runtimes(State(state): State<AppState>) -> Json<Vec<RuntimeResponse>> {
    let runtimes = state
        .registry()
        .profiles()
        .map(|profile| RuntimeResponse {
            language: profile.language().to_string(),
            display_name: profile.display_name().to_string(),
            image: profile.image().to_string(),
            compiled: profile.requires_compilation(),
        })
        .collect();
    Json(runtimes)
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/runtimes", get(list_runtimes))
}
