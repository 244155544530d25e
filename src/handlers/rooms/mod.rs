//! Room handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers::submissions, state::AppState};

/// Room routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create_room).get(handler::list_rooms))
        .route(
            "/{id}",
            get(handler::get_room)
                .put(handler::update_room)
                .delete(handler::delete_room),
        )
        .route("/{id}/join", post(handler::join_room))
        .route("/{id}/leave", post(handler::leave_room))
        .route("/{id}/ready", post(handler::ready))
        .route("/{id}/start", post(handler::start_room))
        .route("/{id}/participants", get(handler::list_participants))
        .route("/{id}/submissions", post(submissions::create_submission))
        .route("/{id}/scores", get(handler::round_scores))
        .route("/{id}/standings", get(handler::standings))
}
