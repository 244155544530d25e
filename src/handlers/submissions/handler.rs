//! Submission handler implementations

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppResult, models::Principal, state::AppState};

use super::{
    request::CreateSubmissionRequest,
    response::{SubmissionResponse, SubmissionsListResponse},
};

/// Submit code for the caller's current round and wait for the verdict
pub async fn create_submission(
    State(state): State<AppState>,
    principal: Principal,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    payload.validate()?;

    let submission = state
        .rooms()
        .submit(&principal, &room_id, &payload.language, &payload.source_code)
        .await?;
    Ok(Json(SubmissionResponse::from(&submission)))
}

/// Get one of the caller's submissions
pub async fn get_submission(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionResponse>> {
    let submission = state.rooms().get_submission(&principal, &id).await?;
    Ok(Json(SubmissionResponse::from(&submission)))
}

/// List the caller's submissions, newest first
pub async fn list_my_submissions(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<SubmissionsListResponse>> {
    let submissions = state.rooms().user_submissions(&principal).await?;
    let submissions: Vec<SubmissionResponse> =
        submissions.iter().map(SubmissionResponse::from).collect();

    Ok(Json(SubmissionsListResponse {
        total: submissions.len(),
        submissions,
    }))
}
