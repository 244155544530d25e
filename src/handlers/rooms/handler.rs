//! Room handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppResult, models::Principal, state::AppState};

use super::{
    request::{CreateRoomRequest, ScoresQuery, UpdateRoomRequest},
    response::{
        ParticipantsResponse, RoomResponse, RoomSummary, RoomsListResponse, ScoresResponse,
        StandingsResponse,
    },
};

/// Create a new room owned by the caller
pub async fn create_room(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<RoomResponse>)> {
    payload.validate()?;

    let room = state.rooms().create(&principal, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

/// List all rooms
pub async fn list_rooms(State(state): State<AppState>) -> AppResult<Json<RoomsListResponse>> {
    let rooms = state.rooms().list().await?;
    let rooms: Vec<RoomSummary> = rooms.iter().map(RoomSummary::from).collect();

    Ok(Json(RoomsListResponse {
        total: rooms.len(),
        rooms,
    }))
}

/// Get room details
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoomResponse>> {
    let room = state.rooms().get(&id).await?;
    Ok(Json(room.into()))
}

/// Update room settings (owner only, while waiting)
pub async fn update_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoomRequest>,
) -> AppResult<Json<RoomResponse>> {
    payload.validate()?;

    let room = state
        .rooms()
        .update(&principal, &id, payload.title, payload.capacity)
        .await?;
    Ok(Json(room.into()))
}

/// Delete a room (owner only)
pub async fn delete_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.rooms().delete(&principal, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join a waiting room
pub async fn join_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoomResponse>> {
    let room = state.rooms().join(&principal, &id).await?;
    Ok(Json(room.into()))
}

/// Leave a room
pub async fn leave_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoomResponse>> {
    let room = state.rooms().leave(&principal, &id).await?;
    Ok(Json(room.into()))
}

/// Mark the caller ready
pub async fn ready(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoomResponse>> {
    let room = state.rooms().ready(&principal, &id).await?;
    Ok(Json(room.into()))
}

/// Start the current round (owner only)
pub async fn start_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoomResponse>> {
    let room = state.rooms().start(&principal, &id).await?;
    Ok(Json(room.into()))
}

/// List participants
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ParticipantsResponse>> {
    let participants = state.rooms().participants(&id).await?;
    Ok(Json(ParticipantsResponse {
        room_id: id,
        participants,
    }))
}

/// Scores of one round; defaults to the latest scored round
pub async fn round_scores(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ScoresQuery>,
) -> AppResult<Json<ScoresResponse>> {
    let scores = state.rooms().round_scores(&id, query.round).await?;
    Ok(Json(ScoresResponse {
        room_id: id,
        scores,
    }))
}

/// Room leaderboard
pub async fn standings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StandingsResponse>> {
    let room = state.rooms().get(&id).await?;
    let standings = state.rooms().standings(&id).await?;
    Ok(Json(StandingsResponse {
        room_id: id,
        status: room.status,
        standings,
    }))
}
