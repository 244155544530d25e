//! Room response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{Participant, Principal, Room, RoomStatus},
    services::{RoundScoreEntry, Standing},
};

/// Room response
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: Uuid,
    pub title: String,
    pub owner: Principal,
    pub capacity: usize,
    pub status: RoomStatus,
    pub round: u32,
    pub total_rounds: u32,
    pub current_problem: ProblemSummary,
    pub round_deadline: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Problem as shown to players; the expected output stays hidden
#[derive(Debug, Serialize)]
pub struct ProblemSummary {
    pub id: Uuid,
    pub title: String,
    pub time_limit_secs: Option<u64>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        let problem = room.current_problem();
        let current_problem = ProblemSummary {
            id: problem.id,
            title: problem.title.clone(),
            time_limit_secs: problem.time_limit_secs,
        };
        Self {
            total_rounds: room.total_rounds(),
            current_problem,
            id: room.id,
            title: room.title,
            owner: room.owner,
            capacity: room.capacity,
            status: room.status,
            round: room.round_index,
            round_deadline: room.round_deadline,
            participants: room.participants,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

/// Room list entry
#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub id: Uuid,
    pub title: String,
    pub owner: Principal,
    pub status: RoomStatus,
    pub capacity: usize,
    pub participant_count: usize,
    pub round: u32,
    pub total_rounds: u32,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            title: room.title.clone(),
            owner: room.owner.clone(),
            status: room.status,
            capacity: room.capacity,
            participant_count: room.participants.len(),
            round: room.round_index,
            total_rounds: room.total_rounds(),
        }
    }
}

/// Room list response
#[derive(Debug, Serialize)]
pub struct RoomsListResponse {
    pub rooms: Vec<RoomSummary>,
    pub total: usize,
}

/// Participants response
#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub room_id: Uuid,
    pub participants: Vec<Participant>,
}

/// Round scores response
#[derive(Debug, Serialize)]
pub struct ScoresResponse {
    pub room_id: Uuid,
    pub scores: Vec<RoundScoreEntry>,
}

/// Standings response
#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub room_id: Uuid,
    pub status: RoomStatus,
    pub standings: Vec<Standing>,
}
