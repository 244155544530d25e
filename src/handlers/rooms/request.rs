//! Room request DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::{MAX_EXPECTED_OUTPUT_SIZE, MAX_ROOM_ROUNDS, MAX_ROOM_TITLE_LENGTH},
    models::RoomProblem,
    services::NewRoom,
};

/// Create room request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = MAX_ROOM_TITLE_LENGTH))]
    pub title: String,

    /// Defaults to the configured room capacity
    #[validate(range(min = 2))]
    pub capacity: Option<usize>,

    /// One problem per round, played in order
    #[validate(length(min = 1, max = MAX_ROOM_ROUNDS), nested)]
    pub problems: Vec<ProblemRequest>,
}

/// Problem for one round
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProblemRequest {
    #[validate(length(min = 1, max = MAX_ROOM_TITLE_LENGTH))]
    pub title: String,

    /// Omit to accept any run that exits cleanly
    #[validate(length(max = MAX_EXPECTED_OUTPUT_SIZE))]
    pub expected_output: Option<String>,

    #[validate(range(min = 1, max = 86400))]
    pub time_limit_secs: Option<u64>,
}

impl From<CreateRoomRequest> for NewRoom {
    fn from(request: CreateRoomRequest) -> Self {
        Self {
            title: request.title,
            capacity: request.capacity,
            problems: request
                .problems
                .into_iter()
                .map(|p| RoomProblem {
                    id: Uuid::new_v4(),
                    title: p.title,
                    expected_output: p.expected_output,
                    time_limit_secs: p.time_limit_secs,
                })
                .collect(),
        }
    }
}

/// Update room request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[validate(length(min = 1, max = MAX_ROOM_TITLE_LENGTH))]
    pub title: Option<String>,

    #[validate(range(min = 2))]
    pub capacity: Option<usize>,
}

/// Round scores query parameters
#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub round: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_request(problems: serde_json::Value) -> CreateRoomRequest {
        serde_json::from_value(json!({ "title": "Lunch duel", "problems": problems })).unwrap()
    }

    #[test]
    fn test_problem_count_is_bounded() {
        let one = create_request(json!([{ "title": "Say hi", "expected_output": "hi" }]));
        assert!(one.validate().is_ok());

        let none = create_request(json!([]));
        let errors = none.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("problems"));

        let too_many: Vec<_> = (0..=MAX_ROOM_ROUNDS)
            .map(|i| json!({ "title": format!("Round {}", i) }))
            .collect();
        assert!(create_request(json!(too_many)).validate().is_err());
    }

    #[test]
    fn test_nested_problem_is_validated() {
        let request = create_request(json!([{ "title": "", "time_limit_secs": 0 }]));
        assert!(request.validate().is_err());
    }
}
