//! Business logic services

pub mod evaluator;
pub mod identity_service;
pub mod room_service;

pub use evaluator::SubmissionEvaluator;
pub use identity_service::IdentityService;
pub use room_service::{NewRoom, RoomService, RoundScoreEntry, Standing};
