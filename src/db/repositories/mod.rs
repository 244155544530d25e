//! Repository contracts
//!
//! The service layer only talks to these traits; [`MemoryStore`](super::MemoryStore)
//! is the bundled implementation.

pub mod room_repo;
pub mod submission_repo;

pub use room_repo::{RoomHandle, RoomRepository};
pub use submission_repo::SubmissionRepository;
