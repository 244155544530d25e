//! Room repository

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{error::AppResult, models::Room};

/// Shared, individually locked room
pub type RoomHandle = Arc<Mutex<Room>>;

/// Storage for live rooms.
///
/// Rooms are handed out as lockable handles: every state transition happens
/// under the room's own mutex, never under a repository-wide lock.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Store a new room and return its handle
    async fn insert(&self, room: Room) -> AppResult<RoomHandle>;

    /// Look up a room by id; `RoomNotFound` if absent
    async fn get(&self, id: &Uuid) -> AppResult<RoomHandle>;

    /// Snapshot of every room, oldest first
    async fn list(&self) -> AppResult<Vec<Room>>;

    /// Remove a room; `RoomNotFound` if absent
    async fn remove(&self, id: &Uuid) -> AppResult<()>;
}
