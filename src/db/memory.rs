//! In-memory repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Room, Submission},
};

use super::repositories::{RoomHandle, RoomRepository, SubmissionRepository};

type RoundKey = (Uuid, u32, Uuid); // (room, round, user)

#[derive(Default)]
struct SubmissionIndex {
    by_id: HashMap<Uuid, Submission>,
    live: HashMap<RoundKey, Uuid>,
}

/// Process-local store for rooms and submissions
#[derive(Default, Clone)]
pub struct MemoryStore {
    rooms: Arc<RwLock<HashMap<Uuid, RoomHandle>>>,
    submissions: Arc<RwLock<SubmissionIndex>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn insert(&self, room: Room) -> AppResult<RoomHandle> {
        let id = room.id;
        let handle = Arc::new(Mutex::new(room));
        self.rooms.write().await.insert(id, handle.clone());
        Ok(handle)
    }

    async fn get(&self, id: &Uuid) -> AppResult<RoomHandle> {
        self.rooms
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(AppError::RoomNotFound(*id))
    }

    async fn list(&self) -> AppResult<Vec<Room>> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        // Snapshot outside the map lock
        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            rooms.push(handle.lock().await.clone());
        }
        rooms.sort_by_key(|room| room.created_at);
        Ok(rooms)
    }

    async fn remove(&self, id: &Uuid) -> AppResult<()> {
        self.rooms
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(AppError::RoomNotFound(*id))
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn save(&self, submission: Submission) -> AppResult<()> {
        let key = (submission.room_id(), submission.round(), submission.user_id());
        let mut index = self.submissions.write().await;

        if let Some(previous) = index.live.insert(key, submission.id()) {
            if previous != submission.id() {
                index.by_id.remove(&previous);
            }
        }
        index.by_id.insert(submission.id(), submission);
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Submission> {
        self.submissions
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or(AppError::SubmissionNotFound(*id))
    }

    async fn list_for_user(&self, user_id: &Uuid) -> AppResult<Vec<Submission>> {
        let index = self.submissions.read().await;
        let mut found: Vec<Submission> = index
            .by_id
            .values()
            .filter(|s| s.user_id() == *user_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| std::cmp::Reverse(s.submitted_at()));
        Ok(found)
    }
}
