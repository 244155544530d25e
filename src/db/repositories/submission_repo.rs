//! Submission repository

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppResult, models::Submission};

/// Storage for evaluated submissions
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Save a submission, superseding any earlier one by the same user for
    /// the same room and round
    async fn save(&self, submission: Submission) -> AppResult<()>;

    /// `SubmissionNotFound` if absent or superseded
    async fn find_by_id(&self, id: &Uuid) -> AppResult<Submission>;

    /// Live submissions by one user across all rooms, newest first
    async fn list_for_user(&self, user_id: &Uuid) -> AppResult<Vec<Submission>>;
}
