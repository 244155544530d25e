//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ExecutionResult, Submission, Verdict};

/// Evaluated submission
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub round: u32,
    pub language: String,
    pub verdict: Option<Verdict>,
    pub result: Option<ExecutionResult>,
    pub submitted_at: DateTime<Utc>,
    pub judged_at: Option<DateTime<Utc>>,
}

impl From<&Submission> for SubmissionResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id(),
            user_id: submission.user_id(),
            room_id: submission.room_id(),
            round: submission.round(),
            language: submission.language().to_string(),
            verdict: submission.verdict().cloned(),
            result: submission.result().cloned(),
            submitted_at: submission.submitted_at(),
            judged_at: submission.judged_at(),
        }
    }
}

/// Submission list response
#[derive(Debug, Serialize)]
pub struct SubmissionsListResponse {
    pub submissions: Vec<SubmissionResponse>,
    pub total: usize,
}
