//! Submission request DTOs

use serde::Deserialize;
use validator::Validate;

/// Create submission request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    /// Language id, e.g. `python`
    #[validate(length(min = 1, max = 20))]
    pub language: String,

    /// Source code; the size ceiling is enforced by the sandbox
    #[validate(length(min = 1))]
    pub source_code: String,
}
