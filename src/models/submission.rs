//! Submission, execution result and verdict models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Outcome class of one compile+run cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Success,
    CompileError,
    RuntimeError,
    Timeout,
    ResourceLimitExceeded,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::CompileError => write!(f, "COMPILE_ERROR"),
            Self::RuntimeError => write!(f, "RUNTIME_ERROR"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::ResourceLimitExceeded => write!(f, "RESOURCE_LIMIT_EXCEEDED"),
        }
    }
}

/// Captured result of executing one submission.
///
/// There is no pending state: a value of this type is only produced once the
/// sandbox has finished with the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub classification: Classification,
    /// Exit code of the last step that ran (the compiler on `CompileError`)
    pub exit_code: i64,
    pub stdout: String,
    pub stdout_truncated: bool,
    pub stderr: String,
    pub stderr_truncated: bool,
    pub wall_time_ms: u64,
}

/// Scored outcome kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictKind {
    Accepted,
    WrongOutput,
    CompileError,
    RuntimeError,
    Timeout,
    ResourceLimitExceeded,
    /// Round closed before the participant submitted
    DidNotFinish,
}

impl VerdictKind {
    /// Verdict kind for a non-successful execution
    pub fn from_failure(classification: Classification) -> Option<Self> {
        match classification {
            Classification::Success => None,
            Classification::CompileError => Some(Self::CompileError),
            Classification::RuntimeError => Some(Self::RuntimeError),
            Classification::Timeout => Some(Self::Timeout),
            Classification::ResourceLimitExceeded => Some(Self::ResourceLimitExceeded),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Verdict attached to a submission and folded into the round score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub score: u32,
    pub classification: Option<Classification>,
    pub wall_time_ms: Option<u64>,
}

impl Verdict {
    /// Verdict for a terminal execution result
    pub fn scored(kind: VerdictKind, score: u32, result: &ExecutionResult) -> Self {
        Self {
            kind,
            score,
            classification: Some(result.classification),
            wall_time_ms: Some(result.wall_time_ms),
        }
    }

    /// Zero-score verdict for a participant who never submitted in time
    pub fn did_not_finish() -> Self {
        Self {
            kind: VerdictKind::DidNotFinish,
            score: 0,
            classification: None,
            wall_time_ms: None,
        }
    }
}

/// One source-code attempt by a participant for a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    id: Uuid,
    user_id: Uuid,
    room_id: Uuid,
    round: u32,
    language: String,
    #[serde(skip_serializing)]
    source: String,
    submitted_at: DateTime<Utc>,
    result: Option<ExecutionResult>,
    verdict: Option<Verdict>,
    judged_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn new(
        user_id: Uuid,
        room_id: Uuid,
        round: u32,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            room_id,
            round,
            language: language.into(),
            source: source.into(),
            submitted_at: Utc::now(),
            result: None,
            verdict: None,
            judged_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn judged_at(&self) -> Option<DateTime<Utc>> {
        self.judged_at
    }

    pub fn is_evaluated(&self) -> bool {
        self.verdict.is_some()
    }

    /// Attach the one and only result/verdict pair
    pub fn record(&mut self, result: ExecutionResult, verdict: Verdict) -> AppResult<()> {
        if self.is_evaluated() {
            return Err(AppError::AlreadyEvaluated);
        }
        self.result = Some(result);
        self.verdict = Some(verdict);
        self.judged_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(classification: Classification) -> ExecutionResult {
        ExecutionResult {
            classification,
            exit_code: 0,
            stdout: String::new(),
            stdout_truncated: false,
            stderr: String::new(),
            stderr_truncated: false,
            wall_time_ms: 12,
        }
    }

    #[test]
    fn test_record_is_one_shot() {
        let mut submission = Submission::new(Uuid::new_v4(), Uuid::new_v4(), 0, "python", "");
        let res = result(Classification::Success);
        let verdict = Verdict::scored(VerdictKind::Accepted, 100, &res);

        submission.record(res.clone(), verdict.clone()).unwrap();
        assert!(submission.is_evaluated());

        let second = submission.record(res, verdict);
        assert!(matches!(second, Err(AppError::AlreadyEvaluated)));
    }

    #[test]
    fn test_failure_kinds_map_from_classification() {
        assert_eq!(VerdictKind::from_failure(Classification::Success), None);
        assert_eq!(
            VerdictKind::from_failure(Classification::Timeout),
            Some(VerdictKind::Timeout)
        );
        assert_eq!(
            VerdictKind::from_failure(Classification::CompileError),
            Some(VerdictKind::CompileError)
        );
    }

    #[test]
    fn test_source_is_not_serialized() {
        let submission = Submission::new(Uuid::new_v4(), Uuid::new_v4(), 0, "python", "secret");
        let json = serde_json::to_value(&submission).unwrap();
        assert!(json.get("source").is_none());
        assert_eq!(json["language"], "python");
    }
}
