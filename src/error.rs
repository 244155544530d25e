//! Custom error types and handling
//!
//! Every core operation returns [`AppResult`]. Variants are grouped into the
//! categories of [`ErrorCategory`] and mapped to HTTP responses exactly once,
//! in the [`IntoResponse`] implementation below.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Source payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Room not found: {0}")]
    RoomNotFound(uuid::Uuid),

    #[error("User is not a participant of this room")]
    NotParticipant,

    #[error("Submission not found: {0}")]
    SubmissionNotFound(uuid::Uuid),

    // State conflicts
    #[error("Room is full")]
    RoomFull,

    #[error("User already joined this room")]
    AlreadyJoined,

    #[error("Not all participants are ready: {0}")]
    NotAllReady(String),

    #[error("Room is {actual}, operation requires {expected}")]
    InvalidRoomState { expected: String, actual: String },

    #[error("A submission for this round is already executing")]
    SubmissionInFlight,

    #[error("Participant already submitted in this round")]
    AlreadySubmitted,

    #[error("Submission has already been evaluated")]
    AlreadyEvaluated,

    #[error("Round {0} is already closed")]
    RoundClosed(u32),

    #[error("Round is not complete: {0}")]
    RoundNotComplete(String),

    // Infrastructure failures
    #[error("Sandbox unavailable: {0}")]
    SandboxUnavailable(String),

    #[error("Internal execution failure: {0}")]
    InternalExecutionFailure(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification used by callers to decide whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input; never retried
    ClientError,
    /// Rejected because of the current room/submission state; retry after it changes
    StateConflict,
    /// Isolation or internal fault; the whole submission may be retried
    InfrastructureFailure,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    /// Whether resubmitting the same request may succeed
    pub retryable: bool,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnsupportedLanguage(_) => "UNSUPPORTED_LANGUAGE",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::NotParticipant => "NOT_PARTICIPANT",
            Self::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::AlreadyJoined => "ALREADY_JOINED",
            Self::NotAllReady(_) => "NOT_ALL_READY",
            Self::InvalidRoomState { .. } => "INVALID_ROOM_STATE",
            Self::SubmissionInFlight => "SUBMISSION_IN_FLIGHT",
            Self::AlreadySubmitted => "ALREADY_SUBMITTED",
            Self::AlreadyEvaluated => "ALREADY_EVALUATED",
            Self::RoundClosed(_) => "ROUND_CLOSED",
            Self::RoundNotComplete(_) => "ROUND_NOT_COMPLETE",
            Self::SandboxUnavailable(_) => "SANDBOX_UNAVAILABLE",
            Self::InternalExecutionFailure(_) => "INTERNAL_EXECUTION_FAILURE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Get the category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_)
            | Self::UnsupportedLanguage(_)
            | Self::PayloadTooLarge { .. }
            | Self::Unauthorized
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::RoomNotFound(_)
            | Self::NotParticipant
            | Self::SubmissionNotFound(_) => ErrorCategory::ClientError,
            Self::RoomFull
            | Self::AlreadyJoined
            | Self::NotAllReady(_)
            | Self::InvalidRoomState { .. }
            | Self::SubmissionInFlight
            | Self::AlreadySubmitted
            | Self::AlreadyEvaluated
            | Self::RoundClosed(_)
            | Self::RoundNotComplete(_) => ErrorCategory::StateConflict,
            Self::SandboxUnavailable(_)
            | Self::InternalExecutionFailure(_)
            | Self::Internal(_)
            | Self::Configuration(_) => ErrorCategory::InfrastructureFailure,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::RoomNotFound(_) | Self::SubmissionNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotParticipant => StatusCode::FORBIDDEN,
            Self::RoomFull
            | Self::AlreadyJoined
            | Self::NotAllReady(_)
            | Self::InvalidRoomState { .. }
            | Self::SubmissionInFlight
            | Self::AlreadySubmitted
            | Self::AlreadyEvaluated
            | Self::RoundClosed(_)
            | Self::RoundNotComplete(_) => StatusCode::CONFLICT,
            Self::SandboxUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalExecutionFailure(_) | Self::Internal(_) | Self::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the caller may safely retry the whole operation
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::InfrastructureFailure
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::InternalExecutionFailure(e) => {
                tracing::error!("Execution failure: {}", e);
                "Submission could not be executed".to_string()
            }
            AppError::SandboxUnavailable(e) => {
                tracing::error!("Sandbox unavailable: {}", e);
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                category: self.category(),
                message,
                retryable: self.is_retryable(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<bollard::errors::Error> for AppError {
    fn from(err: bollard::errors::Error) -> Self {
        use bollard::errors::Error as DockerError;

        match err {
            DockerError::SocketNotFoundError { .. }
            | DockerError::IOError { .. }
            | DockerError::HyperResponseError { .. } => {
                AppError::SandboxUnavailable(err.to_string())
            }
            DockerError::DockerResponseServerError {
                status_code: 404,
                message,
            } => AppError::SandboxUnavailable(format!("runtime image missing: {}", message)),
            _ => AppError::InternalExecutionFailure(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalExecutionFailure(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
