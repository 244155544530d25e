//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

/// Maximum accepted request body size (source plus JSON envelope)
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

// =============================================================================
// AUTHENTICATION DEFAULTS
// =============================================================================

/// Default JWT token expiry in hours
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

// =============================================================================
// SANDBOX DEFAULTS
// =============================================================================

/// Default number of submissions executing at the same time
pub const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 4;

/// Default ceiling for a single source payload (64 KiB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 64 * 1024;

/// Default wall-clock limit for the run step in milliseconds
pub const DEFAULT_WALL_TIMEOUT_MS: u64 = 5_000;

/// Default wall-clock limit for the compile step in milliseconds
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 30_000;

/// Default memory limit in megabytes
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

/// Default CPU quota (number of cores)
pub const DEFAULT_CPU_LIMIT: f64 = 1.0;

/// Default cap for each captured output stream
pub const DEFAULT_OUTPUT_CAP_BYTES: usize = 64 * 1024;

/// Default process limit inside a container
pub const DEFAULT_PIDS_LIMIT: i64 = 64;

/// Extra time granted to the isolation backend to kill and reap a container
/// before the sandbox gives up on it
pub const TIMEOUT_GRACE_MS: u64 = 2_000;

/// Exit code reported by the engine when the container was SIGKILLed
pub const SIGKILL_EXIT_CODE: i64 = 137;

/// Mount point of the staging directory inside the container
pub const CONTAINER_WORKDIR: &str = "/workspace";

/// Label attached to every sandbox container
pub const CONTAINER_LABEL: &str = "coderoom.submission";

/// Engine-side log file size, as a multiple of the output cap. Output past
/// it rotates away, so a flooding program cannot fill the engine's disk.
pub const LOG_RETENTION_FACTOR: usize = 16;

/// Floor for the engine-side log file size (1 MiB)
pub const MIN_LOG_RETENTION_BYTES: usize = 1024 * 1024;

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const JAVA: &str = "java";
    pub const PYTHON: &str = "python";
    pub const JAVASCRIPT: &str = "javascript";
    pub const CPP: &str = "cpp";
    pub const RUST: &str = "rust";

    /// All supported language identifiers
    pub const ALL: &[&str] = &[JAVA, PYTHON, JAVASCRIPT, CPP, RUST];
}

/// Default container images for each language
pub mod container_images {
    pub const JAVA: &str = "openjdk:17";
    pub const PYTHON: &str = "python:3.9";
    pub const JAVASCRIPT: &str = "node:alpine";
    pub const CPP: &str = "gcc:14";
    pub const RUST: &str = "rust:1.85-slim";
}

// =============================================================================
// ROOM SETTINGS
// =============================================================================

/// Minimum number of participants required to start a round
pub const MIN_PARTICIPANTS_TO_START: usize = 2;

/// Default room capacity
pub const DEFAULT_ROOM_CAPACITY: usize = 4;

/// Maximum room capacity
pub const MAX_ROOM_CAPACITY: usize = 16;

/// Score awarded for an accepted submission
pub const DEFAULT_FULL_SCORE: u32 = 100;

/// Maximum room title length
pub const MAX_ROOM_TITLE_LENGTH: u64 = 128;

/// Maximum number of rounds (problems) in a room
pub const MAX_ROOM_ROUNDS: u64 = 20;

/// Maximum expected output size in bytes
pub const MAX_EXPECTED_OUTPUT_SIZE: u64 = 64 * 1024;
