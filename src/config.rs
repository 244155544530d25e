//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{
    self, DEFAULT_COMPILE_TIMEOUT_MS, DEFAULT_CPU_LIMIT, DEFAULT_FULL_SCORE,
    DEFAULT_JWT_EXPIRY_HOURS, DEFAULT_MAX_CONCURRENT_EXECUTIONS, DEFAULT_MAX_SOURCE_BYTES,
    DEFAULT_MEMORY_LIMIT_MB, DEFAULT_OUTPUT_CAP_BYTES, DEFAULT_PIDS_LIMIT, DEFAULT_ROOM_CAPACITY,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_WALL_TIMEOUT_MS, MAX_ROOM_CAPACITY,
};
use crate::sandbox::{CleanupPolicy, ExecutionLimits};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub docker: DockerConfig,
    pub sandbox: SandboxConfig,
    pub room: RoomConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// JWT configuration for resolving the calling principal
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

/// Docker engine connection settings
#[derive(Debug, Clone)]
pub struct DockerConfig {
    /// Unix socket path; `None` uses the engine defaults
    pub socket_path: Option<String>,
}

/// Execution sandbox configuration
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Directory under which per-submission staging directories are created
    pub staging_root: PathBuf,
    pub cleanup_policy: CleanupPolicy,
    /// Number of submissions allowed to execute concurrently
    pub max_concurrency: usize,
    /// Largest accepted source payload in bytes
    pub max_source_bytes: usize,
    pub wall_timeout_ms: u64,
    pub compile_timeout_ms: u64,
    pub memory_limit_mb: u64,
    /// CPU quota in cores
    pub cpu_limit: f64,
    /// Cap applied to stdout and stderr independently
    pub output_cap_bytes: usize,
    pub pids_limit: i64,
    /// Per-language image overrides (`RUNTIME_IMAGE_<LANG>`)
    pub image_overrides: HashMap<String, String>,
}

/// Room defaults
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub default_capacity: usize,
    pub max_capacity: usize,
    /// Score awarded for an accepted submission
    pub full_score: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            docker: DockerConfig::from_env(),
            sandbox: SandboxConfig::from_env()?,
            room: RoomConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
            expiry_hours: parse_var("JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS)?,
        })
    }
}

impl DockerConfig {
    fn from_env() -> Self {
        Self {
            socket_path: env::var("DOCKER_SOCKET").ok().filter(|s| !s.is_empty()),
        }
    }
}

impl SandboxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut image_overrides = HashMap::new();
        for language in constants::languages::ALL {
            let key = format!("RUNTIME_IMAGE_{}", language.to_uppercase());
            if let Ok(image) = env::var(&key) {
                if image.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(key));
                }
                image_overrides.insert((*language).to_string(), image);
            }
        }

        let config = Self {
            staging_root: env::var("SANDBOX_STAGING_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_root),
            cleanup_policy: parse_var("SANDBOX_CLEANUP_POLICY", defaults.cleanup_policy)?,
            max_concurrency: parse_var("SANDBOX_MAX_CONCURRENCY", defaults.max_concurrency)?,
            max_source_bytes: parse_var("SANDBOX_MAX_SOURCE_BYTES", defaults.max_source_bytes)?,
            wall_timeout_ms: parse_var("SANDBOX_WALL_TIMEOUT_MS", defaults.wall_timeout_ms)?,
            compile_timeout_ms: parse_var(
                "SANDBOX_COMPILE_TIMEOUT_MS",
                defaults.compile_timeout_ms,
            )?,
            memory_limit_mb: parse_var("SANDBOX_MEMORY_LIMIT_MB", defaults.memory_limit_mb)?,
            cpu_limit: parse_var("SANDBOX_CPU_LIMIT", defaults.cpu_limit)?,
            output_cap_bytes: parse_var("SANDBOX_OUTPUT_CAP_BYTES", defaults.output_cap_bytes)?,
            pids_limit: parse_var("SANDBOX_PIDS_LIMIT", defaults.pids_limit)?,
            image_overrides,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue("SANDBOX_MAX_CONCURRENCY".to_string()));
        }
        if self.wall_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("SANDBOX_WALL_TIMEOUT_MS".to_string()));
        }
        if self.cpu_limit <= 0.0 {
            return Err(ConfigError::InvalidValue("SANDBOX_CPU_LIMIT".to_string()));
        }
        Ok(())
    }

    /// Limits applied to the run step of every submission
    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            wall_timeout: Duration::from_millis(self.wall_timeout_ms),
            cpu_quota: self.cpu_limit,
            memory_quota_bytes: self.memory_limit_mb * 1024 * 1024,
            output_byte_cap: self.output_cap_bytes,
        }
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            staging_root: env::temp_dir().join("coderoom"),
            cleanup_policy: CleanupPolicy::Always,
            max_concurrency: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            wall_timeout_ms: DEFAULT_WALL_TIMEOUT_MS,
            compile_timeout_ms: DEFAULT_COMPILE_TIMEOUT_MS,
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
            cpu_limit: DEFAULT_CPU_LIMIT,
            output_cap_bytes: DEFAULT_OUTPUT_CAP_BYTES,
            pids_limit: DEFAULT_PIDS_LIMIT,
            image_overrides: HashMap::new(),
        }
    }
}

impl RoomConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            default_capacity: parse_var("ROOM_DEFAULT_CAPACITY", DEFAULT_ROOM_CAPACITY)?,
            max_capacity: parse_var("ROOM_MAX_CAPACITY", MAX_ROOM_CAPACITY)?,
            full_score: parse_var("ROOM_FULL_SCORE", DEFAULT_FULL_SCORE)?,
        };

        if config.default_capacity > config.max_capacity {
            return Err(ConfigError::InvalidValue("ROOM_DEFAULT_CAPACITY".to_string()));
        }
        Ok(config)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_ROOM_CAPACITY,
            max_capacity: MAX_ROOM_CAPACITY,
            full_score: DEFAULT_FULL_SCORE,
        }
    }
}

/// Read `key` from the environment, falling back to `default` when unset
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
