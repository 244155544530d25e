//! Per-execution staging directories
//!
//! Every execution gets a fresh directory named after a new UUID under the
//! configured root. The [`StagingArea`] guard removes it when dropped, so
//! the directory goes away on every exit path, including timeouts, errors
//! and cancellation of the calling task.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::fs;
use uuid::Uuid;

use crate::error::AppResult;

/// What happens to a staging directory once its execution is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Remove the directory as soon as the execution finishes
    #[default]
    Always,
    /// Keep directories for inspection; never use in production
    Never,
}

impl FromStr for CleanupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown cleanup policy: {}", other)),
        }
    }
}

/// Hands out private staging directories under a root path
#[derive(Debug, Clone)]
pub struct StagingProvider {
    root: PathBuf,
    policy: CleanupPolicy,
}

impl StagingProvider {
    pub fn new(root: impl Into<PathBuf>, policy: CleanupPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    /// Create a fresh, never reused directory
    pub async fn allocate(&self) -> AppResult<StagingArea> {
        fs::create_dir_all(&self.root).await?;

        let id = Uuid::new_v4();
        let dir = self.root.join(id.to_string());
        fs::create_dir(&dir).await?;

        // Engines bind-mount by absolute path
        let path = fs::canonicalize(&dir).await?;
        let area = StagingArea {
            id,
            path,
            policy: self.policy,
        };

        // The container user differs from the host user and has no
        // capabilities, so the directory must be world-writable
        fs::set_permissions(&area.path, std::fs::Permissions::from_mode(0o777)).await?;

        tracing::debug!(staging = %area.path.display(), "Allocated staging area");
        Ok(area)
    }
}

/// Guard owning one staging directory
#[derive(Debug)]
pub struct StagingArea {
    id: Uuid,
    path: PathBuf,
    policy: CleanupPolicy,
}

impl StagingArea {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `file_name` inside the area
    pub async fn write_file(&self, file_name: &str, contents: &str) -> AppResult<PathBuf> {
        let target = self.path.join(file_name);
        fs::write(&target, contents).await?;
        fs::set_permissions(&target, std::fs::Permissions::from_mode(0o666)).await?;
        Ok(target)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.policy == CleanupPolicy::Never {
            tracing::debug!(staging = %self.path.display(), "Keeping staging area");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(staging = %self.path.display(), "Failed to remove staging area: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_areas_are_unique_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let provider = StagingProvider::new(root.path(), CleanupPolicy::Always);

        let first = provider.allocate().await.unwrap();
        let second = provider.allocate().await.unwrap();
        assert_ne!(first.path(), second.path());

        let source = first.write_file("script.py", "print('hi')").await.unwrap();
        assert_eq!(std::fs::read_to_string(&source).unwrap(), "print('hi')");

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
        assert!(second.path().exists());
    }

    #[tokio::test]
    async fn test_never_policy_keeps_directory() {
        let root = tempfile::tempdir().unwrap();
        let provider = StagingProvider::new(root.path(), CleanupPolicy::Never);

        let area = provider.allocate().await.unwrap();
        let path = area.path().to_path_buf();
        drop(area);
        assert!(path.exists());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("always".parse::<CleanupPolicy>(), Ok(CleanupPolicy::Always));
        assert_eq!("NEVER".parse::<CleanupPolicy>(), Ok(CleanupPolicy::Never));
        assert!("sometimes".parse::<CleanupPolicy>().is_err());
    }
}
