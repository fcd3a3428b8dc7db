// ABOUTME: Deploy lock preventing concurrent runs against the same service.
// ABOUTME: Atomic create-new lock file under the local state directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::types::ServiceName;

use super::DeployError;

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub service: String,
}

impl LockInfo {
    pub fn new(service: &ServiceName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            service: service.to_string(),
        }
    }

    /// Locks older than one hour are considered abandoned.
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    pub fn lock_path(state_dir: &Path, service: &ServiceName) -> PathBuf {
        state_dir.join(format!("{}.lock", service))
    }
}

/// Directory holding lock files.
///
/// `SLOTSWAP_STATE_DIR`, then `$XDG_STATE_HOME/slotswap`, then
/// `$HOME/.local/state/slotswap`.
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SLOTSWAP_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(dir).join("slotswap");
    }
    let home = std::env::var_os("HOME").unwrap_or_else(|| ".".into());
    PathBuf::from(home).join(".local/state/slotswap")
}

/// A held deploy lock; released on drop if not released explicitly.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    released: bool,
}

impl DeployLock {
    /// Acquire the lock for `service`.
    ///
    /// Stale (>1 hour), unreadable and, with `force`, any existing lock is
    /// broken with a warning. A live lock yields `DeployError::LockHeld`.
    pub fn acquire(
        state_dir: &Path,
        service: &ServiceName,
        force: bool,
    ) -> Result<Self, DeployError> {
        std::fs::create_dir_all(state_dir).map_err(|e| {
            DeployError::lock_error(format!(
                "failed to create state directory {}: {}",
                state_dir.display(),
                e
            ))
        })?;

        let path = LockInfo::lock_path(state_dir, service);
        let info = LockInfo::new(service);

        if Self::try_create(&path, &info)? {
            return Ok(Self {
                path,
                released: false,
            });
        }

        if !Self::should_break(&path, force)? {
            return Err(match Self::read(&path) {
                Some(existing) => {
                    DeployError::lock_held(existing.holder, existing.pid, existing.started_at)
                }
                None => DeployError::lock_error("lock held by another process"),
            });
        }

        tracing::debug!(path = %path.display(), "removing stale or forced lock");
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DeployError::lock_error(format!(
                    "failed to break lock: {}",
                    e
                )));
            }
        }

        if Self::try_create(&path, &info)? {
            Ok(Self {
                path,
                released: false,
            })
        } else {
            Err(DeployError::lock_error(
                "lock acquired by another process during break",
            ))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the lock file; `Ok(false)` if it already exists.
    fn try_create(path: &Path, info: &LockInfo) -> Result<bool, DeployError> {
        let json = serde_json::to_string(info)
            .map_err(|e| DeployError::lock_error(format!("failed to serialize lock: {}", e)))?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(DeployError::lock_error(format!(
                    "failed to acquire lock: {}",
                    e
                )));
            }
        };

        file.write_all(json.as_bytes())
            .map_err(|e| DeployError::lock_error(format!("failed to write lock: {}", e)))?;
        Ok(true)
    }

    fn read(path: &Path) -> Option<LockInfo> {
        let contents = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn should_break(path: &Path, force: bool) -> Result<bool, DeployError> {
        let Some(existing) = Self::read(path) else {
            if path.exists() {
                tracing::warn!("lock info unreadable, breaking lock");
            }
            return Ok(true);
        };

        if force {
            tracing::warn!(
                "breaking lock held by {} (pid {}) since {}",
                existing.holder,
                existing.pid,
                existing.started_at
            );
            Ok(true)
        } else if existing.is_stale() {
            tracing::warn!(
                "auto-breaking stale lock held by {} (pid {}) since {}",
                existing.holder,
                existing.pid,
                existing.started_at
            );
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<(), DeployError> {
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeployError::lock_error(format!(
                "failed to release lock {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let service = ServiceName::new("test-service").unwrap();
        let info = LockInfo::new(&service);

        assert_eq!(info.service, "test-service");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn lock_path_is_per_service() {
        let service = ServiceName::new("myapp").unwrap();
        assert_eq!(
            LockInfo::lock_path(Path::new("/var/lib/slotswap"), &service),
            PathBuf::from("/var/lib/slotswap/myapp.lock")
        );
    }

    #[test]
    fn old_lock_is_stale() {
        let service = ServiceName::new("test").unwrap();
        let mut info = LockInfo::new(&service);
        assert!(!info.is_stale());

        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }
}
