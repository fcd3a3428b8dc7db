// ABOUTME: Application-wide error types for slotswap.
// ABOUTME: Uses thiserror for ergonomic error handling; maps run outcomes to exit codes.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::platform::{ConnectError, PlatformError};
use crate::types::ParseImageRefError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("invalid image: {0}")]
    InvalidImage(#[from] ParseImageRefError),

    #[error("hook failed: {0}")]
    Hook(String),

    #[error("deployment rolled back: {0}")]
    RolledBack(String),

    #[error("deployment aborted: {0}")]
    Aborted(String),
}

impl Error {
    /// Process exit code: 2 for runs aborted before provisioning, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Aborted(_) | Error::Hook(_) => 2,
            _ => 1,
        }
    }

    /// Whether the run already printed this as its outcome.
    pub fn is_reported(&self) -> bool {
        matches!(self, Error::RolledBack(_) | Error::Aborted(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_runs_exit_with_two() {
        assert_eq!(Error::Aborted("deploy approval denied".into()).exit_code(), 2);
        assert_eq!(Error::Hook("pre-deploy hook exited with 1".into()).exit_code(), 2);
        assert_eq!(Error::RolledBack("unhealthy".into()).exit_code(), 1);
        assert_eq!(Error::ConfigNotFound(PathBuf::from(".")).exit_code(), 1);
    }
}
