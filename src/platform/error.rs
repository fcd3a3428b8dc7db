// ABOUTME: Platform operation errors and runtime connection errors.
// ABOUTME: Connection failures use the SNAFU pattern so callers can match on kind().

use snafu::Snafu;
use std::time::Duration;

/// Failure of one platform operation.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The plan was refused before anything was created.
    #[error("plan rejected: {0}")]
    Rejected(String),

    #[error("{workload} did not roll out within {timeout:?}")]
    RolloutTimeout { workload: String, timeout: Duration },

    #[error("{workload} failed to roll out: {reason}")]
    RolloutFailed { workload: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    Rejected,
    RolloutTimeout,
    RolloutFailed,
    NotFound,
    Runtime,
}

impl PlatformError {
    pub fn kind(&self) -> PlatformErrorKind {
        match self {
            PlatformError::Rejected(_) => PlatformErrorKind::Rejected,
            PlatformError::RolloutTimeout { .. } => PlatformErrorKind::RolloutTimeout,
            PlatformError::RolloutFailed { .. } => PlatformErrorKind::RolloutFailed,
            PlatformError::NotFound(_) => PlatformErrorKind::NotFound,
            PlatformError::Runtime(_) => PlatformErrorKind::Runtime,
        }
    }
}

impl From<bollard::errors::Error> for PlatformError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => PlatformError::NotFound(message),
            other => PlatformError::Runtime(other.to_string()),
        }
    }
}

/// No runtime socket could be found.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,
}

/// Runtime detection or connection failed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("failed to connect to {socket}: {source}"))]
    Connection {
        socket: String,
        source: bollard::errors::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    /// No container runtime found on the system.
    NoRuntimeFound,
    /// Failed to connect to runtime socket.
    ConnectionFailed,
}

impl ConnectError {
    pub fn kind(&self) -> ConnectErrorKind {
        match self {
            ConnectError::Detection { .. } => ConnectErrorKind::NoRuntimeFound,
            ConnectError::Connection { .. } => ConnectErrorKind::ConnectionFailed,
        }
    }

    /// Socket path that could not be reached, if this is a connection failure.
    pub fn socket(&self) -> Option<&str> {
        match self {
            ConnectError::Connection { socket, .. } => Some(socket),
            _ => None,
        }
    }
}

impl From<DetectionError> for ConnectError {
    fn from(source: DetectionError) -> Self {
        ConnectError::Detection { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docker_404_maps_to_not_found() {
        let err: PlatformError = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: api-blue".to_string(),
        }
        .into();
        assert_eq!(err.kind(), PlatformErrorKind::NotFound);
    }

    #[test]
    fn detection_failure_kind() {
        let err = ConnectError::from(DetectionError::NoRuntimeFound);
        assert_eq!(err.kind(), ConnectErrorKind::NoRuntimeFound);
        assert!(err.socket().is_none());
    }
}
