// ABOUTME: Error types for deployment operations.
// ABOUTME: One variant per failure class of the blue/green state machine, plus deploy lock errors.

use chrono::{DateTime, Utc};

use super::plan::InvalidPlanError;
use crate::approval::Gate;

/// Details about who holds a deploy lock.
#[derive(Debug, Clone)]
pub struct LockHolderInfo {
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Plan inputs are unusable.
    #[error("invalid deployment plan: {0}")]
    Planning(#[from] InvalidPlanError),

    /// Current routing state could not be read.
    #[error("failed to read routing state: {0}")]
    RoutingUnavailable(String),

    /// Health endpoint template did not resolve to a usable URL.
    #[error("invalid health endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("{0} approval denied")]
    ApprovalDenied(Gate),

    #[error("{0} approval cancelled")]
    ApprovalCancelled(Gate),

    /// Platform rejected the plan; nothing was created.
    #[error("platform rejected the plan: {0}")]
    ApplyFailed(String),

    #[error("rollout did not complete within {0} seconds")]
    RolloutTimeout(u64),

    #[error("rollout failed: {0}")]
    RolloutFailed(String),

    /// Health probe exhausted its attempts.
    #[error("new slot unhealthy after {attempts} attempt(s){}", last_status_suffix(.last_status))]
    Unhealthy {
        attempts: u32,
        last_status: Option<u16>,
    },

    /// Routing switch failed.
    #[error("promotion failed: {0}")]
    PromotionFailed(String),

    #[error("rollback failed: {0}")]
    RollbackFailed(String),

    #[error("deploy lock held by {} (pid {}) since {}", .0.holder, .0.pid, .0.started_at)]
    LockHeld(Box<LockHolderInfo>),

    #[error("deploy lock error: {0}")]
    Lock(String),
}

fn last_status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (last status {})", s))
        .unwrap_or_default()
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Planning,
    RoutingUnavailable,
    InvalidEndpoint,
    ApprovalDenied,
    ApprovalCancelled,
    ApplyFailed,
    RolloutTimeout,
    RolloutFailed,
    Unhealthy,
    PromotionFailed,
    RollbackFailed,
    LockHeld,
    Lock,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Planning(_) => DeployErrorKind::Planning,
            DeployError::RoutingUnavailable(_) => DeployErrorKind::RoutingUnavailable,
            DeployError::InvalidEndpoint(_) => DeployErrorKind::InvalidEndpoint,
            DeployError::ApprovalDenied(_) => DeployErrorKind::ApprovalDenied,
            DeployError::ApprovalCancelled(_) => DeployErrorKind::ApprovalCancelled,
            DeployError::ApplyFailed(_) => DeployErrorKind::ApplyFailed,
            DeployError::RolloutTimeout(_) => DeployErrorKind::RolloutTimeout,
            DeployError::RolloutFailed(_) => DeployErrorKind::RolloutFailed,
            DeployError::Unhealthy { .. } => DeployErrorKind::Unhealthy,
            DeployError::PromotionFailed(_) => DeployErrorKind::PromotionFailed,
            DeployError::RollbackFailed(_) => DeployErrorKind::RollbackFailed,
            DeployError::LockHeld(_) => DeployErrorKind::LockHeld,
            DeployError::Lock(_) => DeployErrorKind::Lock,
        }
    }

    /// Whether an operator decision, rather than a system failure, ended the run.
    pub fn is_user_driven(&self) -> bool {
        matches!(
            self,
            DeployError::ApprovalDenied(_) | DeployError::ApprovalCancelled(_)
        )
    }

    /// Lock holder details, if this is a lock contention error.
    pub fn lock_holder_info(&self) -> Option<&LockHolderInfo> {
        match self {
            DeployError::LockHeld(info) => Some(info),
            _ => None,
        }
    }

    pub fn lock_held(holder: String, pid: u32, started_at: DateTime<Utc>) -> Self {
        DeployError::LockHeld(Box::new(LockHolderInfo {
            holder,
            pid,
            started_at,
        }))
    }

    pub fn lock_error(message: impl Into<String>) -> Self {
        DeployError::Lock(message.into())
    }
}
