// ABOUTME: Terminal classification of a deployment run.
// ABOUTME: Every run ends in exactly one of Promoted, RolledBack or Aborted.

use serde::Serialize;
use std::fmt;

use crate::types::{DeploymentColor, RoutingState};

use super::error::DeployError;
use super::state::DeployState;

/// Why a run ended before anything was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortCause {
    /// Operator denied the deploy gate.
    Denied,
    /// Deploy gate wait was interrupted.
    Cancelled,
    /// Inputs or routing state were unusable.
    PlanningFailed,
    /// Platform rejected the plan.
    ApplyFailed,
}

impl AbortCause {
    pub(crate) fn from_error(error: &DeployError) -> Self {
        match error {
            DeployError::ApprovalDenied(_) => AbortCause::Denied,
            DeployError::ApprovalCancelled(_) => AbortCause::Cancelled,
            DeployError::ApplyFailed(_) => AbortCause::ApplyFailed,
            _ => AbortCause::PlanningFailed,
        }
    }

    /// Cancelled or denied by an operator before provisioning.
    pub fn is_user_driven(&self) -> bool {
        matches!(self, AbortCause::Denied | AbortCause::Cancelled)
    }
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbortCause::Denied => "denied",
            AbortCause::Cancelled => "cancelled",
            AbortCause::PlanningFailed => "planning failed",
            AbortCause::ApplyFailed => "apply failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Promoted {
        color: DeploymentColor,
        tag: String,
    },
    RolledBack {
        color: DeploymentColor,
        reason: String,
        /// Set when reverting the slot itself failed; the slot may linger.
        rollback_error: Option<String>,
    },
    Aborted {
        cause: AbortCause,
        reason: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Promoted { .. })
    }

    pub fn classification(&self) -> &'static str {
        match self {
            Outcome::Promoted { .. } => "promoted",
            Outcome::RolledBack { .. } => "rolled_back",
            Outcome::Aborted { .. } => "aborted",
        }
    }

    pub fn terminal_state(&self) -> DeployState {
        match self {
            Outcome::Promoted { .. } => DeployState::Promoted,
            Outcome::RolledBack { .. } => DeployState::RolledBack,
            Outcome::Aborted { .. } => DeployState::Aborted,
        }
    }

    /// Human-readable reason.
    pub fn reason(&self) -> String {
        match self {
            Outcome::Promoted { color, tag } => format!("{} promoted to the {} slot", tag, color),
            Outcome::RolledBack {
                reason,
                rollback_error: None,
                ..
            } => reason.clone(),
            Outcome::RolledBack {
                reason,
                rollback_error: Some(err),
                ..
            } => format!("{} (rollback also failed: {})", reason, err),
            Outcome::Aborted { cause, reason } => format!("{}: {}", cause, reason),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Promoted { .. } => write!(f, "promoted: {}", self.reason()),
            Outcome::RolledBack { color, .. } => {
                write!(f, "rolled back {} slot: {}", color, self.reason())
            }
            Outcome::Aborted { .. } => write!(f, "aborted: {}", self.reason()),
        }
    }
}

/// Everything a caller learns from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: Outcome,
    /// States visited, in order, ending in the terminal state.
    pub trail: Vec<DeployState>,
    /// Routing before the run, if it could be read.
    pub previous: Option<RoutingState>,
    /// Slot the run targeted, once planning got that far.
    pub target: Option<DeploymentColor>,
}

impl RunReport {
    pub fn visited(&self, state: DeployState) -> bool {
        self.trail.contains(&state)
    }
}
