// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Also defines DeployState, the observable name of each orchestrator state.

use serde::Serialize;
use std::fmt;

/// Plan computed, waiting for the operator to commit resources.
/// Available actions: `await_deploy_approval()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// Operator approved provisioning.
/// Available actions: `apply()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployApproved;

/// Platform accepted the plan; the new slot exists.
/// Available actions: `wait_rollout()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Applied;

/// New slot fully rolled out.
/// Available actions: `health_check()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct RolledOut;

/// New slot answered the health probe.
/// Available actions: `await_promote_approval()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthChecked;

/// Operator approved going live.
/// Available actions: `promote()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionApproved;

/// Traffic switched to the new slot.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Promoted;

/// New slot reverted after a failure.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct RolledBack;

/// States the orchestrator moves through, in the order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Planning,
    AwaitingDeployApproval,
    Applying,
    RolloutWaiting,
    HealthChecking,
    AwaitingPromoteApproval,
    Promoting,
    Promoted,
    RollingBack,
    RolledBack,
    Aborted,
}

impl DeployState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeployState::Promoted | DeployState::RolledBack | DeployState::Aborted
        )
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployState::Planning => "planning",
            DeployState::AwaitingDeployApproval => "awaiting deploy approval",
            DeployState::Applying => "applying",
            DeployState::RolloutWaiting => "waiting for rollout",
            DeployState::HealthChecking => "health checking",
            DeployState::AwaitingPromoteApproval => "awaiting promote approval",
            DeployState::Promoting => "promoting",
            DeployState::Promoted => "promoted",
            DeployState::RollingBack => "rolling back",
            DeployState::RolledBack => "rolled back",
            DeployState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
