// ABOUTME: State transition methods for the blue/green state machine.
// ABOUTME: Each method consumes self and returns the next state, or the current one with the error.

use std::time::Duration;

use crate::approval::{
    ApprovalChannel, ApprovalDecision, ApprovalRequest, Gate, Interrupt, request_approval,
};
use crate::health::{HealthCheckPolicy, HealthProbe, Prober};
use crate::platform::{Platform, PlatformError};

use super::Deployment;
use super::attempt::DeploymentAttempt;
use super::error::DeployError;
use super::state::{
    Applied, DeployApproved, HealthChecked, Planned, PromotionApproved, Promoted, RolledBack,
    RolledOut,
};

/// Result type for transitions that hand the deployment back on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            attempt: self.attempt,
            previous: self.previous,
            state,
        }
    }

    fn approval_request(&self, gate: Gate) -> ApprovalRequest {
        ApprovalRequest {
            gate,
            service: self.service().clone(),
            color: self.target_color(),
            image: self.image().clone(),
        }
    }

    async fn pass_gate<A: ApprovalChannel + ?Sized>(
        &self,
        gate: Gate,
        channel: &A,
        interrupt: &Interrupt,
    ) -> Result<(), DeployError> {
        let request = self.approval_request(gate);
        match request_approval(channel, &request, interrupt).await {
            ApprovalDecision::Approved => Ok(()),
            ApprovalDecision::Denied => Err(DeployError::ApprovalDenied(gate)),
            ApprovalDecision::Cancelled => Err(DeployError::ApprovalCancelled(gate)),
        }
    }

    /// Revert the new slot's workload. Routing is never touched.
    ///
    /// Reachable from any state so the orchestrator can settle a failure
    /// generically; callers must check `attempt().requires_rollback()` first.
    pub(crate) async fn revert_slot<P: Platform + ?Sized>(
        self,
        platform: &P,
    ) -> Result<Deployment<RolledBack>, DeployError> {
        let plan = self.attempt.plan();
        platform
            .rollback(plan.service(), plan.target_color())
            .await
            .map_err(|e| DeployError::RollbackFailed(e.to_string()))?;

        Ok(self.transition(RolledBack))
    }
}

// =============================================================================
// Planned -> DeployApproved
// =============================================================================

impl Deployment<Planned> {
    /// Wait for the operator to commit resources.
    #[must_use = "deployment state must be used"]
    pub async fn await_deploy_approval<A: ApprovalChannel + ?Sized>(
        self,
        channel: &A,
        interrupt: &Interrupt,
    ) -> TransitionResult<DeployApproved, Planned> {
        let result = self.pass_gate(Gate::Deploy, channel, interrupt).await;
        match result {
            Ok(()) => Ok(self.transition(DeployApproved)),
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// DeployApproved -> Applied
// =============================================================================

impl Deployment<DeployApproved> {
    /// Have the platform realize the plan.
    ///
    /// The attempt is marked created only when the platform accepts the plan;
    /// a rejection leaves nothing to revert.
    #[must_use = "deployment state must be used"]
    pub async fn apply<P: Platform + ?Sized>(
        mut self,
        platform: &P,
    ) -> TransitionResult<Applied, DeployApproved> {
        let result = platform.apply(self.attempt.plan()).await;
        match result {
            Ok(()) => {
                self.attempt.mark_created();
                Ok(self.transition(Applied))
            }
            Err(e) => Err((self, DeployError::ApplyFailed(e.to_string()))),
        }
    }
}

// =============================================================================
// Applied -> RolledOut
// =============================================================================

impl Deployment<Applied> {
    /// Wait for the new slot to report fully rolled out.
    ///
    /// Bounded by `timeout` here as well as inside the platform call.
    #[must_use = "deployment state must be used"]
    pub async fn wait_rollout<P: Platform + ?Sized>(
        self,
        platform: &P,
        timeout: Duration,
    ) -> TransitionResult<RolledOut, Applied> {
        let wait = platform.wait_rollout(self.service(), self.target_color(), timeout);
        let result = tokio::time::timeout(timeout, wait).await;

        match result {
            Ok(Ok(())) => Ok(self.transition(RolledOut)),
            Ok(Err(PlatformError::RolloutTimeout { .. })) | Err(_) => {
                Err((self, DeployError::RolloutTimeout(timeout.as_secs())))
            }
            Ok(Err(e)) => Err((self, DeployError::RolloutFailed(e.to_string()))),
        }
    }

    #[must_use = "deployment state must be used"]
    pub async fn rollback<P: Platform + ?Sized>(
        self,
        platform: &P,
    ) -> Result<Deployment<RolledBack>, DeployError> {
        self.revert_slot(platform).await
    }
}

// =============================================================================
// RolledOut -> HealthChecked
// =============================================================================

impl Deployment<RolledOut> {
    /// Poll the new slot's health endpoint. Exhausted attempts are fatal.
    #[must_use = "deployment state must be used"]
    pub async fn health_check<H: Prober>(
        self,
        probe: &HealthProbe<H>,
        policy: &HealthCheckPolicy,
    ) -> TransitionResult<HealthChecked, RolledOut> {
        tracing::info!(endpoint = %policy.endpoint, max_attempts = policy.max_attempts, "health checking new slot");
        let outcome = probe.poll(policy).await;

        if outcome.healthy {
            tracing::info!(attempts = outcome.attempts, "new slot healthy");
            return Ok(self.transition(HealthChecked));
        }

        if let Some(error) = &outcome.last_error {
            tracing::warn!(attempts = outcome.attempts, "last health probe failed: {}", error);
        }
        Err((
            self,
            DeployError::Unhealthy {
                attempts: outcome.attempts,
                last_status: outcome.last_status,
            },
        ))
    }

    #[must_use = "deployment state must be used"]
    pub async fn rollback<P: Platform + ?Sized>(
        self,
        platform: &P,
    ) -> Result<Deployment<RolledBack>, DeployError> {
        self.revert_slot(platform).await
    }
}

// =============================================================================
// HealthChecked -> PromotionApproved
// =============================================================================

impl Deployment<HealthChecked> {
    /// Wait for the operator to send live traffic to the healthy slot.
    #[must_use = "deployment state must be used"]
    pub async fn await_promote_approval<A: ApprovalChannel + ?Sized>(
        self,
        channel: &A,
        interrupt: &Interrupt,
    ) -> TransitionResult<PromotionApproved, HealthChecked> {
        let result = self.pass_gate(Gate::Promote, channel, interrupt).await;
        match result {
            Ok(()) => Ok(self.transition(PromotionApproved)),
            Err(e) => Err((self, e)),
        }
    }

    #[must_use = "deployment state must be used"]
    pub async fn rollback<P: Platform + ?Sized>(
        self,
        platform: &P,
    ) -> Result<Deployment<RolledBack>, DeployError> {
        self.revert_slot(platform).await
    }
}

// =============================================================================
// PromotionApproved -> Promoted
// =============================================================================

impl Deployment<PromotionApproved> {
    /// Switch routing to the new slot. The only write to routing in a run.
    #[must_use = "deployment state must be used"]
    pub async fn promote<P: Platform + ?Sized>(
        mut self,
        platform: &P,
    ) -> TransitionResult<Promoted, PromotionApproved> {
        let result = platform
            .set_routing_state(self.service(), self.target_color())
            .await;
        match result {
            Ok(()) => {
                self.attempt.mark_promoted();
                Ok(self.transition(Promoted))
            }
            Err(e) => Err((self, DeployError::PromotionFailed(e.to_string()))),
        }
    }

    #[must_use = "deployment state must be used"]
    pub async fn rollback<P: Platform + ?Sized>(
        self,
        platform: &P,
    ) -> Result<Deployment<RolledBack>, DeployError> {
        self.revert_slot(platform).await
    }
}

// =============================================================================
// Terminal States
// =============================================================================

impl Deployment<Promoted> {
    /// Consume the deployment and return the attempt record.
    pub fn finish(self) -> DeploymentAttempt {
        self.attempt
    }
}

impl Deployment<RolledBack> {
    /// Consume the deployment and return the attempt record.
    pub fn finish(self) -> DeploymentAttempt {
        self.attempt
    }
}
