// ABOUTME: Top-level blue/green control loop composing selector, planner, probe and gates.
// ABOUTME: Maps every failure to exactly one of rollback or abort based on deployment progress.

use std::time::Duration;

use crate::approval::{ApprovalChannel, Interrupt};
use crate::config::HealthcheckConfig;
use crate::health::{HealthProbe, Prober};
use crate::platform::Platform;
use crate::types::{DeploymentColor, ImageReference, RoutingState, ServiceName};

use super::Deployment;
use super::error::DeployError;
use super::outcome::{AbortCause, Outcome, RunReport};
use super::state::DeployState;

/// Per-run constants.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub health: HealthcheckConfig,
    pub rollout_timeout: Duration,
}

impl DeploySettings {
    pub const DEFAULT_ROLLOUT_TIMEOUT: Duration = Duration::from_secs(300);
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            health: HealthcheckConfig::default(),
            rollout_timeout: Self::DEFAULT_ROLLOUT_TIMEOUT,
        }
    }
}

/// Visited states, logged as they are entered.
struct Trail<'a> {
    service: &'a ServiceName,
    states: Vec<DeployState>,
    previous: Option<RoutingState>,
    target: Option<DeploymentColor>,
}

impl<'a> Trail<'a> {
    fn new(service: &'a ServiceName) -> Self {
        Self {
            service,
            states: Vec::new(),
            previous: None,
            target: None,
        }
    }

    fn enter(&mut self, state: DeployState) {
        tracing::info!(service = %self.service, state = %state, "deployment state");
        self.states.push(state);
    }

    fn abort(self, error: DeployError) -> RunReport {
        let cause = AbortCause::from_error(&error);
        tracing::warn!(service = %self.service, cause = %cause, "aborting deployment: {}", error);
        self.finish(Outcome::Aborted {
            cause,
            reason: error.to_string(),
        })
    }

    fn finish(mut self, outcome: Outcome) -> RunReport {
        self.enter(outcome.terminal_state());
        RunReport {
            outcome,
            trail: self.states,
            previous: self.previous,
            target: self.target,
        }
    }
}

/// Drives one release through the state machine.
pub struct Orchestrator<P, A, H> {
    platform: P,
    approvals: A,
    probe: HealthProbe<H>,
    settings: DeploySettings,
    interrupt: Interrupt,
}

impl<P, A, H> Orchestrator<P, A, H>
where
    P: Platform,
    A: ApprovalChannel,
    H: Prober,
{
    pub fn new(platform: P, approvals: A, prober: H, settings: DeploySettings) -> Self {
        Self {
            platform,
            approvals,
            probe: HealthProbe::new(prober),
            settings,
            interrupt: Interrupt::never(),
        }
    }

    /// Cancel pending gates when `interrupt` is raised.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn approvals(&self) -> &A {
        &self.approvals
    }

    pub fn prober(&self) -> &H {
        self.probe.prober()
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// Deploy `image` into the inactive slot of `service`.
    ///
    /// Never returns an error: every failure is folded into the outcome.
    pub async fn run(&self, service: &ServiceName, image: &ImageReference) -> RunReport {
        let mut trail = Trail::new(service);
        trail.enter(DeployState::Planning);

        let current = match self.platform.routing_state(service).await {
            Ok(current) => current,
            Err(e) => return trail.abort(DeployError::RoutingUnavailable(e.to_string())),
        };
        trail.previous = Some(current.clone());

        let planned = match Deployment::new(service.clone(), current, image.clone()) {
            Ok(planned) => planned,
            Err(e) => return trail.abort(e),
        };
        let color = planned.target_color();
        trail.target = Some(color);

        let policy = match self.settings.health.policy(service, color) {
            Ok(policy) => policy,
            Err(e) => return trail.abort(DeployError::InvalidEndpoint(e.to_string())),
        };
        tracing::info!(service = %service, color = %color, image = %image, "planned deployment");

        trail.enter(DeployState::AwaitingDeployApproval);
        let approved = match planned
            .await_deploy_approval(&self.approvals, &self.interrupt)
            .await
        {
            Ok(d) => d,
            Err((d, e)) => return self.settle(d, e, trail).await,
        };

        trail.enter(DeployState::Applying);
        let applied = match approved.apply(&self.platform).await {
            Ok(d) => d,
            Err((d, e)) => return self.settle(d, e, trail).await,
        };

        trail.enter(DeployState::RolloutWaiting);
        let rolled_out = match applied
            .wait_rollout(&self.platform, self.settings.rollout_timeout)
            .await
        {
            Ok(d) => d,
            Err((d, e)) => return self.settle(d, e, trail).await,
        };

        trail.enter(DeployState::HealthChecking);
        let healthy = match rolled_out.health_check(&self.probe, &policy).await {
            Ok(d) => d,
            Err((d, e)) => return self.settle(d, e, trail).await,
        };

        trail.enter(DeployState::AwaitingPromoteApproval);
        let approved = match healthy
            .await_promote_approval(&self.approvals, &self.interrupt)
            .await
        {
            Ok(d) => d,
            Err((d, e)) => return self.settle(d, e, trail).await,
        };

        trail.enter(DeployState::Promoting);
        let promoted = match approved.promote(&self.platform).await {
            Ok(d) => d,
            Err((d, e)) => return self.settle(d, e, trail).await,
        };

        let attempt = promoted.finish();
        trail.finish(Outcome::Promoted {
            color: attempt.plan().target_color(),
            tag: attempt.plan().image().tag().to_string(),
        })
    }

    /// Route a failure by progress: roll back what was created, abort otherwise.
    async fn settle<S>(
        &self,
        deployment: Deployment<S>,
        error: DeployError,
        mut trail: Trail<'_>,
    ) -> RunReport {
        if !deployment.attempt().requires_rollback() {
            return trail.abort(error);
        }

        let color = deployment.target_color();
        tracing::warn!(service = %deployment.service(), color = %color, "rolling back: {}", error);
        trail.enter(DeployState::RollingBack);

        // Best effort: a failed rollback is reported, never retried.
        let rollback_error = match deployment.revert_slot(&self.platform).await {
            Ok(rolled_back) => {
                rolled_back.finish();
                None
            }
            Err(e) => {
                tracing::error!(color = %color, "{}", e);
                Some(e.to_string())
            }
        };

        trail.finish(Outcome::RolledBack {
            color,
            reason: error.to_string(),
            rollback_error,
        })
    }
}
