// ABOUTME: Per-run record of what has been committed to the platform.
// ABOUTME: The created flag is the only input to the rollback decision.

use super::plan::DeploymentPlan;

/// Progress of one deployment run.
///
/// `promoted` implies `created`. Rollback is required exactly when the slot
/// was created but never promoted.
#[derive(Debug, Clone)]
pub struct DeploymentAttempt {
    plan: DeploymentPlan,
    created: bool,
    promoted: bool,
}

impl DeploymentAttempt {
    pub(crate) fn new(plan: DeploymentPlan) -> Self {
        Self {
            plan,
            created: false,
            promoted: false,
        }
    }

    pub fn plan(&self) -> &DeploymentPlan {
        &self.plan
    }

    pub fn created(&self) -> bool {
        self.created
    }

    pub fn promoted(&self) -> bool {
        self.promoted
    }

    pub fn requires_rollback(&self) -> bool {
        self.created && !self.promoted
    }

    pub(crate) fn mark_created(&mut self) {
        self.created = true;
    }

    pub(crate) fn mark_promoted(&mut self) {
        debug_assert!(self.created, "promotion before the slot was created");
        self.promoted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeploymentColor, ImageReference, ServiceName};

    fn attempt() -> DeploymentAttempt {
        let plan = DeploymentPlan::build(
            ServiceName::new("api").unwrap(),
            DeploymentColor::Blue,
            ImageReference::new("ghcr.io", "acme/api", "1.0.0"),
        )
        .unwrap();
        DeploymentAttempt::new(plan)
    }

    #[test]
    fn fresh_attempt_needs_no_rollback() {
        let attempt = attempt();
        assert!(!attempt.created());
        assert!(!attempt.requires_rollback());
    }

    #[test]
    fn created_attempt_needs_rollback_until_promoted() {
        let mut attempt = attempt();
        attempt.mark_created();
        assert!(attempt.requires_rollback());

        attempt.mark_promoted();
        assert!(attempt.promoted());
        assert!(!attempt.requires_rollback());
    }
}
