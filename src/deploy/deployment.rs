// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Threads the attempt record and the pre-run routing state through every transition.

use crate::types::{DeploymentColor, ImageReference, RoutingState, ServiceName};

use super::attempt::DeploymentAttempt;
use super::color::select_color;
use super::error::DeployError;
use super::plan::DeploymentPlan;
use super::state::Planned;

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` restricts which transitions are callable, so
/// promoting an unchecked slot or rolling back a promoted one does not compile.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) attempt: DeploymentAttempt,
    pub(crate) previous: RoutingState,
    pub(crate) state: S,
}

impl Deployment<Planned> {
    /// Select the target slot from the live routing state and build the plan.
    pub fn new(
        service: ServiceName,
        current: RoutingState,
        image: ImageReference,
    ) -> Result<Self, DeployError> {
        let (color, note) = select_color(&current);
        if let Some(note) = note {
            tracing::warn!(service = %service, routing = %current, "{}", note);
        }

        let plan = DeploymentPlan::build(service, color, image)?;

        Ok(Deployment {
            attempt: DeploymentAttempt::new(plan),
            previous: current,
            state: Planned,
        })
    }
}

impl<S> Deployment<S> {
    pub fn attempt(&self) -> &DeploymentAttempt {
        &self.attempt
    }

    pub fn plan(&self) -> &DeploymentPlan {
        self.attempt.plan()
    }

    pub fn service(&self) -> &ServiceName {
        self.plan().service()
    }

    pub fn target_color(&self) -> DeploymentColor {
        self.plan().target_color()
    }

    pub fn image(&self) -> &ImageReference {
        self.plan().image()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Routing state observed before the run started.
    pub fn previous_routing(&self) -> &RoutingState {
        &self.previous
    }
}
