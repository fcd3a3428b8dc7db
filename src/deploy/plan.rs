// ABOUTME: Declarative target state for a single release.
// ABOUTME: Built once per run; handed to the platform's apply operation unchanged.

use serde::Serialize;
use thiserror::Error;

use crate::types::{DeploymentColor, ImageReference, ServiceName};

/// Plan inputs that cannot be deployed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidPlanError {
    #[error("image reference has an empty registry")]
    EmptyRegistry,

    #[error("image reference has an empty name")]
    EmptyName,

    #[error("image reference has an empty tag")]
    EmptyTag,
}

/// What the platform should realize: this image in this slot of this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPlan {
    service: ServiceName,
    target_color: DeploymentColor,
    image: ImageReference,
}

impl DeploymentPlan {
    /// Build the plan, rejecting image references with empty parts.
    pub fn build(
        service: ServiceName,
        target_color: DeploymentColor,
        image: ImageReference,
    ) -> Result<Self, InvalidPlanError> {
        if image.registry().trim().is_empty() {
            return Err(InvalidPlanError::EmptyRegistry);
        }
        if image.name().trim().is_empty() {
            return Err(InvalidPlanError::EmptyName);
        }
        if image.tag().trim().is_empty() {
            return Err(InvalidPlanError::EmptyTag);
        }

        Ok(Self {
            service,
            target_color,
            image,
        })
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn target_color(&self) -> DeploymentColor {
        self.target_color
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    /// Name of the workload created for the target slot.
    pub fn workload_name(&self) -> String {
        self.service.slot_name(self.target_color)
    }
}
