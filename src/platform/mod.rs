// ABOUTME: Orchestration platform contract consumed by the deployment state machine.
// ABOUTME: Implemented over the Docker API and in memory.

mod docker;
mod error;
mod memory;
mod runtime;

pub use docker::{DockerPlatform, WorkloadSpec};
pub use error::{
    ConnectError, ConnectErrorKind, DetectionError, PlatformError, PlatformErrorKind,
};
pub use memory::{MemoryPlatform, PlatformCall, PlatformOp};
pub use runtime::{RuntimeConfig, RuntimeInfo, RuntimeType, detect_local, resolve_runtime};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::deploy::DeploymentPlan;
use crate::types::{DeploymentColor, RoutingState, ServiceName};

/// Labels attached to every slot workload.
pub const LABEL_SERVICE: &str = "slotswap.service";
pub const LABEL_MANAGED: &str = "slotswap.managed";
pub const LABEL_SLOT: &str = "slotswap.slot";

/// Observed state of one slot, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub color: DeploymentColor,
    pub workload: String,
    pub image: Option<String>,
    pub running: bool,
}

/// The cluster or runtime that owns slot workloads and the routing pointer.
///
/// `set_routing_state` must be atomic and idempotent: repeating it with the
/// live color succeeds without an observable change. `rollback` only ever
/// touches the named slot's workload, never routing.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn routing_state(&self, service: &ServiceName) -> Result<RoutingState, PlatformError>;

    /// Create or replace the target slot's workload.
    async fn apply(&self, plan: &DeploymentPlan) -> Result<(), PlatformError>;

    async fn wait_rollout(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
        timeout: Duration,
    ) -> Result<(), PlatformError>;

    async fn set_routing_state(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError>;

    async fn rollback(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError>;

    /// Workloads currently present for the service.
    async fn slots(&self, service: &ServiceName) -> Result<Vec<SlotStatus>, PlatformError>;
}

#[async_trait]
impl<T: Platform + ?Sized> Platform for Arc<T> {
    async fn routing_state(&self, service: &ServiceName) -> Result<RoutingState, PlatformError> {
        (**self).routing_state(service).await
    }

    async fn apply(&self, plan: &DeploymentPlan) -> Result<(), PlatformError> {
        (**self).apply(plan).await
    }

    async fn wait_rollout(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
        timeout: Duration,
    ) -> Result<(), PlatformError> {
        (**self).wait_rollout(service, color, timeout).await
    }

    async fn set_routing_state(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError> {
        (**self).set_routing_state(service, color).await
    }

    async fn rollback(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError> {
        (**self).rollback(service, color).await
    }

    async fn slots(&self, service: &ServiceName) -> Result<Vec<SlotStatus>, PlatformError> {
        (**self).slots(service).await
    }
}
