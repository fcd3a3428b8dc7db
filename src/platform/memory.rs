// ABOUTME: In-memory platform that records every call and can inject faults.
// ABOUTME: Models the platform contract exactly; used by tests and dry runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::{Platform, PlatformError, SlotStatus};
use crate::deploy::DeploymentPlan;
use crate::types::{DeploymentColor, RoutingState, ServiceName};

/// Platform operations, used to target fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformOp {
    RoutingState,
    Apply,
    WaitRollout,
    SetRoutingState,
    Rollback,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    RoutingState(ServiceName),
    Apply {
        service: ServiceName,
        color: DeploymentColor,
        image: String,
    },
    WaitRollout {
        service: ServiceName,
        color: DeploymentColor,
    },
    SetRoutingState {
        service: ServiceName,
        color: DeploymentColor,
    },
    Rollback {
        service: ServiceName,
        color: DeploymentColor,
    },
}

#[derive(Debug, Clone)]
struct Workload {
    image: String,
    rolled_out: bool,
}

#[derive(Debug, Default)]
struct Inner {
    routing: HashMap<ServiceName, RoutingState>,
    workloads: HashMap<(ServiceName, DeploymentColor), Workload>,
    calls: Vec<PlatformCall>,
    faults: HashMap<PlatformOp, String>,
    stalled: HashSet<PlatformOp>,
    routing_changes: usize,
}

/// Thread-safe in-memory platform.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    inner: Mutex<Inner>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the live routing state of a service.
    pub fn with_routing(self, service: &ServiceName, state: RoutingState) -> Self {
        self.inner.lock().routing.insert(service.clone(), state);
        self
    }

    /// Seed an existing, rolled-out slot workload.
    pub fn with_workload(
        self,
        service: &ServiceName,
        color: DeploymentColor,
        image: impl Into<String>,
    ) -> Self {
        self.inner.lock().workloads.insert(
            (service.clone(), color),
            Workload {
                image: image.into(),
                rolled_out: true,
            },
        );
        self
    }

    /// Make every call to `op` fail with `message`.
    pub fn fail(&self, op: PlatformOp, message: impl Into<String>) {
        self.inner.lock().faults.insert(op, message.into());
    }

    /// Make every call to `op` hang until the caller gives up.
    pub fn stall(&self, op: PlatformOp) {
        self.inner.lock().stalled.insert(op);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of recorded calls to `op`.
    pub fn count(&self, op: PlatformOp) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    pub fn routing_of(&self, service: &ServiceName) -> RoutingState {
        self.inner
            .lock()
            .routing
            .get(service)
            .cloned()
            .unwrap_or(RoutingState::Absent)
    }

    /// Number of times a routing write actually changed the live color.
    pub fn routing_changes(&self) -> usize {
        self.inner.lock().routing_changes
    }

    pub fn has_workload(&self, service: &ServiceName, color: DeploymentColor) -> bool {
        self.inner
            .lock()
            .workloads
            .contains_key(&(service.clone(), color))
    }

    /// Record the call, then report any injected fault or stall for it.
    async fn enter(&self, call: PlatformCall) -> Result<(), PlatformError> {
        let op = call.op();
        let (fault, stalled) = {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            (inner.faults.get(&op).cloned(), inner.stalled.contains(&op))
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        match fault {
            Some(message) => Err(fault_error(op, message)),
            None => Ok(()),
        }
    }
}

impl PlatformCall {
    pub fn op(&self) -> PlatformOp {
        match self {
            PlatformCall::RoutingState(_) => PlatformOp::RoutingState,
            PlatformCall::Apply { .. } => PlatformOp::Apply,
            PlatformCall::WaitRollout { .. } => PlatformOp::WaitRollout,
            PlatformCall::SetRoutingState { .. } => PlatformOp::SetRoutingState,
            PlatformCall::Rollback { .. } => PlatformOp::Rollback,
        }
    }
}

fn fault_error(op: PlatformOp, message: String) -> PlatformError {
    match op {
        PlatformOp::Apply => PlatformError::Rejected(message),
        PlatformOp::WaitRollout => PlatformError::RolloutFailed {
            workload: "memory".to_string(),
            reason: message,
        },
        _ => PlatformError::Runtime(message),
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn routing_state(&self, service: &ServiceName) -> Result<RoutingState, PlatformError> {
        self.enter(PlatformCall::RoutingState(service.clone()))
            .await?;
        Ok(self.routing_of(service))
    }

    async fn apply(&self, plan: &DeploymentPlan) -> Result<(), PlatformError> {
        self.enter(PlatformCall::Apply {
            service: plan.service().clone(),
            color: plan.target_color(),
            image: plan.image().to_string(),
        })
        .await?;

        let mut inner = self.inner.lock();
        if inner.routing.get(plan.service()).and_then(RoutingState::live_color)
            == Some(plan.target_color())
        {
            return Err(PlatformError::Rejected(format!(
                "{} is live",
                plan.workload_name()
            )));
        }
        inner.workloads.insert(
            (plan.service().clone(), plan.target_color()),
            Workload {
                image: plan.image().to_string(),
                rolled_out: false,
            },
        );
        Ok(())
    }

    async fn wait_rollout(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
        _timeout: Duration,
    ) -> Result<(), PlatformError> {
        self.enter(PlatformCall::WaitRollout {
            service: service.clone(),
            color,
        })
        .await?;

        let mut inner = self.inner.lock();
        match inner.workloads.get_mut(&(service.clone(), color)) {
            Some(workload) => {
                workload.rolled_out = true;
                Ok(())
            }
            None => Err(PlatformError::NotFound(service.slot_name(color))),
        }
    }

    async fn set_routing_state(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError> {
        self.enter(PlatformCall::SetRoutingState {
            service: service.clone(),
            color,
        })
        .await?;

        let mut inner = self.inner.lock();
        let current = inner.routing.get(service).and_then(RoutingState::live_color);
        if current == Some(color) {
            return Ok(());
        }
        if !inner.workloads.contains_key(&(service.clone(), color)) {
            return Err(PlatformError::NotFound(service.slot_name(color)));
        }
        inner
            .routing
            .insert(service.clone(), RoutingState::Live(color));
        inner.routing_changes += 1;
        Ok(())
    }

    async fn rollback(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError> {
        self.enter(PlatformCall::Rollback {
            service: service.clone(),
            color,
        })
        .await?;

        self.inner.lock().workloads.remove(&(service.clone(), color));
        Ok(())
    }

    async fn slots(&self, service: &ServiceName) -> Result<Vec<SlotStatus>, PlatformError> {
        let inner = self.inner.lock();
        let mut slots: Vec<SlotStatus> = [DeploymentColor::Blue, DeploymentColor::Green]
            .into_iter()
            .filter_map(|color| {
                inner
                    .workloads
                    .get(&(service.clone(), color))
                    .map(|w| SlotStatus {
                        color,
                        workload: service.slot_name(color),
                        image: Some(w.image.clone()),
                        running: w.rolled_out,
                    })
            })
            .collect();
        slots.sort_by_key(|s| s.color.as_str());
        Ok(slots)
    }
}
