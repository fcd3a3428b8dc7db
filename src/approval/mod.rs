// ABOUTME: Human approval gates that suspend a deployment until an operator decides.
// ABOUTME: Defines the channel trait, decision type, and the interrupt-aware gate wait.

mod auto;
mod interrupt;
mod terminal;

pub use auto::AutoApprove;
pub use interrupt::{Interrupt, InterruptHandle, interrupt_pair};
pub use terminal::TerminalApproval;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::types::{DeploymentColor, ImageReference, ServiceName};

/// The two points where a deployment waits for an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    /// Commit resources: create the new slot.
    Deploy,
    /// Go live: switch traffic to the new slot.
    Promote,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Deploy => f.write_str("deploy"),
            Gate::Promote => f.write_str("promote"),
        }
    }
}

/// Outcome of one gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approved,
    Denied,
    /// The wait was interrupted (operator abort, pipeline kill, deadline).
    Cancelled,
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalDecision::Approved)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApprovalDecision::Cancelled)
    }
}

/// What the operator is being asked to approve.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub gate: Gate,
    pub service: ServiceName,
    pub color: DeploymentColor,
    pub image: ImageReference,
}

impl ApprovalRequest {
    pub fn prompt(&self) -> String {
        match self.gate {
            Gate::Deploy => format!(
                "Deploy {} into the {} slot of {}?",
                self.image, self.color, self.service
            ),
            Gate::Promote => format!(
                "The {} slot of {} is healthy on {}. Switch live traffic to it?",
                self.color,
                self.service,
                self.image.tag()
            ),
        }
    }
}

/// A prompt/response mechanism delivering one decision per gate.
///
/// Implementations may block for as long as they like; the gate itself never
/// times out or auto-approves. Interruption is layered on by [`request_approval`].
#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

#[async_trait]
impl<T: ApprovalChannel + ?Sized> ApprovalChannel for &T {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        (**self).decide(request).await
    }
}

#[async_trait]
impl<T: ApprovalChannel + ?Sized> ApprovalChannel for Box<T> {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        (**self).decide(request).await
    }
}

/// Wait for a decision, mapping an interrupt to `Cancelled`.
///
/// An interrupt that was raised before the gate was reached cancels immediately.
pub async fn request_approval<A: ApprovalChannel + ?Sized>(
    channel: &A,
    request: &ApprovalRequest,
    interrupt: &Interrupt,
) -> ApprovalDecision {
    if interrupt.is_triggered() {
        tracing::warn!(gate = %request.gate, "interrupt already raised, cancelling gate");
        return ApprovalDecision::Cancelled;
    }

    tracing::info!(gate = %request.gate, service = %request.service, color = %request.color, "waiting for approval");

    tokio::select! {
        decision = channel.decide(request) => {
            tracing::info!(gate = %request.gate, ?decision, "approval decided");
            decision
        }
        _ = interrupt.triggered() => {
            tracing::warn!(gate = %request.gate, "approval wait interrupted");
            ApprovalDecision::Cancelled
        }
    }
}
