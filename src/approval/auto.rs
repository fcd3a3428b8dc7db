// ABOUTME: Non-interactive approval for unattended pipelines.
// ABOUTME: Approves every gate; interrupts still cancel through request_approval.

use async_trait::async_trait;

use super::{ApprovalChannel, ApprovalDecision, ApprovalRequest};

/// Approves every gate without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalChannel for AutoApprove {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        tracing::info!(gate = %request.gate, "auto-approving");
        ApprovalDecision::Approved
    }
}
