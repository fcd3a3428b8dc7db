// ABOUTME: Tests for the typestate deployment transitions.
// ABOUTME: Drives each transition directly against the in-memory platform.

mod support;

use std::time::Duration;

use hyper::Uri;
use slotswap::approval::{AutoApprove, Interrupt};
use slotswap::deploy::{DeployError, DeployErrorKind, Deployment, InvalidPlanError, Planned};
use slotswap::health::{HealthCheckPolicy, HealthProbe};
use slotswap::platform::{MemoryPlatform, PlatformOp};
use slotswap::types::{DeploymentColor, ImageReference, RoutingState};
use support::{Answer, ScriptedApproval, ScriptedProber, image, service};

fn policy() -> HealthCheckPolicy {
    let mut policy = HealthCheckPolicy::new(Uri::from_static("http://api-green:8080/health"));
    policy.max_attempts = 2;
    policy.interval = Duration::ZERO;
    policy
}

fn planned() -> Deployment<Planned> {
    Deployment::new(
        service(),
        RoutingState::Live(DeploymentColor::Blue),
        image(),
    )
    .unwrap()
}

#[test]
fn planning_targets_inactive_slot() {
    let deployment = planned();

    assert_eq!(deployment.target_color(), DeploymentColor::Green);
    assert_eq!(deployment.plan().workload_name(), "api-green");
    assert_eq!(
        deployment.previous_routing(),
        &RoutingState::Live(DeploymentColor::Blue)
    );
    assert!(!deployment.attempt().created());
    assert!(!deployment.attempt().requires_rollback());
}

#[test]
fn planning_rejects_empty_tag() {
    let err = Deployment::new(
        service(),
        RoutingState::Absent,
        ImageReference::new("ghcr.io", "acme/api", ""),
    )
    .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Planning);
    assert!(matches!(err, DeployError::Planning(InvalidPlanError::EmptyTag)));
}

#[tokio::test]
async fn full_walk_marks_attempt_promoted() {
    let platform = MemoryPlatform::new()
        .with_routing(&service(), RoutingState::Live(DeploymentColor::Blue))
        .with_workload(&service(), DeploymentColor::Blue, "ghcr.io/acme/api:2.3.9");
    let prober = ScriptedProber::always(200);
    let probe = HealthProbe::new(&prober);
    let interrupt = Interrupt::never();

    let approved = planned()
        .await_deploy_approval(&AutoApprove, &interrupt)
        .await
        .unwrap();
    let applied = approved.apply(&platform).await.unwrap();
    assert!(applied.attempt().requires_rollback());

    let rolled_out = applied
        .wait_rollout(&platform, Duration::from_secs(5))
        .await
        .unwrap();
    let healthy = rolled_out.health_check(&probe, &policy()).await.unwrap();
    let approved = healthy
        .await_promote_approval(&AutoApprove, &interrupt)
        .await
        .unwrap();
    let promoted = approved.promote(&platform).await.unwrap();
    let attempt = promoted.finish();

    assert!(attempt.created());
    assert!(attempt.promoted());
    assert!(!attempt.requires_rollback());
    assert_eq!(
        platform.routing_of(&service()),
        RoutingState::Live(DeploymentColor::Green)
    );
}

#[tokio::test]
async fn denied_gate_hands_back_planned_deployment() {
    let approvals = ScriptedApproval::new(Answer::Deny, Answer::Approve);

    let (deployment, err) = planned()
        .await_deploy_approval(&approvals, &Interrupt::never())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::ApprovalDenied);
    assert!(err.is_user_driven());
    assert!(!deployment.attempt().requires_rollback());
}

#[tokio::test]
async fn rejected_apply_leaves_nothing_to_revert() {
    let platform = MemoryPlatform::new();
    platform.fail(PlatformOp::Apply, "quota exceeded");

    let approved = planned()
        .await_deploy_approval(&AutoApprove, &Interrupt::never())
        .await
        .unwrap();
    let (deployment, err) = approved.apply(&platform).await.unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::ApplyFailed);
    assert!(!deployment.attempt().created());
}

#[tokio::test]
async fn unhealthy_slot_can_be_rolled_back() {
    let platform = MemoryPlatform::new()
        .with_routing(&service(), RoutingState::Live(DeploymentColor::Blue));
    let prober = ScriptedProber::always(503);
    let probe = HealthProbe::new(&prober);

    let applied = planned()
        .await_deploy_approval(&AutoApprove, &Interrupt::never())
        .await
        .unwrap()
        .apply(&platform)
        .await
        .unwrap();
    let rolled_out = applied
        .wait_rollout(&platform, Duration::from_secs(5))
        .await
        .unwrap();

    let (failed, err) = rolled_out.health_check(&probe, &policy()).await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::Unhealthy {
            attempts: 2,
            last_status: Some(503)
        }
    ));

    let rolled_back = failed.rollback(&platform).await.unwrap();
    let attempt = rolled_back.finish();

    assert!(attempt.created());
    assert!(!attempt.promoted());
    assert!(!platform.has_workload(&service(), DeploymentColor::Green));
    assert_eq!(platform.count(PlatformOp::SetRoutingState), 0);
}

#[tokio::test]
async fn rollout_failure_is_not_a_timeout() {
    let platform = MemoryPlatform::new();
    platform.fail(PlatformOp::WaitRollout, "container exited with 137");

    let applied = planned()
        .await_deploy_approval(&AutoApprove, &Interrupt::never())
        .await
        .unwrap()
        .apply(&platform)
        .await
        .unwrap();

    let (_, err) = applied
        .wait_rollout(&platform, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::RolloutFailed);
    assert!(err.to_string().contains("137"));
}
