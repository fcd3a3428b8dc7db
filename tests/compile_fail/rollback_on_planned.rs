// ABOUTME: Compile-fail test verifying rollback cannot be called on Planned.
// ABOUTME: Nothing exists to revert before the platform accepts the plan.

use slotswap::deploy::{Deployment, Planned};
use slotswap::platform::MemoryPlatform;

async fn try_early_rollback(deployment: Deployment<Planned>, platform: &MemoryPlatform) {
    // ERROR: rollback() method doesn't exist on Deployment<Planned>
    let _ = deployment.rollback(platform).await;
}

fn main() {}
