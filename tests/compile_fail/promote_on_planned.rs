// ABOUTME: Compile-fail test verifying promote cannot be called on Planned.
// ABOUTME: Routing may only switch after the slot is applied, healthy and approved.

use slotswap::deploy::{Deployment, Planned};
use slotswap::platform::MemoryPlatform;

async fn try_promote_unchecked(deployment: Deployment<Planned>, platform: &MemoryPlatform) {
    // ERROR: promote() method doesn't exist on Deployment<Planned>
    let _ = deployment.promote(platform).await;
}

fn main() {}
