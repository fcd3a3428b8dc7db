// ABOUTME: Compile-fail test verifying rollback cannot be called on Promoted.
// ABOUTME: Once traffic has switched, the new slot is live and must not be reverted.

use slotswap::deploy::{Deployment, Promoted};
use slotswap::platform::MemoryPlatform;

async fn try_invalid_rollback(deployment: Deployment<Promoted>, platform: &MemoryPlatform) {
    // ERROR: rollback() method doesn't exist on Deployment<Promoted>
    let _ = deployment.rollback(platform).await;
}

fn main() {}
