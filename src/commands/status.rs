// ABOUTME: Status command implementation.
// ABOUTME: Reports the live slot and the state of both slot workloads.

use super::platform_connection::connect_platform;
use slotswap::config::Config;
use slotswap::error::Result;
use slotswap::output::Output;
use slotswap::platform::Platform;

pub async fn status(config: Config, output: Output) -> Result<()> {
    let platform = connect_platform(&config, &output).await?;

    let routing = platform.routing_state(&config.service).await?;
    let slots = platform.slots(&config.service).await?;

    output.status(&config.service, &routing, &slots);
    Ok(())
}
