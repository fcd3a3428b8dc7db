// ABOUTME: Shared helper for connecting to the local container runtime.
// ABOUTME: Builds the slot workload template from config and reports the detected runtime.

use slotswap::config::{Config, resolve_env_map};
use slotswap::error::Result;
use slotswap::output::Output;
use slotswap::platform::{DockerPlatform, WorkloadSpec};

/// Connect to the runtime named (or detected) by `config`.
pub async fn connect_platform(config: &Config, output: &Output) -> Result<DockerPlatform> {
    output.progress("  → Connecting to container runtime...");

    let workload = WorkloadSpec {
        env: resolve_env_map(&config.env)?,
        labels: config.labels.clone(),
        command: config.command.clone(),
        stop_timeout: config.stop.timeout,
    };

    let platform = DockerPlatform::connect(&config.runtime, config.network.clone(), workload).await?;

    let runtime = platform.runtime();
    output.progress(&format!(
        "  → Found {} at {}",
        runtime.runtime_type, runtime.socket_path
    ));

    Ok(platform)
}
