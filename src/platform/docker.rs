// ABOUTME: Docker-API platform: slots are containers, routing is a network alias.
// ABOUTME: Works against Docker and Podman over a local unix socket via bollard.

use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, ContainerInspectResponse, ContainerStateStatusEnum, ContainerSummary,
    EndpointSettings, HealthStatusEnum, HostConfig, NetworkConnectRequest, NetworkCreateRequest,
    NetworkDisconnectRequest, NetworkingConfig, RestartPolicy, RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, InspectNetworkOptions,
    ListContainersOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use snafu::ResultExt;
use std::collections::HashMap;
use std::time::Duration;

use super::error::{ConnectError, ConnectionSnafu, PlatformError};
use super::runtime::{RuntimeConfig, RuntimeInfo, resolve_runtime};
use super::{LABEL_MANAGED, LABEL_SERVICE, LABEL_SLOT, Platform, SlotStatus};
use crate::deploy::DeploymentPlan;
use crate::types::{DeploymentColor, ImageReference, RoutingState, ServiceName};

const ROLLOUT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Container settings shared by both slots.
#[derive(Debug, Clone)]
pub struct WorkloadSpec {
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub command: Option<Vec<String>>,
    pub stop_timeout: Duration,
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self {
            env: HashMap::new(),
            labels: HashMap::new(),
            command: None,
            stop_timeout: Duration::from_secs(10),
        }
    }
}

/// Platform backed by a Docker-compatible API.
///
/// Each slot is a container named `<service>-<color>` that always carries the
/// alias `<service>-<color>` on the service network. The live slot additionally
/// carries the alias `<service>`, which is the routing pointer.
pub struct DockerPlatform {
    client: Docker,
    runtime: RuntimeInfo,
    network: String,
    workload: WorkloadSpec,
}

fn is_status(e: &bollard::errors::Error, code: u16) -> bool {
    matches!(
        e,
        bollard::errors::Error::DockerResponseServerError { status_code, .. } if *status_code == code
    )
}

fn summary_name(summary: &ContainerSummary) -> Option<String> {
    summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| n.trim_start_matches('/').to_string())
}

fn slot_label(details: &ContainerInspectResponse) -> Option<String> {
    details
        .config
        .as_ref()
        .and_then(|c| c.labels.as_ref())
        .and_then(|labels| labels.get(LABEL_SLOT))
        .cloned()
}

#[derive(Debug, PartialEq, Eq)]
enum Rollout {
    Ready,
    Pending,
    Failed(String),
}

/// Interpret an inspect response as rollout progress.
fn rollout_progress(details: &ContainerInspectResponse) -> Rollout {
    let state = details.state.as_ref();
    let status = state.and_then(|s| s.status);
    let health = state.and_then(|s| s.health.as_ref()).and_then(|h| h.status);

    match status {
        Some(ContainerStateStatusEnum::RUNNING) => match health {
            Some(HealthStatusEnum::STARTING) => Rollout::Pending,
            Some(HealthStatusEnum::UNHEALTHY) => {
                Rollout::Failed("container healthcheck reports unhealthy".to_string())
            }
            _ => Rollout::Ready,
        },
        Some(ContainerStateStatusEnum::EXITED) | Some(ContainerStateStatusEnum::DEAD) => {
            let exit_code = state.and_then(|s| s.exit_code).unwrap_or_default();
            Rollout::Failed(format!("container stopped with exit code {}", exit_code))
        }
        _ => Rollout::Pending,
    }
}

impl DockerPlatform {
    /// Resolve the runtime socket and verify it answers.
    pub async fn connect(
        runtime: &RuntimeConfig,
        network: impl Into<String>,
        workload: WorkloadSpec,
    ) -> Result<Self, ConnectError> {
        let info = resolve_runtime(runtime)?;

        let client =
            Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .context(ConnectionSnafu {
                    socket: info.socket_path.clone(),
                })?;
        client.ping().await.context(ConnectionSnafu {
            socket: info.socket_path.clone(),
        })?;

        tracing::info!(runtime = %info.runtime_type, socket = %info.socket_path, "connected to container runtime");

        Ok(Self {
            client,
            runtime: info,
            network: network.into(),
            workload,
        })
    }

    pub fn runtime(&self) -> &RuntimeInfo {
        &self.runtime
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// All containers labelled for the service, running or not.
    async fn service_containers(
        &self,
        service: &ServiceName,
    ) -> Result<Vec<ContainerSummary>, PlatformError> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        filters.insert(
            "label".to_string(),
            vec![format!("{}={}", LABEL_SERVICE, service)],
        );
        let opts = ListContainersOptions {
            all: true,
            filters: Some(filters),
            ..Default::default()
        };

        // Podman reports transient "stopping"/"stopped" states that bollard
        // cannot deserialize.
        let mut attempt = 0;
        loop {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => return Ok(containers),
                Err(e) => {
                    let message = e.to_string();
                    let transient = message.contains("unknown variant `stopping`")
                        || message.contains("unknown variant `stopped`");
                    if transient && attempt < 2 {
                        attempt += 1;
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        continue;
                    }
                    return Err(PlatformError::Runtime(message));
                }
            }
        }
    }

    async fn inspect_slot(
        &self,
        name: &str,
    ) -> Result<Option<ContainerInspectResponse>, PlatformError> {
        match self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => Ok(Some(details)),
            Err(e) if is_status(&e, 404) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn aliases_on(&self, details: &ContainerInspectResponse) -> Vec<String> {
        details
            .network_settings
            .as_ref()
            .and_then(|s| s.networks.as_ref())
            .and_then(|nets| nets.get(&self.network))
            .and_then(|endpoint| endpoint.aliases.clone())
            .unwrap_or_default()
    }

    fn is_live(&self, details: &ContainerInspectResponse, service: &ServiceName) -> bool {
        self.aliases_on(details)
            .iter()
            .any(|alias| alias == service.as_str())
    }

    async fn ensure_network(&self) -> Result<(), bollard::errors::Error> {
        match self
            .client
            .inspect_network(&self.network, None::<InspectNetworkOptions>)
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) if is_status(&e, 404) => {}
            Err(e) => return Err(e),
        }

        let mut labels = HashMap::new();
        labels.insert(LABEL_MANAGED.to_string(), "true".to_string());
        let request = NetworkCreateRequest {
            name: self.network.clone(),
            driver: Some("bridge".to_string()),
            labels: Some(labels),
            ..Default::default()
        };

        match self.client.create_network(request).await {
            Ok(_) => {
                tracing::info!(network = %self.network, "created network");
                Ok(())
            }
            // Created concurrently between inspect and create.
            Err(e) if is_status(&e, 409) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn pull(&self, image: &ImageReference) -> Result<(), PlatformError> {
        let image_name = image.to_string();
        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        tracing::info!(image = %image_name, "pulling image");
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(progress) = stream.next().await {
            progress
                .map_err(|e| PlatformError::Rejected(format!("pull {}: {}", image_name, e)))?;
        }
        Ok(())
    }

    /// Remove a leftover, non-live container occupying the slot name.
    async fn remove_stale(&self, workload: &str) -> Result<(), PlatformError> {
        if self.inspect_slot(workload).await?.is_none() {
            return Ok(());
        }

        tracing::warn!(workload, "replacing stale container in target slot");
        let opts = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.client.remove_container(workload, Some(opts)).await {
            Ok(()) => Ok(()),
            Err(e) if is_status(&e, 404) => Ok(()),
            Err(e) => Err(PlatformError::Rejected(format!(
                "could not remove stale {}: {}",
                workload, e
            ))),
        }
    }

    fn container_body(&self, plan: &DeploymentPlan) -> ContainerCreateBody {
        let workload = plan.workload_name();

        let mut labels = self.workload.labels.clone();
        labels.insert(LABEL_SERVICE.to_string(), plan.service().to_string());
        labels.insert(LABEL_MANAGED.to_string(), "true".to_string());
        labels.insert(LABEL_SLOT.to_string(), plan.target_color().to_string());

        let env: Vec<String> = self
            .workload
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let mut endpoints: HashMap<String, EndpointSettings> = HashMap::new();
        endpoints.insert(
            self.network.clone(),
            EndpointSettings {
                aliases: Some(vec![workload]),
                ..Default::default()
            },
        );

        ContainerCreateBody {
            image: Some(plan.image().to_string()),
            env: if env.is_empty() { None } else { Some(env) },
            labels: Some(labels),
            cmd: self.workload.command.clone(),
            host_config: Some(HostConfig {
                network_mode: Some(self.network.clone()),
                restart_policy: Some(RestartPolicy {
                    name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                    maximum_retry_count: None,
                }),
                ..Default::default()
            }),
            networking_config: Some(NetworkingConfig {
                endpoints_config: Some(endpoints),
            }),
            stop_timeout: Some(self.workload.stop_timeout.as_secs() as i64),
            ..Default::default()
        }
    }
}

/// Alias edits on the service network.
#[async_trait]
trait AliasNetwork: Send + Sync {
    /// Re-attach a container to the network with exactly `aliases`.
    async fn reconnect(&self, container: &str, aliases: Vec<String>) -> Result<(), PlatformError>;
}

#[async_trait]
impl AliasNetwork for DockerPlatform {
    // Endpoint aliases cannot be edited in place.
    async fn reconnect(&self, container: &str, aliases: Vec<String>) -> Result<(), PlatformError> {
        let disconnect = NetworkDisconnectRequest {
            container: container.to_string(),
            force: Some(true),
        };
        match self.client.disconnect_network(&self.network, disconnect).await {
            Ok(()) => {}
            Err(e) if is_status(&e, 404) || is_status(&e, 403) => {}
            Err(e) => return Err(e.into()),
        }

        let connect = NetworkConnectRequest {
            container: container.to_string(),
            endpoint_config: Some(EndpointSettings {
                aliases: Some(aliases),
                ..Default::default()
            }),
        };
        self.client
            .connect_network(&self.network, connect)
            .await
            .map_err(PlatformError::from)
    }
}

/// Move the service alias onto `target`.
///
/// The new pointer is attached before the old ones are detached, so the alias
/// always resolves to at least one slot. If a detach fails, every slot is put
/// back the way it was before the error is returned.
async fn switch_alias<N: AliasNetwork + ?Sized>(
    network: &N,
    service: &ServiceName,
    target: &str,
    target_live: bool,
    others_live: &[String],
) -> Result<(), PlatformError> {
    if !target_live {
        network
            .reconnect(target, vec![service.to_string(), target.to_string()])
            .await?;
    }

    for (index, name) in others_live.iter().enumerate() {
        if let Err(e) = network.reconnect(name, vec![name.clone()]).await {
            tracing::warn!(workload = %name, "routing switch failed, restoring previous slot: {}", e);
            for restored in &others_live[..=index] {
                if let Err(restore) = network
                    .reconnect(restored, vec![service.to_string(), restored.clone()])
                    .await
                {
                    tracing::warn!(workload = %restored, "could not restore service alias: {}", restore);
                }
            }
            if !target_live
                && let Err(restore) = network.reconnect(target, vec![target.to_string()]).await
            {
                tracing::warn!(workload = %target, "could not detach service alias: {}", restore);
            }
            return Err(e);
        }
    }
    Ok(())
}

#[async_trait]
impl Platform for DockerPlatform {
    async fn routing_state(&self, service: &ServiceName) -> Result<RoutingState, PlatformError> {
        let mut live = Vec::new();
        for summary in self.service_containers(service).await? {
            let Some(name) = summary_name(&summary) else {
                continue;
            };
            let Some(details) = self.inspect_slot(&name).await? else {
                continue;
            };
            if self.is_live(&details, service) {
                live.push(slot_label(&details).unwrap_or_default());
            }
        }

        match live.as_slice() {
            [] => Ok(RoutingState::Absent),
            [label] => Ok(RoutingState::from_label(label)),
            [first, ..] => {
                tracing::warn!(service = %service, slots = ?live, "more than one slot carries the service alias");
                Ok(RoutingState::from_label(first))
            }
        }
    }

    async fn apply(&self, plan: &DeploymentPlan) -> Result<(), PlatformError> {
        let workload = plan.workload_name();

        if self.routing_state(plan.service()).await?.live_color() == Some(plan.target_color()) {
            return Err(PlatformError::Rejected(format!("{} is live", workload)));
        }

        self.ensure_network()
            .await
            .map_err(|e| PlatformError::Rejected(format!("network {}: {}", self.network, e)))?;
        self.pull(plan.image()).await?;
        self.remove_stale(&workload).await?;

        let opts = CreateContainerOptions {
            name: Some(workload.clone()),
            ..Default::default()
        };
        self.client
            .create_container(Some(opts), self.container_body(plan))
            .await
            .map_err(|e| PlatformError::Rejected(format!("create {}: {}", workload, e)))?;

        if let Err(e) = self
            .client
            .start_container(&workload, None::<StartContainerOptions>)
            .await
        {
            let opts = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(cleanup) = self.client.remove_container(&workload, Some(opts)).await {
                tracing::warn!(workload = %workload, "failed to remove unstarted container: {}", cleanup);
            }
            return Err(PlatformError::Rejected(format!("start {}: {}", workload, e)));
        }

        tracing::info!(workload = %workload, image = %plan.image(), "slot container started");
        Ok(())
    }

    async fn wait_rollout(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
        timeout: Duration,
    ) -> Result<(), PlatformError> {
        let workload = service.slot_name(color);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let details = self
                .inspect_slot(&workload)
                .await?
                .ok_or_else(|| PlatformError::NotFound(workload.clone()))?;

            match rollout_progress(&details) {
                Rollout::Ready => return Ok(()),
                Rollout::Failed(reason) => {
                    return Err(PlatformError::RolloutFailed { workload, reason });
                }
                Rollout::Pending => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(PlatformError::RolloutTimeout { workload, timeout });
            }
            tokio::time::sleep(ROLLOUT_POLL_INTERVAL).await;
        }
    }

    async fn set_routing_state(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError> {
        let target = service.slot_name(color);
        let mut target_live = None;
        let mut others_live = Vec::new();

        for summary in self.service_containers(service).await? {
            let Some(name) = summary_name(&summary) else {
                continue;
            };
            let Some(details) = self.inspect_slot(&name).await? else {
                continue;
            };
            let live = self.is_live(&details, service);
            if name == target {
                target_live = Some(live);
            } else if live {
                others_live.push(name);
            }
        }

        let Some(target_live) = target_live else {
            return Err(PlatformError::NotFound(target));
        };
        if target_live && others_live.is_empty() {
            tracing::debug!(workload = %target, "already live");
            return Ok(());
        }

        switch_alias(self, service, &target, target_live, &others_live).await?;

        tracing::info!(service = %service, color = %color, "routing switched");
        Ok(())
    }

    async fn rollback(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<(), PlatformError> {
        let workload = service.slot_name(color);

        let Some(details) = self.inspect_slot(&workload).await? else {
            return Ok(());
        };
        if self.is_live(&details, service) {
            return Err(PlatformError::Rejected(format!(
                "refusing to remove live slot {}",
                workload
            )));
        }

        let stop = StopContainerOptions {
            t: Some(self.workload.stop_timeout.as_secs() as i32),
            signal: None,
        };
        match self.client.stop_container(&workload, Some(stop)).await {
            Ok(()) => {}
            Err(e) if is_status(&e, 304) || is_status(&e, 404) => {}
            Err(e) => tracing::warn!(workload = %workload, "stop failed, removing anyway: {}", e),
        }

        let remove = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.client.remove_container(&workload, Some(remove)).await {
            Ok(()) => Ok(()),
            Err(e) if is_status(&e, 404) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn slots(&self, service: &ServiceName) -> Result<Vec<SlotStatus>, PlatformError> {
        let mut slots: Vec<SlotStatus> = self
            .service_containers(service)
            .await?
            .into_iter()
            .filter_map(|summary| {
                let workload = summary_name(&summary)?;
                let color = summary
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.get(LABEL_SLOT))
                    .and_then(|label| label.parse::<DeploymentColor>().ok())?;
                let running = summary
                    .state
                    .map(|s| format!("{:?}", s).eq_ignore_ascii_case("running"))
                    .unwrap_or(false);
                Some(SlotStatus {
                    color,
                    workload,
                    image: summary.image.clone(),
                    running,
                })
            })
            .collect();
        slots.sort_by_key(|s| s.color.as_str());
        Ok(slots)
    }
}
