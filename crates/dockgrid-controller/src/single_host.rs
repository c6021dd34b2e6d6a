//! Single-host backend: drives containers on one non-clustered Docker host.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use dockgrid_core::{ControllerSettings, GlobalMount, ProfileUpdates, ServiceProfile};

use crate::docker::DockerRuntime;
use crate::error::{ControllerError, ControllerResult, ServiceControlError};
use crate::interface::ScalingController;
use crate::launch::LaunchSpec;
use crate::naming::next_free_name;
use crate::resources::ResourceAccountant;
use crate::runtime::{ContainerFilter, ContainerRecord, ContainerRuntime, HostInfo};

/// A registered profile plus its optional launch-time updates.
struct RegisteredProfile {
    profile: ServiceProfile,
    updates: Option<ProfileUpdates>,
}

/// Scaling controller for a single, non-clustered container host.
///
/// Holds no desired state. Every call re-derives the live count from the
/// runtime, which is the only authority on what is actually running.
pub struct DockerController<R = DockerRuntime> {
    runtime: R,
    /// Prepended to container names when non-empty.
    prefix: String,
    /// Labels merged into every launched container.
    labels: BTreeMap<String, String>,
    global_mounts: RwLock<Vec<GlobalMount>>,
    accountant: ResourceAccountant,
    /// Host capacity snapshot; replaced by `refresh_host_info`.
    host: RwLock<HostInfo>,
    profiles: RwLock<HashMap<String, RegisteredProfile>>,
}

impl<R: ContainerRuntime> DockerController<R> {
    /// Build a controller, snapshotting host capacity.
    ///
    /// Fails with [`ControllerError::Clustered`] when the host is a swarm
    /// member.
    pub async fn new(runtime: R, settings: &ControllerSettings) -> ControllerResult<Self> {
        let host = runtime.host_info().await?;
        ensure_standalone(&host)?;

        info!(
            cpus = host.cpus,
            memory_mb = host.memory_mb(),
            prefix = %settings.prefix,
            "docker controller initialized"
        );

        Ok(Self {
            runtime,
            prefix: settings.prefix.clone(),
            labels: settings.labels.clone(),
            global_mounts: RwLock::new(settings.global_mounts.clone()),
            accountant: ResourceAccountant::from_settings(settings),
            host: RwLock::new(host),
            profiles: RwLock::new(HashMap::new()),
        })
    }

    /// Bind a host path read-only into every container launched from now on.
    pub async fn add_global_mount(&self, mount: GlobalMount) {
        self.global_mounts.write().await.push(mount);
    }

    /// The current host capacity snapshot.
    pub async fn host_info(&self) -> HostInfo {
        self.host.read().await.clone()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Find the lowest free `[prefix_]service_N` name on the host.
    pub async fn name_container(&self, service_name: &str) -> ControllerResult<String> {
        let used = self.runtime.container_names().await?;
        Ok(next_free_name(&used, &self.prefix, service_name))
    }

    /// Launch one new container for `service_name`. Returns its id.
    pub async fn start(&self, service_name: &str) -> ControllerResult<String> {
        let profiles = self.profiles.read().await;
        let registered = profiles
            .get(service_name)
            .ok_or_else(|| ControllerError::MissingProfile(service_name.to_string()))?;

        let name = self.name_container(service_name).await?;
        let mounts = self.global_mounts.read().await;
        let spec = LaunchSpec::build(
            name,
            &registered.profile,
            registered.updates.as_ref(),
            &self.labels,
            &mounts,
        )?;
        drop(mounts);
        drop(profiles);

        let id = self.runtime.run_container(&spec).await?;
        info!(service = %service_name, container = %spec.name, %id, "container launched");
        Ok(id)
    }

    /// Live containers for a service, warning about unknown statuses.
    async fn live_containers(&self, service_name: &str) -> ControllerResult<Vec<ContainerRecord>> {
        let containers = self
            .runtime
            .list_containers(&ContainerFilter::component(service_name))
            .await?;

        Ok(containers
            .into_iter()
            .filter(|container| {
                let status = container.status();
                if status.is_unknown() {
                    warn!(
                        service = %service_name,
                        container = %container.name,
                        status = %status,
                        "unknown docker status string"
                    );
                }
                status.is_live()
            })
            .collect())
    }

    async fn reconcile(&self, service_name: &str, target: u32) -> ControllerResult<()> {
        let mut live = self.live_containers(service_name).await?;
        let running = live.len() as i64;
        debug!(service = %service_name, from = running, to = target, "new target");
        let delta = i64::from(target) - running;

        if delta < 0 {
            // Newest first, so long-lived instances survive a drain and
            // the highest-indexed names are freed.
            live.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
            for container in live.iter().take(delta.unsigned_abs() as usize) {
                self.runtime.kill_container(&container.id).await?;
                info!(service = %service_name, container = %container.name, "container killed");
            }
        }

        for _ in 0..delta.max(0) {
            self.start(service_name).await?;
        }

        Ok(())
    }

    /// Remove stopped containers and unused volumes. Failures are logged.
    async fn housekeeping(&self) {
        if let Err(e) = self.runtime.prune_containers().await {
            warn!(error = %e, "failed to prune containers");
        }
        if let Err(e) = self.runtime.prune_volumes().await {
            warn!(error = %e, "failed to prune volumes");
        }
    }
}

fn ensure_standalone(host: &HostInfo) -> ControllerResult<()> {
    match &host.swarm_node_id {
        Some(node_id) => Err(ControllerError::Clustered(node_id.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl<R: ContainerRuntime> ScalingController for DockerController<R> {
    async fn add_profile(&self, profile: ServiceProfile, updates: Option<ProfileUpdates>) {
        debug!(service = %profile.name, image = %profile.container_config.image, "profile registered");
        self.profiles
            .write()
            .await
            .insert(profile.name.clone(), RegisteredProfile { profile, updates });
    }

    async fn get_target(&self, service_name: &str) -> ControllerResult<u32> {
        Ok(self.live_containers(service_name).await?.len() as u32)
    }

    async fn set_target(
        &self,
        service_name: &str,
        target: u32,
    ) -> Result<(), ServiceControlError> {
        let result = self.reconcile(service_name, target).await;
        self.housekeeping().await;
        result.map_err(|e| ServiceControlError::new(service_name, e))
    }

    async fn free_cpu(&self) -> ControllerResult<f64> {
        let containers = self.runtime.list_containers(&ContainerFilter::listed()).await?;
        let host = self.host.read().await;
        let cpu = self.accountant.free_cpu(&host, &containers);
        debug!(free = cpu, total = host.cpus, "cpu available");
        Ok(cpu)
    }

    async fn free_memory(&self) -> ControllerResult<f64> {
        let containers = self.runtime.list_containers(&ContainerFilter::listed()).await?;
        let host = self.host.read().await;
        let mem = self.accountant.free_memory(&host, &containers);
        debug!(free_mb = mem, total_mb = host.memory_mb(), "memory available");
        Ok(mem)
    }

    async fn refresh_host_info(&self) -> ControllerResult<()> {
        let fresh = self.runtime.host_info().await?;
        ensure_standalone(&fresh)?;
        let mut host = self.host.write().await;
        if *host != fresh {
            info!(cpus = fresh.cpus, memory_mb = fresh.memory_mb(), "host capacity changed");
        }
        *host = fresh;
        Ok(())
    }
}
