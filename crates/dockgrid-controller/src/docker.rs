//! Docker implementation of [`ContainerRuntime`] over bollard.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, KillContainerOptions,
    ListContainersOptions, PruneContainersOptions, StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, RestartPolicy, RestartPolicyNameEnum};
use bollard::volume::PruneVolumesOptions;
use futures_util::TryStreamExt;
use tracing::{debug, info};

use crate::launch::LaunchSpec;
use crate::runtime::{
    ContainerFilter, ContainerRecord, ContainerRuntime, HostInfo, RuntimeResult,
};

/// A handle to the local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform default socket.
    pub fn connect() -> RuntimeResult<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    async fn pull_image(&self, image: &str) -> RuntimeResult<()> {
        info!(%image, "pulling image");
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        self.docker
            .create_image(Some(options), None, None)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(())
    }

    fn container_config(spec: &LaunchSpec) -> Config<String> {
        let host_config = HostConfig {
            cpu_period: Some(spec.cpu_period),
            cpu_quota: Some(spec.cpu_quota),
            memory: Some(spec.memory_bytes),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::ALWAYS),
                maximum_retry_count: None,
            }),
            network_mode: Some(spec.network.clone()),
            binds: (!spec.binds.is_empty()).then(|| spec.binds.clone()),
            ..Default::default()
        };

        Config {
            image: Some(spec.image.clone()),
            cmd: spec.command.clone(),
            env: Some(spec.environment.clone()),
            labels: Some(spec.labels.clone()),
            host_config: Some(host_config),
            ..Default::default()
        }
    }

    async fn create(&self, spec: &LaunchSpec) -> Result<String, BollardError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };
        let created = self
            .docker
            .create_container(Some(options), Self::container_config(spec))
            .await?;
        Ok(created.id)
    }
}

fn is_not_found(err: &BollardError) -> bool {
    matches!(
        err,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn host_info(&self) -> RuntimeResult<HostInfo> {
        let info = self.docker.info().await?;
        let swarm_node_id = info
            .swarm
            .and_then(|swarm| swarm.node_id)
            .filter(|id| !id.is_empty());

        Ok(HostInfo {
            cpus: info.ncpu.unwrap_or(0) as f64,
            memory_bytes: info.mem_total.unwrap_or(0).max(0) as u64,
            swarm_node_id,
        })
    }

    async fn container_names(&self) -> RuntimeResult<HashSet<String>> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let summaries = self.docker.list_containers(Some(options)).await?;

        Ok(summaries
            .into_iter()
            .flat_map(|summary| summary.names.unwrap_or_default())
            .map(|name| name.trim_start_matches('/').to_string())
            .collect())
    }

    async fn list_containers(&self, filter: &ContainerFilter) -> RuntimeResult<Vec<ContainerRecord>> {
        let mut filters = HashMap::new();
        if let Some((key, value)) = &filter.label {
            filters.insert("label".to_string(), vec![format!("{key}={value}")]);
        }
        let options = ListContainersOptions {
            all: filter.all,
            filters,
            ..Default::default()
        };
        let summaries = self.docker.list_containers(Some(options)).await?;

        let mut records = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else { continue };

            // Resource limits are only reported by inspect.
            let inspect = match self
                .docker
                .inspect_container(&id, None::<InspectContainerOptions>)
                .await
            {
                Ok(inspect) => inspect,
                Err(e) if is_not_found(&e) => {
                    debug!(container = %id, "container vanished between list and inspect");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let host = inspect.host_config.unwrap_or_default();

            let name = summary
                .names
                .and_then(|names| names.into_iter().next())
                .map(|name| name.trim_start_matches('/').to_string())
                .unwrap_or_else(|| id.clone());

            records.push(ContainerRecord {
                id,
                name,
                labels: summary.labels.unwrap_or_default(),
                status: summary.state.unwrap_or_default(),
                created: summary.created.unwrap_or(0),
                cpu_period: host.cpu_period.unwrap_or(0),
                cpu_quota: host.cpu_quota.unwrap_or(0),
                memory_bytes: host.memory.unwrap_or(0),
            });
        }
        Ok(records)
    }

    async fn run_container(&self, spec: &LaunchSpec) -> RuntimeResult<String> {
        let id = match self.create(spec).await {
            Ok(id) => id,
            Err(e) if is_not_found(&e) => {
                self.pull_image(&spec.image).await?;
                self.create(spec).await?
            }
            Err(e) => return Err(e.into()),
        };

        self.docker
            .start_container(&id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(id)
    }

    async fn kill_container(&self, id: &str) -> RuntimeResult<()> {
        self.docker
            .kill_container(id, None::<KillContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn prune_containers(&self) -> RuntimeResult<()> {
        let report = self
            .docker
            .prune_containers(None::<PruneContainersOptions<String>>)
            .await?;
        debug!(
            removed = report.containers_deleted.map(|c| c.len()).unwrap_or(0),
            "pruned stopped containers"
        );
        Ok(())
    }

    async fn prune_volumes(&self) -> RuntimeResult<()> {
        let report = self
            .docker
            .prune_volumes(None::<PruneVolumesOptions<String>>)
            .await?;
        debug!(
            removed = report.volumes_deleted.map(|v| v.len()).unwrap_or(0),
            "pruned unused volumes"
        );
        Ok(())
    }
}
