//! The container runtime seam.
//!
//! [`ContainerRuntime`] is the narrow set of host calls the single-host
//! backend needs. [`crate::DockerRuntime`] implements it with bollard;
//! tests substitute an in-memory host.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;

use crate::launch::LaunchSpec;
use crate::status::ContainerStatus;

/// Result type alias for runtime calls.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failures from the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("docker api error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("container not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Host capacity, read once and refreshed on request.
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    /// Number of CPUs the host reports.
    pub cpus: f64,
    /// Total host memory in bytes.
    pub memory_bytes: u64,
    /// Set when the host is a swarm member.
    pub swarm_node_id: Option<String>,
}

impl HostInfo {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Which containers a listing should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
    /// Include stopped containers.
    pub all: bool,
    /// Only containers carrying this `key=value` label.
    pub label: Option<(String, String)>,
}

impl ContainerFilter {
    /// Every container belonging to `service`, stopped ones included.
    pub fn component(service: &str) -> Self {
        Self {
            all: true,
            label: Some(("component".to_string(), service.to_string())),
        }
    }

    /// Containers the runtime currently lists as up.
    pub fn listed() -> Self {
        Self::default()
    }
}

/// A point-in-time view of one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub labels: HashMap<String, String>,
    /// Raw status string, e.g. "running".
    pub status: String,
    /// Creation time, Unix seconds.
    pub created: i64,
    /// CPU CFS period in microseconds; 0 when no CPU limit is set.
    pub cpu_period: i64,
    pub cpu_quota: i64,
    /// Memory limit in bytes; 0 when unlimited.
    pub memory_bytes: i64,
}

impl ContainerRecord {
    pub fn status(&self) -> ContainerStatus {
        ContainerStatus::parse(&self.status)
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn host_info(&self) -> RuntimeResult<HostInfo>;

    /// Names of every container on the host, stopped ones included.
    async fn container_names(&self) -> RuntimeResult<HashSet<String>>;

    async fn list_containers(&self, filter: &ContainerFilter) -> RuntimeResult<Vec<ContainerRecord>>;

    /// Create and start a detached container. Returns its id.
    async fn run_container(&self, spec: &LaunchSpec) -> RuntimeResult<String>;

    async fn kill_container(&self, id: &str) -> RuntimeResult<()>;

    /// Remove all stopped containers.
    async fn prune_containers(&self) -> RuntimeResult<()>;

    /// Remove all volumes no container references.
    async fn prune_volumes(&self) -> RuntimeResult<()>;
}
