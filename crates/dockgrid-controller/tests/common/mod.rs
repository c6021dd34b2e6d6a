//! In-memory container host for driving the controller in tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use dockgrid_controller::{
    ContainerFilter, ContainerRecord, ContainerRuntime, HostInfo, LaunchSpec, RuntimeError,
    RuntimeResult,
};

#[derive(Default)]
struct FakeHost {
    host: Option<HostInfo>,
    containers: Vec<ContainerRecord>,
    next_id: u64,
    clock: i64,
    launches: Vec<LaunchSpec>,
    kills: Vec<String>,
    prunes: u32,
    /// Fail the Nth launch attempt (1-based).
    fail_launch_at: Option<usize>,
    launch_attempts: usize,
    fail_list: bool,
    fail_prune: bool,
}

/// A cheaply cloneable fake; clones share the same host.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    inner: Arc<Mutex<FakeHost>>,
}

impl FakeRuntime {
    pub fn new(cpus: f64, memory_mb: u64) -> Self {
        let runtime = Self::default();
        runtime.set_host(HostInfo {
            cpus,
            memory_bytes: memory_mb * 1024 * 1024,
            swarm_node_id: None,
        });
        runtime
    }

    pub fn set_host(&self, host: HostInfo) {
        self.inner.lock().unwrap().host = Some(host);
    }

    /// Add a container that was not launched through the controller.
    pub fn seed(&self, name: &str, service: &str, status: &str) -> String {
        self.seed_with_limits(name, service, status, 0.0, 0)
    }

    pub fn seed_with_limits(
        &self,
        name: &str,
        service: &str,
        status: &str,
        cores: f64,
        memory_mb: i64,
    ) -> String {
        let mut host = self.inner.lock().unwrap();
        host.next_id += 1;
        host.clock += 1;
        let id = format!("c{}", host.next_id);
        let created = host.clock;
        host.containers.push(ContainerRecord {
            id: id.clone(),
            name: name.to_string(),
            labels: HashMap::from([("component".to_string(), service.to_string())]),
            status: status.to_string(),
            created,
            cpu_period: if cores > 0.0 { 100_000 } else { 0 },
            cpu_quota: (100_000.0 * cores) as i64,
            memory_bytes: memory_mb * 1024 * 1024,
        });
        id
    }

    pub fn fail_launch_at(&self, attempt: usize) {
        self.inner.lock().unwrap().fail_launch_at = Some(attempt);
    }

    pub fn fail_list(&self, fail: bool) {
        self.inner.lock().unwrap().fail_list = fail;
    }

    pub fn fail_prune(&self, fail: bool) {
        self.inner.lock().unwrap().fail_prune = fail;
    }

    pub fn launches(&self) -> Vec<LaunchSpec> {
        self.inner.lock().unwrap().launches.clone()
    }

    pub fn kills(&self) -> Vec<String> {
        self.inner.lock().unwrap().kills.clone()
    }

    pub fn prunes(&self) -> u32 {
        self.inner.lock().unwrap().prunes
    }

    pub fn live_names(&self, service: &str) -> Vec<String> {
        let host = self.inner.lock().unwrap();
        let mut names: Vec<String> = host
            .containers
            .iter()
            .filter(|c| c.labels.get("component").map(String::as_str) == Some(service))
            .filter(|c| c.status == "running" || c.status == "restarting")
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn all_names(&self) -> Vec<String> {
        let host = self.inner.lock().unwrap();
        host.containers.iter().map(|c| c.name.clone()).collect()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn host_info(&self) -> RuntimeResult<HostInfo> {
        self.inner
            .lock()
            .unwrap()
            .host
            .clone()
            .ok_or_else(|| RuntimeError::Other("host unreachable".to_string()))
    }

    async fn container_names(&self) -> RuntimeResult<HashSet<String>> {
        let host = self.inner.lock().unwrap();
        if host.fail_list {
            return Err(RuntimeError::Other("list failed".to_string()));
        }
        Ok(host.containers.iter().map(|c| c.name.clone()).collect())
    }

    async fn list_containers(&self, filter: &ContainerFilter) -> RuntimeResult<Vec<ContainerRecord>> {
        let host = self.inner.lock().unwrap();
        if host.fail_list {
            return Err(RuntimeError::Other("list failed".to_string()));
        }
        Ok(host
            .containers
            .iter()
            .filter(|c| filter.all || c.status == "running" || c.status == "restarting")
            .filter(|c| match &filter.label {
                Some((k, v)) => c.labels.get(k) == Some(v),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn run_container(&self, spec: &LaunchSpec) -> RuntimeResult<String> {
        let mut host = self.inner.lock().unwrap();
        host.launch_attempts += 1;
        if host.fail_launch_at == Some(host.launch_attempts) {
            return Err(RuntimeError::Other(format!("image pull failed: {}", spec.image)));
        }
        if host.containers.iter().any(|c| c.name == spec.name) {
            return Err(RuntimeError::Other(format!("name conflict: {}", spec.name)));
        }
        host.next_id += 1;
        host.clock += 1;
        let id = format!("c{}", host.next_id);
        let created = host.clock;
        host.containers.push(ContainerRecord {
            id: id.clone(),
            name: spec.name.clone(),
            labels: spec.labels.clone(),
            status: "running".to_string(),
            created,
            cpu_period: spec.cpu_period,
            cpu_quota: spec.cpu_quota,
            memory_bytes: spec.memory_bytes,
        });
        host.launches.push(spec.clone());
        Ok(id)
    }

    async fn kill_container(&self, id: &str) -> RuntimeResult<()> {
        let mut host = self.inner.lock().unwrap();
        let container = host
            .containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        container.status = "exited".to_string();
        let name = container.name.clone();
        host.kills.push(name);
        Ok(())
    }

    async fn prune_containers(&self) -> RuntimeResult<()> {
        let mut host = self.inner.lock().unwrap();
        host.prunes += 1;
        if host.fail_prune {
            return Err(RuntimeError::Other("prune failed".to_string()));
        }
        host.containers
            .retain(|c| c.status == "running" || c.status == "restarting" || c.status == "paused");
        Ok(())
    }

    async fn prune_volumes(&self) -> RuntimeResult<()> {
        if self.inner.lock().unwrap().fail_prune {
            return Err(RuntimeError::Other("volume prune failed".to_string()));
        }
        Ok(())
    }
}

/// Collects formatted log output so tests can assert on warnings.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
