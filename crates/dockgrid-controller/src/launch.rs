//! Launch parameters for one service container.

use std::collections::{BTreeMap, HashMap};

use dockgrid_core::{EnvironmentVariable, GlobalMount, ProfileUpdates, ServiceProfile};

use crate::error::{ControllerError, ControllerResult};

/// CFS period used for every container, in microseconds.
pub const CPU_PERIOD_US: i64 = 100_000;

const MIB: i64 = 1024 * 1024;

/// Everything the runtime needs to start one container.
///
/// Containers are always launched detached with an always-restart policy.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    pub name: String,
    pub image: String,
    pub command: Option<Vec<String>>,
    /// `NAME=value` entries.
    pub environment: Vec<String>,
    pub labels: HashMap<String, String>,
    pub cpu_period: i64,
    pub cpu_quota: i64,
    pub memory_bytes: i64,
    pub network: String,
    /// Read-only `host:container:ro` binds.
    pub binds: Vec<String>,
}

impl LaunchSpec {
    pub fn build(
        name: String,
        profile: &ServiceProfile,
        updates: Option<&ProfileUpdates>,
        labels: &BTreeMap<String, String>,
        mounts: &[GlobalMount],
    ) -> ControllerResult<Self> {
        let cfg = &profile.container_config;
        let network = cfg
            .network
            .first()
            .cloned()
            .ok_or_else(|| ControllerError::InvalidProfile {
                service: profile.name.clone(),
                reason: "no network configured".to_string(),
            })?;

        let mut all_labels: HashMap<String, String> = labels.clone().into_iter().collect();
        all_labels.insert("component".to_string(), profile.name.clone());

        let environment = match updates {
            Some(updates) => updates.apply(&cfg.environment),
            None => cfg.environment.clone(),
        };

        Ok(Self {
            name,
            image: cfg.image.clone(),
            command: cfg.command.clone(),
            environment: environment.iter().map(EnvironmentVariable::render).collect(),
            labels: all_labels,
            cpu_period: CPU_PERIOD_US,
            cpu_quota: (CPU_PERIOD_US as f64 * cfg.cpu_cores) as i64,
            memory_bytes: cfg.ram_mb as i64 * MIB,
            network,
            binds: mounts
                .iter()
                .map(|m| format!("{}:{}:ro", m.source.display(), m.target.display()))
                .collect(),
        })
    }
}
