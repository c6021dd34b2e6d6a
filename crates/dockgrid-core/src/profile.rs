//! Service run profiles.
//!
//! A profile is created by the caller and registered with a controller
//! once per service name. Registering again replaces the prior profile
//! wholesale; there is no merge.

use serde::{Deserialize, Serialize};

/// A single `NAME=value` environment entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Render as the `NAME=value` form container runtimes expect.
    pub fn render(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// How to run one container of a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerConfig {
    /// Image reference (e.g. `registry.local/extract:4.1`).
    pub image: String,
    /// Command override; the image default is used when absent.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// CPU limit in cores. Fractional values are allowed.
    #[serde(default)]
    pub cpu_cores: f64,
    /// Hard memory limit in MiB.
    #[serde(default)]
    pub ram_mb: u64,
    /// Networks to attach. Only the first one is used.
    #[serde(default)]
    pub network: Vec<String>,
    /// Ordered environment entries.
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
}

/// What to run for one service kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceProfile {
    /// Unique key for the service.
    pub name: String,
    #[serde(rename = "container")]
    pub container_config: ContainerConfig,
}

impl ServiceProfile {
    pub fn new(name: impl Into<String>, container_config: ContainerConfig) -> Self {
        Self {
            name: name.into(),
            container_config,
        }
    }
}

/// Extra launch-time settings registered alongside a profile.
///
/// Environment entries here are appended after the profile's own and
/// override any entry with the same name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdates {
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
}

impl ProfileUpdates {
    /// Merge `base` with these updates, keeping first-seen order.
    pub fn apply(&self, base: &[EnvironmentVariable]) -> Vec<EnvironmentVariable> {
        let mut merged: Vec<EnvironmentVariable> = base.to_vec();
        for update in &self.environment {
            match merged.iter_mut().find(|e| e.name == update.name) {
                Some(existing) => existing.value = update.value.clone(),
                None => merged.push(update.clone()),
            }
        }
        merged
    }
}
