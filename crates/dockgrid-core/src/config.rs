//! dockgrid.toml configuration parser.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::profile::{ContainerConfig, ProfileUpdates, ServiceProfile};

/// CPU held back for the host's own processes, in cores.
pub const DEFAULT_RESERVED_CPU: f64 = 0.3;
/// Memory held back for the host's own processes, in MiB.
pub const DEFAULT_RESERVED_MEMORY_MB: f64 = 500.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockgridConfig {
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

/// Which controller backend to build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// A single, non-clustered Docker host.
    #[default]
    Docker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSettings {
    #[serde(default)]
    pub backend: BackendKind,
    /// Prepended as `<prefix>_` to every container name when non-empty.
    #[serde(default)]
    pub prefix: String,
    /// Labels merged into every launched container.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default = "one")]
    pub cpu_overallocation: f64,
    #[serde(default = "one")]
    pub memory_overallocation: f64,
    #[serde(default = "default_reserved_cpu")]
    pub reserved_cpu: f64,
    #[serde(default = "default_reserved_memory_mb")]
    pub reserved_memory_mb: f64,
    /// How often to re-read host capacity (e.g. "10m"). Never when unset.
    #[serde(default)]
    pub host_refresh_interval: Option<String>,
    /// Host paths bound read-only into every container.
    #[serde(default)]
    pub global_mounts: Vec<GlobalMount>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            prefix: String::new(),
            labels: BTreeMap::new(),
            cpu_overallocation: 1.0,
            memory_overallocation: 1.0,
            reserved_cpu: DEFAULT_RESERVED_CPU,
            reserved_memory_mb: DEFAULT_RESERVED_MEMORY_MB,
            host_refresh_interval: None,
            global_mounts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalMount {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// A service to manage plus its desired instance count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(default)]
    pub target: u32,
    pub container: ContainerConfig,
    #[serde(default)]
    pub updates: Option<ProfileUpdates>,
}

impl ServiceEntry {
    pub fn profile(&self) -> ServiceProfile {
        ServiceProfile::new(self.name.clone(), self.container.clone())
    }
}

fn one() -> f64 {
    1.0
}

fn default_reserved_cpu() -> f64 {
    DEFAULT_RESERVED_CPU
}

fn default_reserved_memory_mb() -> f64 {
    DEFAULT_RESERVED_MEMORY_MB
}

impl DockgridConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: DockgridConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let c = &self.controller;
        if !(c.cpu_overallocation > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cpu_overallocation must be positive, got {}",
                c.cpu_overallocation
            )));
        }
        if !(c.memory_overallocation > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "memory_overallocation must be positive, got {}",
                c.memory_overallocation
            )));
        }
        if c.reserved_cpu < 0.0 || c.reserved_memory_mb < 0.0 {
            return Err(ConfigError::Invalid(
                "host reservations cannot be negative".to_string(),
            ));
        }
        if let Some(interval) = &c.host_refresh_interval
            && parse_duration(interval).is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "unparseable host_refresh_interval: {interval}"
            )));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.is_empty() {
                return Err(ConfigError::Invalid("service with empty name".to_string()));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service: {}",
                    service.name
                )));
            }
            if service.container.cpu_cores < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "service {} has negative cpu_cores",
                    service.name
                )));
            }
        }
        Ok(())
    }

    /// The parsed host refresh interval, if one is configured.
    pub fn host_refresh_interval(&self) -> Option<Duration> {
        self.controller
            .host_refresh_interval
            .as_deref()
            .and_then(parse_duration)
    }
}

/// Parse a duration string like "30s", "5m" or "1h".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, scale) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600)
    } else {
        (s, 1)
    };
    digits
        .parse::<u64>()
        .ok()
        .map(|n| Duration::from_secs(n * scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
[controller]
backend = "docker"
prefix = "dg"
cpu_overallocation = 2.0
host_refresh_interval = "10m"

[controller.labels]
app = "dockgrid"

[[controller.global_mounts]]
source = "/srv/shared"
target = "/mount/shared"

[[services]]
name = "extract"
target = 2

[services.container]
image = "registry.local/extract:4.1"
command = ["python", "-m", "service"]
cpu_cores = 1.5
ram_mb = 1024
network = ["svc-net"]
environment = [{ name = "LOG_LEVEL", value = "INFO" }]
"#;

    #[test]
    fn parse_full_config() {
        let config = DockgridConfig::parse(FULL).unwrap();
        assert_eq!(config.controller.backend, BackendKind::Docker);
        assert_eq!(config.controller.prefix, "dg");
        assert_eq!(config.controller.cpu_overallocation, 2.0);
        assert_eq!(config.controller.memory_overallocation, 1.0);
        assert_eq!(config.controller.reserved_cpu, 0.3);
        assert_eq!(config.controller.reserved_memory_mb, 500.0);
        assert_eq!(config.controller.labels["app"], "dockgrid");
        assert_eq!(config.controller.global_mounts.len(), 1);
        assert_eq!(
            config.host_refresh_interval(),
            Some(Duration::from_secs(600))
        );

        let svc = &config.services[0];
        assert_eq!(svc.target, 2);
        let profile = svc.profile();
        assert_eq!(profile.name, "extract");
        assert_eq!(profile.container_config.cpu_cores, 1.5);
        assert_eq!(profile.container_config.network, vec!["svc-net"]);
        assert_eq!(profile.container_config.environment[0].render(), "LOG_LEVEL=INFO");
    }

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = DockgridConfig::parse("").unwrap();
        assert!(config.services.is_empty());
        assert!(config.controller.prefix.is_empty());
        assert_eq!(config.host_refresh_interval(), None);
    }

    #[test]
    fn reject_unknown_backend() {
        let err = DockgridConfig::parse("[controller]\nbackend = \"swarm\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reject_zero_overallocation() {
        let err =
            DockgridConfig::parse("[controller]\nmemory_overallocation = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reject_duplicate_services() {
        let doc = r#"
[[services]]
name = "a"
container = { image = "x" }

[[services]]
name = "a"
container = { image = "y" }
"#;
        let err = DockgridConfig::parse(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate service: a"));
    }

    #[test]
    fn reject_bad_refresh_interval() {
        let err = DockgridConfig::parse("[controller]\nhost_refresh_interval = \"soon\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = DockgridConfig::from_file(file.path()).unwrap();
        assert_eq!(config.services.len(), 1);
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let err = DockgridConfig::from_file(Path::new("/nonexistent/dockgrid.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("invalid"), None);
    }
}
