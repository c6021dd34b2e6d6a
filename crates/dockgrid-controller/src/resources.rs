//! Free capacity estimation.
//!
//! ```text
//! free = host_total * overallocation - host_reservation - Σ live reservations
//! ```
//!
//! Accounting is reservation-based: a container contributes its configured
//! limits, not its actual usage. Every live container on the host counts,
//! including ones this controller did not launch. The estimate is advisory;
//! nothing stops a launch from overcommitting.

use dockgrid_core::ControllerSettings;

use crate::runtime::{ContainerRecord, HostInfo};

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAccountant {
    pub cpu_overallocation: f64,
    pub memory_overallocation: f64,
    /// Cores held back for the host.
    pub reserved_cpu: f64,
    /// MiB held back for the host.
    pub reserved_memory_mb: f64,
}

impl ResourceAccountant {
    pub fn from_settings(settings: &ControllerSettings) -> Self {
        Self {
            cpu_overallocation: settings.cpu_overallocation,
            memory_overallocation: settings.memory_overallocation,
            reserved_cpu: settings.reserved_cpu,
            reserved_memory_mb: settings.reserved_memory_mb,
        }
    }

    pub fn free_cpu(&self, host: &HostInfo, containers: &[ContainerRecord]) -> f64 {
        let reserved: f64 = containers
            .iter()
            .filter(|c| c.status().is_live())
            .map(cpu_reservation)
            .sum();
        host.cpus * self.cpu_overallocation - self.reserved_cpu - reserved
    }

    pub fn free_memory(&self, host: &HostInfo, containers: &[ContainerRecord]) -> f64 {
        let reserved: f64 = containers
            .iter()
            .filter(|c| c.status().is_live())
            .map(memory_reservation_mb)
            .sum();
        host.memory_mb() * self.memory_overallocation - self.reserved_memory_mb - reserved
    }
}

/// Cores reserved by a container; zero when it has no CPU limit.
pub fn cpu_reservation(container: &ContainerRecord) -> f64 {
    if container.cpu_period > 0 && container.cpu_quota > 0 {
        container.cpu_quota as f64 / container.cpu_period as f64
    } else {
        0.0
    }
}

pub fn memory_reservation_mb(container: &ContainerRecord) -> f64 {
    container.memory_bytes.max(0) as f64 / MIB
}
