//! The scaling controller contract.

use async_trait::async_trait;

use dockgrid_core::{ProfileUpdates, ServiceProfile};

use crate::error::{ControllerResult, ServiceControlError};

/// Capability set every controller backend provides.
///
/// All operations are keyed by service name. The caller owns desired
/// state; a controller only converges toward the target it is handed and
/// reports what it observes. Calls for the same service must be
/// serialized by the caller.
#[async_trait]
pub trait ScalingController: Send + Sync {
    /// Register or replace the run profile for `profile.name`.
    ///
    /// No validation beyond structure happens here; a bad image or
    /// command surfaces later as a launch failure.
    async fn add_profile(&self, profile: ServiceProfile, updates: Option<ProfileUpdates>);

    /// Number of live (running or restarting) instances of a service.
    async fn get_target(&self, service_name: &str) -> ControllerResult<u32>;

    /// Drive the live instance count toward `target`.
    async fn set_target(&self, service_name: &str, target: u32)
    -> Result<(), ServiceControlError>;

    /// Estimated unreserved CPU, in cores, after overallocation.
    async fn free_cpu(&self) -> ControllerResult<f64>;

    /// Estimated unreserved memory, in MiB, after overallocation.
    async fn free_memory(&self) -> ControllerResult<f64>;

    /// Re-read host capacity from the runtime.
    async fn refresh_host_info(&self) -> ControllerResult<()>;
}
