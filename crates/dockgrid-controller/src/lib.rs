//! dockgrid-controller — keeps service replica counts at target.
//!
//! The [`ScalingController`] trait is the contract the reconciliation loop
//! talks to. [`DockerController`] implements it against one non-clustered
//! Docker host, reached through the [`ContainerRuntime`] seam.
//!
//! # Reconciliation
//!
//! ```text
//! set_target(service, target)
//!   live   = containers labelled component=<service> in {running, restarting}
//!   delta  = target - |live|
//!   delta < 0  → kill |delta| live containers (newest first)
//!   delta > 0  → launch delta containers, one at a time
//!   always     → prune stopped containers and unused volumes
//! ```
//!
//! Nothing is cached between calls: every call re-reads the runtime, so
//! crashes, manual intervention, and partial failures correct themselves
//! on the next cycle.

pub mod backend;
pub mod docker;
pub mod error;
pub mod interface;
pub mod launch;
pub mod naming;
pub mod resources;
pub mod runtime;
pub mod single_host;
pub mod status;

pub use backend::build_controller;
pub use docker::DockerRuntime;
pub use error::{ControllerError, ControllerResult, ServiceControlError};
pub use interface::ScalingController;
pub use launch::{CPU_PERIOD_US, LaunchSpec};
pub use naming::{container_name, next_free_name};
pub use resources::ResourceAccountant;
pub use runtime::{
    ContainerFilter, ContainerRecord, ContainerRuntime, HostInfo, RuntimeError, RuntimeResult,
};
pub use single_host::DockerController;
pub use status::ContainerStatus;
