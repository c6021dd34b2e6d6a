//! dockgrid-core — service profiles and configuration.
//!
//! Shared types consumed by the scaling controller and the daemon:
//!
//! - [`ServiceProfile`]: the declarative run profile of one service kind
//! - [`DockgridConfig`]: the `dockgrid.toml` configuration file

pub mod config;
pub mod error;
pub mod profile;

pub use config::{
    BackendKind, ControllerSettings, DockgridConfig, GlobalMount, ServiceEntry, parse_duration,
};
pub use error::{ConfigError, ConfigResult};
pub use profile::{ContainerConfig, EnvironmentVariable, ProfileUpdates, ServiceProfile};
