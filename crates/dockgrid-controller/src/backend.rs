//! Backend selection.

use dockgrid_core::{BackendKind, ControllerSettings};

use crate::docker::DockerRuntime;
use crate::error::ControllerResult;
use crate::interface::ScalingController;
use crate::single_host::DockerController;

/// Build the controller backend named in `settings`.
pub async fn build_controller(
    settings: &ControllerSettings,
) -> ControllerResult<Box<dyn ScalingController>> {
    match settings.backend {
        BackendKind::Docker => {
            let runtime = DockerRuntime::connect()?;
            let controller = DockerController::new(runtime, settings).await?;
            Ok(Box::new(controller))
        }
    }
}
