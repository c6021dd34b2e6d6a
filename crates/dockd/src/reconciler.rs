//! Reconciler — the periodic loop that calls into the controller.
//!
//! Each cycle calls `set_target` once per configured service. A failure
//! for one service is logged and never stops the others; the next cycle
//! retries it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use dockgrid_controller::{ScalingController, ServiceControlError};
use dockgrid_core::ServiceEntry;

/// Outcome of one cycle, per service.
pub type CycleReport = Vec<(String, Result<(), ServiceControlError>)>;

pub struct Reconciler {
    controller: Arc<dyn ScalingController>,
    /// (service name, desired instance count), in config order.
    targets: Vec<(String, u32)>,
    host_refresh: Option<Duration>,
    last_refresh: Instant,
}

impl Reconciler {
    pub fn new(controller: Arc<dyn ScalingController>, services: &[ServiceEntry]) -> Self {
        Self {
            controller,
            targets: services
                .iter()
                .map(|s| (s.name.clone(), s.target))
                .collect(),
            host_refresh: None,
            last_refresh: Instant::now(),
        }
    }

    /// Re-read host capacity once per `interval`.
    pub fn with_host_refresh(mut self, interval: Duration) -> Self {
        self.host_refresh = Some(interval);
        self
    }

    pub async fn register_profiles(&self, services: &[ServiceEntry]) {
        for service in services {
            self.controller
                .add_profile(service.profile(), service.updates.clone())
                .await;
        }
        info!(count = services.len(), "profiles registered");
    }

    /// Run one reconciliation pass over every service.
    pub async fn reconcile_once(&mut self) -> CycleReport {
        self.maybe_refresh_host().await;

        let mut report = Vec::with_capacity(self.targets.len());
        for (service, target) in &self.targets {
            let result = self.controller.set_target(service, *target).await;
            match &result {
                Ok(()) => debug!(%service, target, "service reconciled"),
                Err(e) if e.is_configuration() => {
                    error!(%service, error = %e, "service misconfigured")
                }
                Err(e) => error!(%service, error = %e, "reconciliation failed"),
            }
            report.push((service.clone(), result));
        }
        report
    }

    async fn maybe_refresh_host(&mut self) {
        let Some(interval) = self.host_refresh else {
            return;
        };
        if self.last_refresh.elapsed() < interval {
            return;
        }
        self.last_refresh = Instant::now();
        if let Err(e) = self.controller.refresh_host_info().await {
            warn!(error = %e, "failed to refresh host info");
        }
    }

    /// Run the reconciliation loop until `shutdown` flips.
    pub async fn run(&mut self, interval: Duration, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "reconciler started");

        loop {
            let report = self.reconcile_once().await;
            let failed = report.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                warn!(failed, total = report.len(), "reconciliation cycle had failures");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("reconciler shutting down");
                    break;
                }
            }
        }
    }
}
