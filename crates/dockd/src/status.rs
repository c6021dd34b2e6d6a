//! One-shot status report.

use serde::Serialize;

use dockgrid_controller::ScalingController;
use dockgrid_core::ServiceEntry;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub live: u32,
    pub target: u32,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub services: Vec<ServiceStatus>,
    pub free_cpu: f64,
    pub free_memory_mb: f64,
}

pub async fn collect(
    controller: &dyn ScalingController,
    services: &[ServiceEntry],
) -> anyhow::Result<StatusReport> {
    let mut statuses = Vec::with_capacity(services.len());
    for service in services {
        statuses.push(ServiceStatus {
            name: service.name.clone(),
            live: controller.get_target(&service.name).await?,
            target: service.target,
        });
    }

    Ok(StatusReport {
        services: statuses,
        free_cpu: controller.free_cpu().await?,
        free_memory_mb: controller.free_memory().await?,
    })
}

pub fn render_text(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<24} {:>6} {:>6}\n", "SERVICE", "LIVE", "TARGET"));
    for s in &report.services {
        out.push_str(&format!("{:<24} {:>6} {:>6}\n", s.name, s.live, s.target));
    }
    out.push_str(&format!(
        "\nfree cpu: {:.2} cores, free memory: {:.0} MiB\n",
        report.free_cpu, report.free_memory_mb
    ));
    out
}

pub fn print(report: &StatusReport, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        "text" => print!("{}", render_text(report)),
        other => anyhow::bail!("unknown output format: {other}"),
    }
    Ok(())
}
