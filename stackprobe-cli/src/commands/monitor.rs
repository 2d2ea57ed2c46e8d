//! `stackprobe monitor` - sample container resources for a compose project.

use anyhow::{Context, Result};
use colored::Colorize;
use stackprobe_core::{Config, DockerCompose, Monitor, MonitorConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    project: String,
    interval: u64,
    duration: Option<u64>,
    csv: PathBuf,
) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let engine = match &config.compose_binary {
        Some(binary) => DockerCompose::with_binary(PathBuf::from(binary)),
        None => DockerCompose::detect().context("No compose-capable docker found")?,
    };

    println!("{}", "Monitoring Configuration:".bold());
    println!("  {}: {}", "Project".bold(), project);
    println!("  {}: {}s", "Interval".bold(), interval);
    match duration {
        Some(secs) => println!("  {}: {}s (60s buffer added)", "Duration".bold(), secs),
        None => println!("  {}: until interrupted", "Duration".bold()),
    }
    println!("  {}: {}", "CSV".bold(), csv.display());
    println!();

    let mut monitor_config = MonitorConfig::new(project, csv);
    monitor_config.interval = Duration::from_secs(interval);
    monitor_config.duration = duration.map(Duration::from_secs);

    let monitor = Monitor::new(Arc::new(engine), monitor_config);

    tokio::select! {
        result = monitor.run() => {
            result.context("Monitoring failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("{}", "Stopped.".dimmed());
        }
    }

    Ok(())
}
