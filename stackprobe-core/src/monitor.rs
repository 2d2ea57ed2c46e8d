//! Compose project resource monitor.
//!
//! Samples `docker stats` for every container of a compose project at a fixed
//! interval and appends one CSV row per container plus an aggregated project
//! row per tick. The CSV is the input to the summarizer's memory series.

use crate::engine::ComposeEngine;
use crate::error::{ProbeError, Result};
use chrono::{Local, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Extra sampling time past the requested duration, so a load test that runs
/// exactly `duration` still gets its final samples recorded.
const DURATION_BUFFER: Duration = Duration::from_secs(60);

/// Monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Compose project name (the label docker attaches to its containers).
    pub project: String,
    /// Sampling interval.
    pub interval: Duration,
    /// Total sampling duration; `None` runs until interrupted.
    pub duration: Option<Duration>,
    /// Output CSV path (appended to; header written only when new).
    pub csv_path: PathBuf,
}

impl MonitorConfig {
    pub fn new(project: String, csv_path: PathBuf) -> Self {
        Self { project, interval: Duration::from_secs(60), duration: None, csv_path }
    }
}

/// One CSV row. `scope` distinguishes per-container rows from the aggregated
/// project row (`container_name = ALL`).
#[derive(Debug, Clone, Serialize)]
struct MonitorRecord {
    /// Unix timestamp in milliseconds (UTC).
    timestamp: i64,
    timestamp_local: String,
    project: String,
    container_name: String,
    container_id: String,
    memory_mib: f64,
    /// Empty for the aggregated row (docker's MemPerc is per-container).
    memory_percent: Option<f64>,
    cpu_percent: f64,
    scope: &'static str,
}

/// Resource monitor for a compose project.
pub struct Monitor {
    engine: Arc<dyn ComposeEngine>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(engine: Arc<dyn ComposeEngine>, config: MonitorConfig) -> Self {
        Self { engine, config }
    }

    /// Sample until the duration (plus buffer) elapses, or forever.
    pub async fn run(&self) -> Result<()> {
        let csv_exists = self.config.csv_path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.csv_path)
            .map_err(|e| ProbeError::IoError { path: self.config.csv_path.clone(), source: e })?;

        let mut writer =
            csv::WriterBuilder::new().has_headers(!csv_exists).from_writer(file);

        let end = self.config.duration.map(|d| Instant::now() + d + DURATION_BUFFER);

        info!(
            project = %self.config.project,
            interval_secs = self.config.interval.as_secs(),
            duration_secs = self.config.duration.map(|d| d.as_secs()),
            csv = %self.config.csv_path.display(),
            "Monitoring compose project"
        );

        loop {
            if let Some(end) = end {
                if Instant::now() >= end {
                    break;
                }
            }

            self.sample_once(&mut writer).await?;
            tokio::time::sleep(self.config.interval).await;
        }

        info!(project = %self.config.project, "Monitoring finished");
        Ok(())
    }

    /// Take one sample of every container and append the rows.
    async fn sample_once(
        &self,
        writer: &mut csv::Writer<std::fs::File>,
    ) -> Result<()> {
        let containers = self.engine.containers_for_project(&self.config.project).await?;
        if containers.is_empty() {
            warn!(project = %self.config.project, "No containers found (project stopped?)");
            return Ok(());
        }

        let timestamp = Utc::now().timestamp_millis();
        let timestamp_local = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut total_mem = 0.0;
        let mut total_cpu = 0.0;
        let mut sampled = 0usize;

        for container in &containers {
            let Some(stats) = self.engine.stats(&container.id).await? else {
                continue;
            };

            let memory_mib = parse_mem_to_mib(stats.mem_used());
            let cpu_percent = stats.cpu_percent();
            total_mem += memory_mib;
            total_cpu += cpu_percent;
            sampled += 1;

            writer
                .serialize(MonitorRecord {
                    timestamp,
                    timestamp_local: timestamp_local.clone(),
                    project: self.config.project.clone(),
                    container_name: container.name.clone(),
                    container_id: container.id.clone(),
                    memory_mib: round2(memory_mib),
                    memory_percent: Some(stats.mem_percent()),
                    cpu_percent,
                    scope: "container",
                })
                .map_err(|e| ProbeError::CsvError {
                    path: self.config.csv_path.clone(),
                    source: e,
                })?;
        }

        // Aggregated project row
        writer
            .serialize(MonitorRecord {
                timestamp,
                timestamp_local: timestamp_local.clone(),
                project: self.config.project.clone(),
                container_name: "ALL".to_string(),
                container_id: "ALL".to_string(),
                memory_mib: round2(total_mem),
                memory_percent: None,
                cpu_percent: round2(total_cpu),
                scope: "project",
            })
            .map_err(|e| ProbeError::CsvError {
                path: self.config.csv_path.clone(),
                source: e,
            })?;

        writer
            .flush()
            .map_err(|e| ProbeError::IoError { path: self.config.csv_path.clone(), source: e })?;

        info!(
            containers = sampled,
            total_mem_mib = format!("{:.1}", total_mem),
            total_cpu_percent = format!("{:.1}", total_cpu),
            "Sampled"
        );

        Ok(())
    }
}

/// Convert a docker stats memory string to MiB.
///
/// Handles `123.4MiB`, `1.23GiB`, `512KiB`, and `0B`. Anything unrecognized
/// maps to 0.0 rather than aborting a long monitoring session.
pub fn parse_mem_to_mib(raw: &str) -> f64 {
    let s = raw.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    let Ok(value) = num.parse::<f64>() else {
        return 0.0;
    };

    match unit.trim() {
        "GiB" => value * 1024.0,
        "MiB" => value,
        "KiB" => value / 1024.0,
        "B" | "" => value / (1024.0 * 1024.0),
        _ => 0.0,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
