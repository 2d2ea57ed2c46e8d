//! Sequential compose-stack test harness.
//!
//! For each target directory: verify the directory and compose file, build
//! and start the stack in detached mode, wait for at least one running
//! service, then tear the stack down unconditionally before moving on. One
//! active stack at a time; a failure is terminal for its target and never
//! aborts the run.

pub mod report;

use crate::compose;
use crate::engine::{BuildStatus, ComposeEngine};
use crate::error::{ProbeError, Result};
use crate::types::{FailReason, RunSummary, Target, TargetOutcome, TargetReport};
use report::ReportWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Harness tuning knobs.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Hard limit on one `up -d --build` invocation.
    pub build_timeout: Duration,
    /// Initial pause before the first readiness check.
    pub settle: Duration,
    /// Maximum total wait for a running service after a successful build.
    pub max_ready_wait: Duration,
    /// Directory receiving the three report artifacts.
    pub output_dir: PathBuf,
    pub log_file: String,
    pub success_file: String,
    pub failure_file: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let config = crate::config::Config::default();
        Self {
            build_timeout: Duration::from_secs(config.build_timeout_secs),
            settle: Duration::from_secs(config.settle_secs),
            max_ready_wait: Duration::from_secs(config.max_ready_wait_secs),
            output_dir: PathBuf::from("."),
            log_file: config.log_file,
            success_file: config.success_file,
            failure_file: config.failure_file,
        }
    }
}

impl HarnessConfig {
    /// Build a harness config from persistent configuration.
    pub fn from_config(config: &crate::config::Config, output_dir: PathBuf) -> Self {
        Self {
            build_timeout: Duration::from_secs(config.build_timeout_secs),
            settle: Duration::from_secs(config.settle_secs),
            max_ready_wait: Duration::from_secs(config.max_ready_wait_secs),
            output_dir,
            log_file: config.log_file.clone(),
            success_file: config.success_file.clone(),
            failure_file: config.failure_file.clone(),
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub reports: Vec<TargetReport>,
    pub summary: RunSummary,
}

/// The test harness itself.
pub struct Harness {
    engine: Arc<dyn ComposeEngine>,
    config: HarnessConfig,
}

impl Harness {
    pub fn new(engine: Arc<dyn ComposeEngine>, config: HarnessConfig) -> Self {
        Self { engine, config }
    }

    /// Run every target in order, producing the three report artifacts.
    ///
    /// All three output files are truncated up front so consecutive runs
    /// regenerate them from scratch.
    pub async fn run(&self, targets: &[Target]) -> Result<RunReport> {
        let mut writer = ReportWriter::create(
            &self.config.output_dir,
            &self.config.log_file,
            &self.config.success_file,
            &self.config.failure_file,
        )?;

        // Scratch space for raw build transcripts, removed on every exit path.
        let scratch = tempfile::tempdir()
            .map_err(|e| ProbeError::IoError { path: std::env::temp_dir(), source: e })?;

        let mut reports = Vec::with_capacity(targets.len());
        let mut summary = RunSummary::default();

        for target in targets {
            writer.step(&format!("==> Testing {} ({})", target.name, target.path.display()))?;

            let report = self.run_target(target, scratch.path()).await;

            match &report.outcome {
                TargetOutcome::Success { services } => {
                    info!(target = %target.name, running = services.len(), "Target passed");
                }
                TargetOutcome::Fail(reason) => {
                    warn!(target = %target.name, reason = %reason, "Target failed");
                }
            }

            writer.record(&report)?;
            summary.record(&report.outcome);
            reports.push(report);
        }

        writer.finish(&summary)?;
        Ok(RunReport { reports, summary })
    }

    /// Test one target, always attempting teardown afterwards.
    async fn run_target(&self, target: &Target, scratch: &Path) -> TargetReport {
        let (outcome, build_output) = self.execute(target, scratch).await;

        // Unconditional cleanup so no stack leaks into the next target. Safe
        // to call for targets that never started (or whose directory is gone).
        if let Err(e) = self.engine.down(&target.path).await {
            warn!(target = %target.name, error = %e, "Teardown reported an error");
        }

        TargetReport { target: target.clone(), outcome, build_output }
    }

    async fn execute(&self, target: &Target, scratch: &Path) -> (TargetOutcome, Option<String>) {
        match std::fs::metadata(&target.path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return (TargetOutcome::Fail(FailReason::DirectoryMissing), None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (TargetOutcome::Fail(FailReason::DirectoryMissing), None);
            }
            Err(_) => return (TargetOutcome::Fail(FailReason::DirectoryInaccessible), None),
        }

        let Some(compose_path) = compose::find_compose_file(&target.path) else {
            return (TargetOutcome::Fail(FailReason::ComposeFileMissing), None);
        };

        // Pre-flight parse for the transcript only; the engine is the
        // authority on whether the file actually builds.
        match compose::ComposeFile::parse_file(&compose_path) {
            Ok(compose) => {
                info!(
                    target = %target.name,
                    services = compose.services.len(),
                    "Compose file parsed"
                );
            }
            Err(e) => {
                warn!(target = %target.name, error = %e, "Compose file failed pre-flight parse");
            }
        }

        let build = match self.engine.up_detached(&target.path, self.config.build_timeout).await {
            Ok(build) => build,
            Err(e) => {
                warn!(target = %target.name, error = %e, "Failed to invoke compose up");
                return (
                    TargetOutcome::Fail(FailReason::BuildError { code: None }),
                    Some(e.to_string()),
                );
            }
        };

        // Keep the raw transcript around for the duration of the run.
        let transcript = scratch.join(format!("{}.build.log", target.name));
        if let Err(e) = std::fs::write(&transcript, &build.output) {
            warn!(target = %target.name, error = %e, "Could not write scratch build log");
        }

        match build.status {
            BuildStatus::TimedOut => {
                (TargetOutcome::Fail(FailReason::BuildTimeout), Some(build.output))
            }
            BuildStatus::Failed { code } => {
                (TargetOutcome::Fail(FailReason::BuildError { code }), Some(build.output))
            }
            BuildStatus::Success => {
                let services = self.wait_for_running_services(&target.path).await;
                if services.is_empty() {
                    (TargetOutcome::Fail(FailReason::NoRunningServices), Some(build.output))
                } else {
                    (TargetOutcome::Success { services }, None)
                }
            }
        }
    }

    /// Bounded readiness poll: start at the settle interval, back off
    /// exponentially, give up at `max_ready_wait`.
    async fn wait_for_running_services(&self, dir: &Path) -> Vec<String> {
        let deadline = Instant::now() + self.config.max_ready_wait;
        let mut delay = self.config.settle.max(Duration::from_millis(100));

        loop {
            tokio::time::sleep(delay).await;

            match self.engine.running_services(dir).await {
                Ok(services) if !services.is_empty() => return services,
                Ok(_) => {}
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Running-service query failed");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Vec::new();
            }
            delay = (delay * 2).min(deadline - now);
        }
    }
}
