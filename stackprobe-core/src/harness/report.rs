//! Run report artifacts: full log, success list, failure list.
//!
//! All three files live in the output directory and are truncated when the
//! writer is created, so every run regenerates them from scratch.

use crate::error::{ProbeError, Result};
use crate::types::{RunSummary, TargetOutcome, TargetReport};
use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the three per-run artifacts.
pub struct ReportWriter {
    log: File,
    success: File,
    failure: File,
    log_path: PathBuf,
}

impl ReportWriter {
    /// Create (truncate) the three artifacts in `output_dir`.
    pub fn create(
        output_dir: &Path,
        log_file: &str,
        success_file: &str,
        failure_file: &str,
    ) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| ProbeError::IoError { path: output_dir.to_path_buf(), source: e })?;

        let log_path = output_dir.join(log_file);
        let log = File::create(&log_path)
            .map_err(|e| ProbeError::IoError { path: log_path.clone(), source: e })?;

        let success_path = output_dir.join(success_file);
        let success = File::create(&success_path)
            .map_err(|e| ProbeError::IoError { path: success_path, source: e })?;

        let failure_path = output_dir.join(failure_file);
        let failure = File::create(&failure_path)
            .map_err(|e| ProbeError::IoError { path: failure_path, source: e })?;

        let mut writer = Self { log, success, failure, log_path };
        writer.step("Run started")?;
        Ok(writer)
    }

    /// Append a timestamped line to the full log, teeing it to the console.
    pub fn step(&mut self, message: &str) -> Result<()> {
        info!("{}", message);
        let line = format!("[{}] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        self.log
            .write_all(line.as_bytes())
            .map_err(|e| ProbeError::IoError { path: self.log_path.clone(), source: e })
    }

    /// Record one finished target: a log entry plus a line in exactly one of
    /// the success or failure lists. Failed builds also get their captured
    /// output embedded in the full log.
    pub fn record(&mut self, report: &TargetReport) -> Result<()> {
        let name = &report.target.name;

        match &report.outcome {
            TargetOutcome::Success { services } => {
                self.step(&format!("{}: OK ({} service(s) running)", name, services.len()))?;
                let line = format!("{}\n", name);
                self.success
                    .write_all(line.as_bytes())
                    .map_err(|e| ProbeError::IoError { path: self.log_path.clone(), source: e })?;
            }
            TargetOutcome::Fail(reason) => {
                self.step(&format!("{}: FAIL ({})", name, reason))?;
                if let Some(output) = &report.build_output {
                    self.embed_build_output(name, output)?;
                }
                let line = format!("{} -> FAIL ({})\n", name, reason);
                self.failure
                    .write_all(line.as_bytes())
                    .map_err(|e| ProbeError::IoError { path: self.log_path.clone(), source: e })?;
            }
        }

        self.flush()
    }

    /// Write the closing summary line.
    pub fn finish(&mut self, summary: &RunSummary) -> Result<()> {
        self.step(&format!(
            "Summary: total={} success={} failed={}",
            summary.total, summary.succeeded, summary.failed
        ))?;
        self.flush()
    }

    fn embed_build_output(&mut self, name: &str, output: &str) -> Result<()> {
        let block = format!(
            "----- build output ({}) -----\n{}\n-----------------------------\n",
            name,
            output.trim_end()
        );
        self.log
            .write_all(block.as_bytes())
            .map_err(|e| ProbeError::IoError { path: self.log_path.clone(), source: e })
    }

    fn flush(&mut self) -> Result<()> {
        for file in [&mut self.log, &mut self.success, &mut self.failure] {
            file.flush()
                .map_err(|e| ProbeError::IoError { path: self.log_path.clone(), source: e })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailReason, Target};

    fn report_for(name: &str, outcome: TargetOutcome, output: Option<&str>) -> TargetReport {
        TargetReport {
            target: Target::new(&format!("/tmp/{}", name)),
            outcome,
            build_output: output.map(str::to_string),
        }
    }

    #[test]
    fn test_artifacts_written_and_truncated() {
        let dir = tempfile::tempdir().unwrap();

        let mut writer =
            ReportWriter::create(dir.path(), "run.log", "ok.txt", "bad.txt").unwrap();
        writer
            .record(&report_for("beta", TargetOutcome::Success { services: vec!["web".into()] }, None))
            .unwrap();
        writer
            .record(&report_for(
                "alpha",
                TargetOutcome::Fail(FailReason::ComposeFileMissing),
                None,
            ))
            .unwrap();
        let mut summary = RunSummary::default();
        summary.record(&TargetOutcome::Success { services: vec![] });
        summary.record(&TargetOutcome::Fail(FailReason::ComposeFileMissing));
        writer.finish(&summary).unwrap();
        drop(writer);

        let ok = std::fs::read_to_string(dir.path().join("ok.txt")).unwrap();
        assert_eq!(ok, "beta\n");
        let bad = std::fs::read_to_string(dir.path().join("bad.txt")).unwrap();
        assert_eq!(bad, "alpha -> FAIL (no docker-compose.yml)\n");
        let log = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(log.contains("beta: OK (1 service(s) running)"));
        assert!(log.contains("alpha: FAIL (no docker-compose.yml)"));
        assert!(log.contains("Summary: total=2 success=1 failed=1"));

        // A second writer truncates everything
        let writer2 = ReportWriter::create(dir.path(), "run.log", "ok.txt", "bad.txt").unwrap();
        drop(writer2);
        let ok = std::fs::read_to_string(dir.path().join("ok.txt")).unwrap();
        assert!(ok.is_empty());
        let bad = std::fs::read_to_string(dir.path().join("bad.txt")).unwrap();
        assert!(bad.is_empty());
    }

    #[test]
    fn test_build_output_embedded_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            ReportWriter::create(dir.path(), "run.log", "ok.txt", "bad.txt").unwrap();
        writer
            .record(&report_for(
                "gamma",
                TargetOutcome::Fail(FailReason::BuildError { code: Some(1) }),
                Some("Step 3/9 : RUN npm ci\nnpm ERR! network timeout"),
            ))
            .unwrap();
        drop(writer);

        let log = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(log.contains("----- build output (gamma) -----"));
        assert!(log.contains("npm ERR! network timeout"));
        let bad = std::fs::read_to_string(dir.path().join("bad.txt")).unwrap();
        assert_eq!(bad, "gamma -> FAIL (build failed (exit 1))\n");
    }
}
