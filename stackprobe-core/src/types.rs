//! Core data model for the test harness: targets, outcomes, run summaries.

use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One application directory to be tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Resolved filesystem path (tilde-expanded).
    pub path: PathBuf,
    /// Display name used in reports (directory basename).
    pub name: String,
}

impl Target {
    /// Create a target from a raw CLI argument, expanding a leading `~`.
    pub fn new(raw: &str) -> Self {
        let path = paths::expand_tilde(raw);
        let name = paths::display_name(&path);
        Self { path, name }
    }

    /// Create a target from an already-resolved path.
    pub fn from_path(path: &Path) -> Self {
        Self { path: path.to_path_buf(), name: paths::display_name(path) }
    }
}

/// Why a target failed. Every reason is terminal for its target and
/// non-fatal for the overall run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    /// Target directory does not exist (or is not a directory).
    DirectoryMissing,
    /// Target directory exists but cannot be read.
    DirectoryInaccessible,
    /// No compose definition file present in the directory.
    ComposeFileMissing,
    /// Build/start exceeded the harness timeout (or exited with code 124).
    BuildTimeout,
    /// Build/start exited non-zero.
    BuildError { code: Option<i32> },
    /// Build succeeded but no service reported running within the wait window.
    NoRunningServices,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryMissing => write!(f, "directory not found"),
            Self::DirectoryInaccessible => write!(f, "directory not accessible"),
            Self::ComposeFileMissing => write!(f, "no docker-compose.yml"),
            Self::BuildTimeout => write!(f, "build timeout"),
            Self::BuildError { code: Some(code) } => write!(f, "build failed (exit {})", code),
            Self::BuildError { code: None } => write!(f, "build failed"),
            Self::NoRunningServices => write!(f, "no running services"),
        }
    }
}

/// Result of testing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Stack built and at least one service reported running.
    Success {
        /// Names of services reporting a running status.
        services: Vec<String>,
    },
    /// Stack failed; the reason is recorded in the failure list.
    Fail(FailReason),
}

impl TargetOutcome {
    /// Whether this outcome counts as a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Full per-target record: the target, its outcome, and any captured
/// build output (present when the build ran and the target failed).
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub outcome: TargetOutcome,
    /// Combined stdout/stderr of the build, kept for the full log on failure.
    pub build_output: Option<String>,
}

/// Counts for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Fold one outcome into the counts.
    pub fn record(&mut self, outcome: &TargetOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Whether every target succeeded.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for the run: 0 if zero failures occurred, else 1.
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_name_is_basename() {
        let t = Target::new("/opt/apps/gemini-2.5-flash-445");
        assert_eq!(t.name, "gemini-2.5-flash-445");
        assert_eq!(t.path, PathBuf::from("/opt/apps/gemini-2.5-flash-445"));
    }

    #[test]
    fn test_fail_reason_display() {
        assert_eq!(FailReason::ComposeFileMissing.to_string(), "no docker-compose.yml");
        assert_eq!(FailReason::DirectoryMissing.to_string(), "directory not found");
        assert_eq!(FailReason::BuildTimeout.to_string(), "build timeout");
        assert_eq!(FailReason::BuildError { code: Some(2) }.to_string(), "build failed (exit 2)");
        assert_eq!(FailReason::BuildError { code: None }.to_string(), "build failed");
        assert_eq!(FailReason::NoRunningServices.to_string(), "no running services");
    }

    #[test]
    fn test_summary_counts_and_exit_code() {
        let mut summary = RunSummary::default();
        summary.record(&TargetOutcome::Success { services: vec!["web".into()] });
        summary.record(&TargetOutcome::Fail(FailReason::ComposeFileMissing));
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
        assert_eq!(summary.exit_code(), 1);

        let mut clean = RunSummary::default();
        clean.record(&TargetOutcome::Success { services: vec![] });
        assert_eq!(clean.exit_code(), 0);
    }
}
