//! Compose engine abstraction.
//!
//! The harness and the monitor talk to the container orchestration tool only
//! through the [`ComposeEngine`] trait, so tests can substitute a mock and the
//! working directory is always threaded explicitly instead of a process-wide
//! `cd`.

use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code conventionally produced by `timeout(1)` wrappers.
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Classification of a build/start invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// `up -d` exited zero.
    Success,
    /// `up -d` exited non-zero.
    Failed { code: Option<i32> },
    /// The harness timeout elapsed, or the tool exited with code 124.
    TimedOut,
}

/// Captured result of a build/start invocation.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub status: BuildStatus,
    /// Combined stdout and stderr.
    pub output: String,
}

/// A container belonging to a compose project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub id: String,
    pub name: String,
}

/// One `docker stats` sample, as emitted by `--format {{json .}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerStats {
    /// e.g. "123.4MiB / 7.765GiB"
    #[serde(rename = "MemUsage")]
    pub mem_usage: String,
    /// e.g. "1.56%"
    #[serde(rename = "MemPerc")]
    pub mem_perc: String,
    /// e.g. "0.35%"
    #[serde(rename = "CPUPerc")]
    pub cpu_perc: String,
}

impl ContainerStats {
    /// Memory in use, first component of `MemUsage`.
    pub fn mem_used(&self) -> &str {
        self.mem_usage.split('/').next().unwrap_or("").trim()
    }

    /// Memory usage percentage.
    pub fn mem_percent(&self) -> f64 {
        parse_percent(&self.mem_perc)
    }

    /// CPU usage percentage.
    pub fn cpu_percent(&self) -> f64 {
        parse_percent(&self.cpu_perc)
    }
}

fn parse_percent(raw: &str) -> f64 {
    raw.trim().trim_end_matches('%').parse().unwrap_or(0.0)
}

/// Interface to the container orchestration tool.
#[async_trait]
pub trait ComposeEngine: Send + Sync {
    /// Build and start all services in detached mode, with a hard timeout.
    async fn up_detached(&self, dir: &Path, timeout: Duration) -> Result<BuildOutput>;

    /// Names of services currently reporting a running status.
    async fn running_services(&self, dir: &Path) -> Result<Vec<String>>;

    /// Tear down the stack. Best effort: errors are logged, never escalated.
    async fn down(&self, dir: &Path) -> Result<()>;

    /// Containers labeled as belonging to a compose project.
    async fn containers_for_project(&self, project: &str) -> Result<Vec<ContainerRef>>;

    /// One-shot stats sample for a container. `None` when the container is
    /// gone or stats cannot be read (matches the monitor's skip semantics).
    async fn stats(&self, container_id: &str) -> Result<Option<ContainerStats>>;
}

/// How the compose subcommands are invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ComposeInvocation {
    /// `docker compose ...` (compose v2 plugin).
    Plugin,
    /// Standalone `docker-compose ...` binary.
    Standalone(PathBuf),
}

/// Production [`ComposeEngine`] wrapping the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerCompose {
    docker: PathBuf,
    invocation: ComposeInvocation,
}

impl DockerCompose {
    /// Auto-detect the docker binary, preferring the compose v2 plugin and
    /// falling back to a standalone `docker-compose`.
    pub fn detect() -> Result<Self> {
        if let Some(docker) = find_in_path("docker") {
            return Ok(Self { docker, invocation: ComposeInvocation::Plugin });
        }

        if let Some(compose) = find_in_path("docker-compose") {
            // Standalone compose still needs `docker` for ps/stats; without it
            // the monitor subcommands will fail at invocation time.
            let docker = find_in_path("docker").unwrap_or_else(|| PathBuf::from("docker"));
            return Ok(Self { docker, invocation: ComposeInvocation::Standalone(compose) });
        }

        Err(ProbeError::EngineNotFound {
            hint: "Install Docker with the compose plugin, or docker-compose.".to_string(),
        })
    }

    /// Use a specific docker binary with the compose v2 plugin.
    pub fn with_binary(docker: PathBuf) -> Self {
        Self { docker, invocation: ComposeInvocation::Plugin }
    }

    /// Compose command rooted at `dir`.
    fn compose_command(&self, dir: &Path) -> Command {
        let mut cmd = match &self.invocation {
            ComposeInvocation::Plugin => {
                let mut cmd = Command::new(&self.docker);
                cmd.arg("compose");
                cmd
            }
            ComposeInvocation::Standalone(bin) => Command::new(bin),
        };
        cmd.current_dir(dir);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn docker_command(&self) -> Command {
        let mut cmd = Command::new(&self.docker);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn program_name(&self) -> String {
        match &self.invocation {
            ComposeInvocation::Plugin => self.docker.to_string_lossy().to_string(),
            ComposeInvocation::Standalone(bin) => bin.to_string_lossy().to_string(),
        }
    }
}

#[async_trait]
impl ComposeEngine for DockerCompose {
    async fn up_detached(&self, dir: &Path, timeout: Duration) -> Result<BuildOutput> {
        let mut cmd = self.compose_command(dir);
        cmd.args(["up", "-d", "--build"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(dir = %dir.display(), "Running compose up");

        let result = tokio::time::timeout(timeout, cmd.output()).await;

        let output = match result {
            Err(_elapsed) => {
                return Ok(BuildOutput {
                    status: BuildStatus::TimedOut,
                    output: format!("build exceeded timeout of {}s", timeout.as_secs()),
                });
            }
            Ok(io) => io.map_err(|e| ProbeError::EngineSpawnFailed {
                program: self.program_name(),
                source: e,
            })?,
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(BuildOutput { status: classify_exit(output.status), output: combined })
    }

    async fn running_services(&self, dir: &Path) -> Result<Vec<String>> {
        let mut cmd = self.compose_command(dir);
        cmd.args(["ps", "--services", "--filter", "status=running"]);

        let output = cmd.output().await.map_err(|e| ProbeError::EngineSpawnFailed {
            program: self.program_name(),
            source: e,
        })?;

        if !output.status.success() {
            warn!(
                dir = %dir.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "compose ps failed"
            );
            return Ok(Vec::new());
        }

        let services = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Ok(services)
    }

    async fn down(&self, dir: &Path) -> Result<()> {
        let mut cmd = self.compose_command(dir);
        cmd.arg("down");

        match cmd.output().await {
            Ok(output) if output.status.success() => {
                debug!(dir = %dir.display(), "Stack torn down");
            }
            Ok(output) => {
                warn!(
                    dir = %dir.display(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "compose down exited non-zero"
                );
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to invoke compose down");
            }
        }

        Ok(())
    }

    async fn containers_for_project(&self, project: &str) -> Result<Vec<ContainerRef>> {
        let filter = format!("label=com.docker.compose.project={}", project);
        let mut cmd = self.docker_command();
        cmd.args(["ps", "--filter", filter.as_str(), "--format", "{{.ID}} {{.Names}}"]);

        let output = cmd.output().await.map_err(|e| ProbeError::EngineSpawnFailed {
            program: self.docker.to_string_lossy().to_string(),
            source: e,
        })?;

        if !output.status.success() {
            warn!(
                project = %project,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "docker ps failed"
            );
            return Ok(Vec::new());
        }

        let containers = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(2, ' ');
                let id = parts.next()?.trim();
                let name = parts.next()?.trim();
                if id.is_empty() || name.is_empty() {
                    return None;
                }
                Some(ContainerRef { id: id.to_string(), name: name.to_string() })
            })
            .collect();

        Ok(containers)
    }

    async fn stats(&self, container_id: &str) -> Result<Option<ContainerStats>> {
        let mut cmd = self.docker_command();
        cmd.args(["stats", container_id, "--no-stream", "--format", "{{json .}}"]);

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                debug!(container = %container_id, error = %e, "docker stats invocation failed");
                return Ok(None);
            }
        };

        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<ContainerStats>(stdout.trim()) {
            Ok(stats) => Ok(Some(stats)),
            Err(e) => {
                debug!(container = %container_id, error = %e, "Unparsable stats sample");
                Ok(None)
            }
        }
    }
}

/// Map a process exit status to a build classification. Exit code 124 is
/// treated as a timeout so targets wrapped in `timeout(1)` classify the same
/// way as ones cut off by the harness.
fn classify_exit(status: std::process::ExitStatus) -> BuildStatus {
    if status.success() {
        BuildStatus::Success
    } else if status.code() == Some(TIMEOUT_EXIT_CODE) {
        BuildStatus::TimedOut
    } else {
        BuildStatus::Failed { code: status.code() }
    }
}

/// Find a binary on PATH without shelling out to `which`.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
