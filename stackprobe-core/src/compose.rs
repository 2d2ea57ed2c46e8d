//! Compose definition discovery and light validation.
//!
//! The orchestration tool remains the authority on what a compose file means;
//! this parser only supports pre-flight reporting (service count, obviously
//! broken files) before the harness spends minutes on a build.

use crate::error::{ProbeError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compose file names probed in order.
pub const COMPOSE_FILE_NAMES: [&str; 4] =
    ["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"];

/// Minimal view of a compose file: version and services.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub services: HashMap<String, ComposeService>,
}

/// Minimal view of a single service entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeService {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub build: Option<serde_yaml::Value>,
    #[serde(default)]
    pub depends_on: Option<serde_yaml::Value>,
}

/// Find the compose definition file in a directory, if any.
pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILE_NAMES.iter().map(|name| dir.join(name)).find(|p| p.is_file())
}

impl ComposeFile {
    /// Parse a compose file from a string and validate it.
    pub fn parse(content: &str) -> Result<Self> {
        let compose: ComposeFile = serde_yaml::from_str(content)
            .map_err(|e| ProbeError::ComposeParseError { reason: e.to_string() })?;

        compose.validate()?;
        Ok(compose)
    }

    /// Parse a compose file from a file path.
    pub fn parse_file(path: &Path) -> Result<Self> {
        debug!("Reading compose file from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ProbeError::FileReadError {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Validate that services are plausibly runnable.
    ///
    /// Each service needs an image or a build context; anything beyond that
    /// is left to the orchestration tool.
    fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(ProbeError::ComposeParseError {
                reason: "No services defined".to_string(),
            });
        }

        for (name, service) in &self.services {
            if service.image.is_empty() && service.build.is_none() {
                return Err(ProbeError::ComposeParseError {
                    reason: format!("Service '{}' has neither image nor build", name),
                });
            }
        }

        Ok(())
    }
}
