//! Stackprobe Core Library
//!
//! Shared types and logic for the stackprobe compose-stack test harness:
//! target classification, the compose engine abstraction, the sequential
//! build/health-check runner, the resource monitor, and the run summarizer.

pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod monitor;
pub mod paths;
pub mod stats;
pub mod summary;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use engine::{BuildOutput, BuildStatus, ComposeEngine, ContainerRef, ContainerStats, DockerCompose};
pub use error::{ProbeError, Result};
pub use harness::{Harness, HarnessConfig, RunReport};
pub use monitor::{Monitor, MonitorConfig};
pub use summary::{LatencyFilter, SummaryOptions, SummaryRow};
pub use types::{FailReason, RunSummary, Target, TargetOutcome, TargetReport};
