//! Error types for stackprobe.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stackprobe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Main error type for stackprobe.
#[derive(Error, Debug)]
pub enum ProbeError {
    // Compose file errors
    #[error("Compose parse error: {reason}")]
    ComposeParseError { reason: String },

    #[error("File read error: {path}: {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Engine errors
    #[error("Compose binary not found. {hint}")]
    EngineNotFound { hint: String },

    #[error("Failed to invoke {program}: {source}")]
    EngineSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // Monitor / summary errors
    #[error("CSV error at {path:?}: {source}")]
    CsvError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid JMeter results file {path:?}: {reason}")]
    InvalidJtl { path: PathBuf, reason: String },

    #[error(
        "No runs discovered under {root:?} (expected <APP>/Output/monitor_results.csv and jmeter_results.jtl)"
    )]
    NoRunsFound { root: PathBuf },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // File system errors
    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
