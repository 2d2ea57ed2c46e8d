//! Centralized path configuration for stackprobe.
//!
//! All data paths should go through this module so the CLI and the library
//! agree on where configuration lives.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the invoking user's home directory.
///
/// `~` alone and `~/...` are expanded; `~user/...` is left untouched since
/// resolving other users' home directories is not something the harness needs.
pub fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }

    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(raw)
}

/// Get the stackprobe data directory.
///
/// Resolution order:
/// 1. `STACKPROBE_DATA_DIR` environment variable
/// 2. `~/.stackprobe` for user installs
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STACKPROBE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    dirs::home_dir().map(|h| h.join(".stackprobe")).unwrap_or_else(|| PathBuf::from(".stackprobe"))
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Derive the display name of a target directory (its basename).
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
