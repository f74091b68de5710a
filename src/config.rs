// SPDX-License-Identifier: GPL-3.0-only

//! User configuration, stored as JSON under the user's config directory

use crate::constants::{app, capture, device, tools};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Programs invoked for each capture step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub preview: String,
    pub still: String,
    pub video: String,
    pub merge: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            preview: tools::PREVIEW.to_string(),
            still: tools::STILL.to_string(),
            video: tools::VIDEO.to_string(),
            merge: tools::MERGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder receiving captures
    pub save_dir: PathBuf,
    /// External programs
    pub tools: ToolPaths,
    /// File naming the board model
    pub model_source: PathBuf,
    /// Presentation timestamp sidecar (default: `<save_dir>/timestamps.txt`)
    pub timestamp_file: Option<PathBuf>,
    /// Resolution selected at startup
    pub default_resolution: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: crate::storage::default_save_dir(),
            tools: ToolPaths::default(),
            model_source: PathBuf::from(device::MODEL_SOURCE),
            timestamp_file: None,
            default_resolution: capture::DEFAULT_RESOLUTION,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app::CONFIG_DIR_NAME).join(app::CONFIG_FILE_NAME))
    }

    /// Load from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or malformed file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating the parent folder
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Sidecar path receiving video presentation timestamps
    pub fn timestamp_path(&self) -> PathBuf {
        self.timestamp_file
            .clone()
            .unwrap_or_else(|| self.save_dir.join(capture::TIMESTAMP_FILE_NAME))
    }
}
