// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for output naming and the save folder

use crate::constants::capture::DEFAULT_FILE_PREFIX;
use chrono::Local;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default save folder: the user's Desktop, falling back to home, then `.`
pub fn default_save_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Append a suffix to a path without treating dots in the name as an extension
///
/// `append_suffix("/tmp/cells.day2", ".jpg")` → `/tmp/cells.day2.jpg`
pub fn append_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Timestamped file name used when the user leaves the name empty
pub fn default_file_name() -> String {
    format!("{}_{}", DEFAULT_FILE_PREFIX, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Output base path for a capture: `<save_dir>/<file_name>`
pub fn output_base_path(save_dir: &Path, file_name: &str) -> PathBuf {
    let name = file_name.trim();
    if name.is_empty() {
        save_dir.join(default_file_name())
    } else {
        save_dir.join(name)
    }
}

/// Make sure the folder receiving `base` exists
pub fn ensure_parent_dir(base: &Path) -> std::io::Result<()> {
    if let Some(parent) = base.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        debug!(dir = %parent.display(), "Creating save folder");
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
