// SPDX-License-Identifier: GPL-3.0-only

//! Host board detection
//!
//! The board generation decides the video container and whether recorded
//! H.264 needs its presentation timestamps merged in afterwards.

use crate::constants::{device, extensions};
use crate::errors::{CaptureError, CaptureResult};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Board generations with distinct capture behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceGeneration {
    /// Raspberry Pi 5: encodes straight to MP4
    Gen5,
    /// Raspberry Pi 4: raw H.264 plus a timestamp sidecar to merge
    Gen4,
    /// Anything else, including failed identification
    Unknown,
}

impl DeviceGeneration {
    /// Classify a model string
    pub fn from_model(model: &str) -> Self {
        if model.contains(device::GEN5_MARKER) {
            DeviceGeneration::Gen5
        } else if model.contains(device::GEN4_MARKER) {
            DeviceGeneration::Gen4
        } else {
            DeviceGeneration::Unknown
        }
    }
}

/// Capture behaviour derived from the host model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub model_name: String,
    pub generation: DeviceGeneration,
    pub video_extension: &'static str,
    pub needs_timestamp_merge: bool,
}

impl DeviceProfile {
    /// Derive the profile from a model string
    pub fn from_model(model: &str) -> Self {
        let generation = DeviceGeneration::from_model(model);
        Self {
            model_name: model.to_string(),
            generation,
            video_extension: match generation {
                DeviceGeneration::Gen5 => extensions::MP4,
                DeviceGeneration::Gen4 | DeviceGeneration::Unknown => extensions::H264,
            },
            needs_timestamp_merge: generation == DeviceGeneration::Gen4,
        }
    }

    /// Profile used when the model cannot be determined
    pub fn unknown() -> Self {
        Self::from_model(device::UNKNOWN_MODEL)
    }
}

/// Read the model string from a device tree style file.
///
/// The kernel terminates the value with a NUL byte, which is stripped along
/// with surrounding whitespace.
pub fn read_model(source: &Path) -> CaptureResult<String> {
    let raw = std::fs::read(source).map_err(|e| {
        CaptureError::DeviceIdentificationUnavailable(format!("{}: {}", source.display(), e))
    })?;
    let model = String::from_utf8_lossy(&raw)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string();

    if model.is_empty() {
        return Err(CaptureError::DeviceIdentificationUnavailable(format!(
            "{} is empty",
            source.display()
        )));
    }
    Ok(model)
}

/// Resolves the host's device profile once and caches it
#[derive(Debug)]
pub struct DeviceProfileResolver {
    source: PathBuf,
    override_model: Option<String>,
    cached: OnceLock<DeviceProfile>,
}

impl DeviceProfileResolver {
    /// Resolver reading `source`, honouring the model environment override
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let mut resolver = Self::from_source(source);
        resolver.override_model = std::env::var(device::MODEL_ENV)
            .ok()
            .filter(|m| !m.trim().is_empty());
        resolver
    }

    /// Resolver reading `source` only, ignoring the environment
    pub fn from_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            override_model: None,
            cached: OnceLock::new(),
        }
    }

    /// Resolver that never touches the filesystem
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            source: PathBuf::from(device::MODEL_SOURCE),
            override_model: Some(model.into()),
            cached: OnceLock::new(),
        }
    }

    /// The host profile; the identification source is read at most once.
    ///
    /// Never fails: an unreadable source yields the Unknown profile.
    pub fn resolve(&self) -> &DeviceProfile {
        self.cached.get_or_init(|| {
            let model = match &self.override_model {
                Some(model) => {
                    debug!(model = %model, "Using model override");
                    Ok(model.trim().to_string())
                }
                None => read_model(&self.source),
            };

            let profile = match model {
                Ok(model) => DeviceProfile::from_model(&model),
                Err(e) => {
                    warn!(error = %e, "Falling back to unknown device profile");
                    DeviceProfile::unknown()
                }
            };

            info!(
                model = %profile.model_name,
                generation = ?profile.generation,
                extension = profile.video_extension,
                merge = profile.needs_timestamp_merge,
                "Resolved device profile"
            );
            profile
        })
    }
}

impl Default for DeviceProfileResolver {
    fn default() -> Self {
        Self::new(device::MODEL_SOURCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_model_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "microscope-cam-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_gen5_profile() {
        let p = DeviceProfile::from_model("Raspberry Pi 5 Model B Rev 1.0");
        assert_eq!(p.generation, DeviceGeneration::Gen5);
        assert_eq!(p.video_extension, ".mp4");
        assert!(!p.needs_timestamp_merge);
    }

    #[test]
    fn test_gen4_profile() {
        let p = DeviceProfile::from_model("Raspberry Pi 4 Model B Rev 1.4");
        assert_eq!(p.generation, DeviceGeneration::Gen4);
        assert_eq!(p.video_extension, ".h264");
        assert!(p.needs_timestamp_merge);
    }

    #[test]
    fn test_other_models_use_safe_defaults() {
        for model in ["Unknown", "Raspberry Pi 3 Model B Plus Rev 1.3", ""] {
            let p = DeviceProfile::from_model(model);
            assert_eq!(p.generation, DeviceGeneration::Unknown);
            assert_eq!(p.video_extension, ".h264");
            assert!(!p.needs_timestamp_merge);
        }
        assert_eq!(DeviceProfile::unknown().model_name, "Unknown");
    }

    #[test]
    fn test_read_model_strips_nul() {
        let path = temp_model_file("model-nul", b"Raspberry Pi 4 Model B Rev 1.5\0");
        assert_eq!(
            read_model(&path).unwrap(),
            "Raspberry Pi 4 Model B Rev 1.5"
        );
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_read_model_missing_file() {
        let result = read_model(Path::new("/nonexistent/device-tree/model"));
        assert!(matches!(
            result,
            Err(CaptureError::DeviceIdentificationUnavailable(_))
        ));
    }

    #[test]
    fn test_resolver_caches_first_read() {
        let path = temp_model_file("model-cache", b"Raspberry Pi 5 Model B Rev 1.0\0");
        let resolver = DeviceProfileResolver::from_source(&path);

        assert_eq!(resolver.resolve().generation, DeviceGeneration::Gen5);
        std::fs::write(&path, b"Raspberry Pi 4 Model B\0").unwrap();
        assert_eq!(resolver.resolve().generation, DeviceGeneration::Gen5);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_resolver_unreadable_source_is_unknown() {
        let resolver = DeviceProfileResolver::from_source("/nonexistent/model");
        assert_eq!(resolver.resolve(), &DeviceProfile::unknown());
    }

    #[test]
    fn test_from_source_ignores_environment() {
        let resolver = DeviceProfileResolver::from_source("/nonexistent/model");
        assert_eq!(resolver.override_model, None);
        assert_eq!(resolver.resolve().generation, DeviceGeneration::Unknown);
    }

    #[test]
    fn test_resolver_with_model() {
        let resolver = DeviceProfileResolver::with_model("Raspberry Pi 4 Model B");
        assert!(resolver.resolve().needs_timestamp_merge);
    }
}
