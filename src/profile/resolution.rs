// SPDX-License-Identifier: GPL-3.0-only

//! Resolution presets of the HQ camera sensor
//!
//! Each preset pairs a sensor mode with the highest framerate the hardware
//! was verified to sustain at that size.

use crate::errors::{CaptureError, CaptureResult};

/// Sensor aspect ratio of a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    FourThree,
    SixteenNine,
}

impl AspectRatio {
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::FourThree => "4:3",
            AspectRatio::SixteenNine => "16:9",
        }
    }
}

/// A resolution preset keyed by a small selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionProfile {
    pub selector: u8,
    pub width: u32,
    pub height: u32,
    /// Framerate ceiling for this size; never exceeded by a capture
    pub max_fps: f64,
    pub aspect: AspectRatio,
}

impl ResolutionProfile {
    /// Label shown in pickers, e.g. `1: 1332x990 - Max 120 FPS`
    pub fn label(&self) -> String {
        format!(
            "{}: {}x{} - Max {} FPS",
            self.selector,
            self.width,
            self.height,
            self.max_fps.floor() as u32
        )
    }

    /// Clamp a requested framerate to this preset's ceiling.
    ///
    /// An absent framerate selects the ceiling.
    pub fn clamp_framerate(&self, requested: Option<f64>) -> f64 {
        match requested {
            Some(fps) if fps <= self.max_fps => fps,
            _ => self.max_fps,
        }
    }
}

/// All configured presets, ordered by selector
pub const RESOLUTION_PRESETS: [ResolutionProfile; 4] = [
    ResolutionProfile {
        selector: 1,
        width: 1332,
        height: 990,
        max_fps: 120.05,
        aspect: AspectRatio::FourThree,
    },
    ResolutionProfile {
        selector: 2,
        width: 2028,
        height: 1080,
        max_fps: 50.03,
        aspect: AspectRatio::SixteenNine,
    },
    ResolutionProfile {
        selector: 3,
        width: 2028,
        height: 1520,
        max_fps: 40.01,
        aspect: AspectRatio::FourThree,
    },
    ResolutionProfile {
        selector: 4,
        width: 4056,
        height: 3040,
        max_fps: 10.00,
        aspect: AspectRatio::FourThree,
    },
];

/// Look up the preset for a selector
pub fn resolve_resolution(selector: u8) -> CaptureResult<ResolutionProfile> {
    RESOLUTION_PRESETS
        .iter()
        .find(|preset| preset.selector == selector)
        .copied()
        .ok_or_else(|| CaptureError::UnknownResolution(selector.to_string()))
}

/// Parse a selector typed by the user or taken from a picker label.
///
/// Accepts the bare key (`"2"`) or a full label (`"2: 2028x1080 - Max 50 FPS"`);
/// the selector must name a configured preset.
pub fn parse_selector(text: &str) -> CaptureResult<u8> {
    let key = text.split(':').next().unwrap_or_default().trim();
    let selector = key
        .parse::<u8>()
        .map_err(|_| CaptureError::UnknownResolution(text.to_string()))?;
    resolve_resolution(selector)
        .map(|preset| preset.selector)
        .map_err(|_| CaptureError::UnknownResolution(text.to_string()))
}
