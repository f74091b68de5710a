// SPDX-License-Identifier: GPL-3.0-only

//! Device profile resolution
//!
//! - [`resolution`]: selector → width/height/framerate ceiling
//! - [`device`]: host model → board generation and video handling

pub mod device;
pub mod resolution;

pub use device::{DeviceGeneration, DeviceProfile, DeviceProfileResolver};
pub use resolution::{RESOLUTION_PRESETS, ResolutionProfile, parse_selector, resolve_resolution};
