// SPDX-License-Identifier: GPL-3.0-only

//! Microscope Camera - capture control for a Raspberry Pi camera
//!
//! The crate sequences the rpicam command line tools: it resolves the host
//! board and resolution presets, keeps at most one preview running, and turns
//! user input into still, timelapse and video captures.
//!
//! # Architecture
//!
//! - [`profile`]: resolution presets and host board detection
//! - [`capture`]: request validation, command construction and the
//!   preview / capture controller
//! - [`config`]: user configuration
//! - [`storage`]: output naming and the save folder
//! - [`terminal`]: interactive keyboard control panel
//!
//! # Example
//!
//! ```no_run
//! use microscope_cam::capture::{CaptureController, CaptureRequest};
//! use microscope_cam::profile::DeviceProfileResolver;
//! use microscope_cam::Config;
//!
//! let config = Config::load();
//! let device = DeviceProfileResolver::new(&config.model_source).resolve().clone();
//! let mut controller = CaptureController::from_config(&config, device);
//! controller.capture(&CaptureRequest::image(2, "/tmp/shot"))?;
//! # Ok::<(), microscope_cam::CaptureError>(())
//! ```

pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod profile;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use capture::{CaptureController, CaptureForm, CaptureMode, CaptureRequest, PreviewState};
pub use config::Config;
pub use errors::{CaptureError, CaptureResult};
pub use profile::{DeviceProfile, DeviceProfileResolver, ResolutionProfile};
