// SPDX-License-Identifier: GPL-3.0-only

//! Capture session control
//!
//! - [`form`]: raw front-end input → validated [`CaptureRequest`]
//! - [`commands`]: command lines for the rpicam tools and mkvmerge
//! - [`process`]: process execution and scoped preview ownership
//! - [`controller`]: the preview / capture state machine

pub mod commands;
pub mod controller;
pub mod form;
pub mod process;
pub mod request;

pub use commands::ToolInvocation;
pub use controller::{CaptureController, CaptureOutput, PreviewState};
pub use form::CaptureForm;
pub use process::{PreviewSession, RunningTool, SystemToolRunner, ToolOutput, ToolRunner};
pub use request::{CaptureMode, CaptureRequest, format_duration, parse_duration};
