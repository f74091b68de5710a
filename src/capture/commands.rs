// SPDX-License-Identifier: GPL-3.0-only

//! Command lines for the external capture tools
//!
//! Everything here is pure: each function turns validated parameters into a
//! [`ToolInvocation`] that a [`ToolRunner`](super::process::ToolRunner) executes.

use crate::config::ToolPaths;
use crate::errors::{CaptureError, CaptureResult, Tool};
use crate::profile::ResolutionProfile;
use std::fmt;
use std::path::Path;

/// A fully built external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    fn new(tool: Tool, program: &str) -> Self {
        Self {
            tool,
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn size(self, resolution: &ResolutionProfile) -> Self {
        self.arg("--width")
            .arg(resolution.width.to_string())
            .arg("--height")
            .arg(resolution.height.to_string())
    }

    fn output(self, path: &Path) -> Self {
        self.arg("-o").arg(path.to_string_lossy())
    }

    /// Value following `flag`, if present
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Indefinite preview: `--timeout 0` keeps the window open until terminated
pub fn preview_command(tools: &ToolPaths, resolution: &ResolutionProfile) -> ToolInvocation {
    ToolInvocation::new(Tool::Preview, &tools.preview)
        .arg("--timeout")
        .arg("0")
        .size(resolution)
}

/// Single still image
pub fn still_command(
    tools: &ToolPaths,
    resolution: &ResolutionProfile,
    output: &Path,
) -> ToolInvocation {
    ToolInvocation::new(Tool::Still, &tools.still)
        .size(resolution)
        .output(output)
}

/// Timelapse: one frame every `interval_secs` for `duration_secs`.
///
/// The tool takes both values in milliseconds; `output_pattern` carries a
/// printf-style frame counter.
pub fn timelapse_command(
    tools: &ToolPaths,
    resolution: &ResolutionProfile,
    duration_secs: u64,
    interval_secs: u32,
    output_pattern: &Path,
) -> CaptureResult<ToolInvocation> {
    let duration_ms = duration_secs
        .checked_mul(1000)
        .ok_or_else(|| CaptureError::InvalidDuration(format!("{} s", duration_secs)))?;
    let interval_ms = u64::from(interval_secs) * 1000;

    Ok(ToolInvocation::new(Tool::Still, &tools.still)
        .size(resolution)
        .arg("-t")
        .arg(duration_ms.to_string())
        .arg("--timelapse")
        .arg(interval_ms.to_string())
        .output(output_pattern))
}

/// Video recording. `timestamps` adds `--save-pts` for boards whose encoder
/// does not embed presentation timestamps.
pub fn video_command(
    tools: &ToolPaths,
    resolution: &ResolutionProfile,
    framerate: f64,
    duration_secs: u64,
    output: &Path,
    timestamps: Option<&Path>,
) -> ToolInvocation {
    let mut cmd = ToolInvocation::new(Tool::Video, &tools.video)
        .size(resolution)
        .arg("--framerate")
        .arg(framerate.to_string())
        .arg("-t")
        .arg(format!("{}s", duration_secs));

    if let Some(pts) = timestamps {
        cmd = cmd.arg("--save-pts").arg(pts.to_string_lossy());
    }

    cmd.output(output)
}

/// Mux raw H.264 with its timestamp sidecar into Matroska
pub fn merge_command(
    tools: &ToolPaths,
    input_h264: &Path,
    timestamps: &Path,
    output_mkv: &Path,
) -> ToolInvocation {
    ToolInvocation::new(Tool::Merge, &tools.merge)
        .output(output_mkv)
        .arg("--timecodes")
        .arg(format!("0:{}", timestamps.display()))
        .arg(input_h264.to_string_lossy())
}
