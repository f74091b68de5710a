// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Owns the preview lifecycle and dispatches captures:
//!
//! ```text
//!            start_preview(s)
//!   ┌──────┐ ───────────────▶ ┌────────────────┐ ─┐
//!   │ Idle │                  │ Previewing(s)  │  │ change_resolution(s')
//!   └──────┘ ◀─────────────── └────────────────┘ ◀┘
//!      ▲       stop_preview()         │
//!      └──────────────────────────────┘
//!                 capture(request)
//! ```
//!
//! A capture always ends in `Idle`: an active preview is stopped (and waited
//! for) before the capture tool starts, so the two never overlap.

use super::commands::{
    merge_command, preview_command, still_command, timelapse_command, video_command,
};
use super::process::{PreviewSession, SystemToolRunner, ToolRunner};
use super::request::{CaptureMode, CaptureRequest};
use crate::config::{Config, ToolPaths};
use crate::constants::extensions;
use crate::errors::{CaptureError, CaptureResult};
use crate::profile::{DeviceProfile, ResolutionProfile, resolve_resolution};
use crate::storage::{append_suffix, ensure_parent_dir};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Observable preview state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    Previewing(u8),
}

/// Files produced by a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutput {
    /// Image, frame pattern or video written by the capture tool
    pub primary: PathBuf,
    /// Matroska file the merge tool was asked to produce
    pub merged: Option<PathBuf>,
}

/// Drives preview and capture tools for one camera
pub struct CaptureController<R: ToolRunner = SystemToolRunner> {
    runner: R,
    tools: ToolPaths,
    timestamp_path: PathBuf,
    device: DeviceProfile,
    preview: Option<PreviewSession>,
}

impl CaptureController<SystemToolRunner> {
    /// Controller spawning real processes
    pub fn from_config(config: &Config, device: DeviceProfile) -> Self {
        Self::new(config, device, SystemToolRunner::default())
    }
}

impl<R: ToolRunner> CaptureController<R> {
    pub fn new(config: &Config, device: DeviceProfile, runner: R) -> Self {
        Self {
            runner,
            tools: config.tools.clone(),
            timestamp_path: config.timestamp_path(),
            device,
            preview: None,
        }
    }

    pub fn state(&self) -> PreviewState {
        match &self.preview {
            Some(session) => PreviewState::Previewing(session.selector()),
            None => PreviewState::Idle,
        }
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    /// Board model as identified at startup
    pub fn device_model(&self) -> &str {
        &self.device.model_name
    }

    pub fn device_profile(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Start the preview at `selector`.
    ///
    /// Already previewing at the same selector is a no-op; at another
    /// selector the preview is restarted.
    pub fn start_preview(&mut self, selector: u8) -> CaptureResult<()> {
        match self.state() {
            PreviewState::Previewing(current) if current == selector => {
                debug!(selector, "Preview already running");
                Ok(())
            }
            PreviewState::Previewing(_) => self.change_resolution(selector),
            PreviewState::Idle => self.launch_preview(selector),
        }
    }

    /// Stop the preview if one is running; otherwise nothing happens
    pub fn stop_preview(&mut self) {
        if let Some(session) = self.preview.take() {
            session.stop();
        }
    }

    /// Notice a preview that ended by itself and drop back to `Idle`
    pub fn poll_preview(&mut self) -> PreviewState {
        if let Some(session) = self.preview.as_mut()
            && session.has_exited()
        {
            info!(selector = session.selector(), "Camera preview exited");
            self.stop_preview();
        }
        self.state()
    }

    /// Flip between previewing at `selector` and idle
    pub fn toggle_preview(&mut self, selector: u8) -> CaptureResult<PreviewState> {
        if self.is_previewing() {
            self.stop_preview();
        } else {
            self.launch_preview(selector)?;
        }
        Ok(self.state())
    }

    /// Restart a running preview at a new resolution; no-op while idle
    pub fn change_resolution(&mut self, selector: u8) -> CaptureResult<()> {
        if !self.is_previewing() {
            return Ok(());
        }
        // Reject unknown selectors while the old preview is still up
        resolve_resolution(selector)?;
        self.stop_preview();
        self.launch_preview(selector)
    }

    fn launch_preview(&mut self, selector: u8) -> CaptureResult<()> {
        let resolution = resolve_resolution(selector)?;
        let invocation = preview_command(&self.tools, &resolution);
        info!(
            selector,
            width = resolution.width,
            height = resolution.height,
            "Starting indefinite camera preview"
        );
        self.preview = Some(PreviewSession::start(&self.runner, &invocation, selector)?);
        Ok(())
    }

    /// Stop any preview, then run the capture described by `request`.
    ///
    /// The request is validated first; an invalid one leaves a running preview
    /// alone. Blocks until the capture tool exits. Partially written output is
    /// left in place on failure.
    pub fn capture(&mut self, request: &CaptureRequest) -> CaptureResult<CaptureOutput> {
        let resolution = request.validate()?;
        self.stop_preview();

        ensure_parent_dir(&request.output_base_path)?;

        info!(
            mode = %request.mode,
            selector = request.resolution_selector,
            base = %request.output_base_path.display(),
            "Starting capture"
        );

        match request.mode {
            CaptureMode::Image => self.capture_image(&resolution, &request.output_base_path),
            CaptureMode::Timelapse => self.capture_timelapse(&resolution, request),
            CaptureMode::Video => self.capture_video(&resolution, request),
        }
    }

    fn capture_image(
        &self,
        resolution: &ResolutionProfile,
        base: &Path,
    ) -> CaptureResult<CaptureOutput> {
        let output = append_suffix(base, extensions::IMAGE);
        self.runner
            .run(&still_command(&self.tools, resolution, &output))?;
        info!(path = %output.display(), "Image captured");
        Ok(CaptureOutput {
            primary: output,
            merged: None,
        })
    }

    fn capture_timelapse(
        &self,
        resolution: &ResolutionProfile,
        request: &CaptureRequest,
    ) -> CaptureResult<CaptureOutput> {
        let interval = request.interval_seconds.ok_or_else(|| {
            CaptureError::InvalidInterval("timelapse requires an interval".to_string())
        })?;
        let pattern = append_suffix(&request.output_base_path, extensions::TIMELAPSE_FRAME);

        self.runner.run(&timelapse_command(
            &self.tools,
            resolution,
            request.duration_seconds,
            interval,
            &pattern,
        )?)?;
        info!(
            pattern = %pattern.display(),
            interval,
            duration = request.duration_seconds,
            "Timelapse captured"
        );
        Ok(CaptureOutput {
            primary: pattern,
            merged: None,
        })
    }

    fn capture_video(
        &self,
        resolution: &ResolutionProfile,
        request: &CaptureRequest,
    ) -> CaptureResult<CaptureOutput> {
        let framerate = resolution.clamp_framerate(request.framerate);
        let output = append_suffix(&request.output_base_path, self.device.video_extension);
        let timestamps = self
            .device
            .needs_timestamp_merge
            .then_some(self.timestamp_path.as_path());

        info!(
            framerate,
            requested = ?request.framerate,
            selector = resolution.selector,
            output = %output.display(),
            "Recording video"
        );

        self.runner.run(&video_command(
            &self.tools,
            resolution,
            framerate,
            request.duration_seconds,
            &output,
            timestamps,
        ))?;

        let Some(timestamps) = timestamps else {
            info!(path = %output.display(), "Video recorded");
            return Ok(CaptureOutput {
                primary: output,
                merged: None,
            });
        };

        // The H.264 intermediate stays on disk next to the merged file
        let merged = append_suffix(&request.output_base_path, extensions::MKV);
        self.runner
            .spawn_detached(&merge_command(&self.tools, &output, timestamps, &merged))?;
        info!(path = %merged.display(), "Merging timestamps into MKV");

        Ok(CaptureOutput {
            primary: output,
            merged: Some(merged),
        })
    }
}
