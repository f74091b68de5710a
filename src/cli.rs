// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Inspecting the detected board and resolution presets
//! - Running the preview
//! - Capturing images, videos and timelapses

use microscope_cam::capture::{
    CaptureController, CaptureForm, CaptureMode, PreviewState, SystemToolRunner, ToolOutput,
};
use microscope_cam::profile::{DeviceProfileResolver, RESOLUTION_PRESETS, parse_selector};
use microscope_cam::{Config, constants, terminal};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// Configuration and device detection shared by all commands
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub resolver: DeviceProfileResolver,
}

impl Context {
    pub fn load(
        config_path: Option<&Path>,
        save_dir: Option<PathBuf>,
    ) -> Self {
        let config_path = config_path.map(Path::to_path_buf).or_else(Config::default_path);
        let mut config = match &config_path {
            Some(path) => Config::load_from(path),
            None => Config::default(),
        };

        if let Some(dir) = save_dir {
            config.save_dir = dir;
        }

        let resolver = DeviceProfileResolver::new(&config.model_source);
        Self {
            config,
            config_path,
            resolver,
        }
    }

    fn controller(&self) -> CaptureController {
        CaptureController::from_config(&self.config, self.resolver.resolve().clone())
    }
}

/// Print board detection results and the preset table
pub fn show_info(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let profile = ctx.resolver.resolve();

    println!("microscope-cam {}", constants::app::version());
    println!();
    println!("Raspberry Pi Model: {}", profile.model_name);
    println!("  Generation:      {:?}", profile.generation);
    println!("  Video format:    {}", profile.video_extension);
    println!(
        "  Timestamp merge: {}",
        if profile.needs_timestamp_merge { "yes (mkv)" } else { "no" }
    );
    println!();
    println!("Resolutions:");
    for preset in RESOLUTION_PRESETS {
        println!("  {} ({})", preset.label(), preset.aspect.label());
    }
    println!();
    println!("Save path: {}", ctx.config.save_dir.display());

    Ok(())
}

/// Print the effective configuration, optionally persisting it
pub fn show_config(ctx: &Context, write: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);

    if write {
        let path = ctx
            .config_path
            .as_deref()
            .ok_or("No config directory available")?;
        ctx.config.save_to(path)?;
        println!();
        println!("Written to {}", path.display());
    }

    Ok(())
}

/// Run the preview until Ctrl+C
pub fn run_preview(ctx: &Context, resolution: &str) -> Result<(), Box<dyn std::error::Error>> {
    let selector = parse_selector(resolution)?;
    let mut controller = ctx.controller();

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    controller.start_preview(selector)?;
    println!("Preview running (press Ctrl+C to stop)");

    // Also ends when the preview window is closed
    while !stop_flag.load(Ordering::SeqCst) && controller.poll_preview() != PreviewState::Idle {
        std::thread::sleep(Duration::from_millis(100));
    }

    controller.stop_preview();
    println!("Preview stopped");
    Ok(())
}

/// Validate the form and run a single capture
pub fn capture(ctx: &Context, form: CaptureForm) -> Result<(), Box<dyn std::error::Error>> {
    let request = form.to_request(&ctx.config.save_dir)?;
    let mut controller = ctx.controller();

    match request.mode {
        CaptureMode::Image => println!("Capturing image..."),
        CaptureMode::Video => println!(
            "Recording {} of video...",
            microscope_cam::capture::format_duration(request.duration_seconds)
        ),
        CaptureMode::Timelapse => println!(
            "Capturing timelapse for {}...",
            microscope_cam::capture::format_duration(request.duration_seconds)
        ),
    }

    let output = controller.capture(&request)?;
    info!(?output, "Capture complete");

    println!("Saved: {}", output.primary.display());
    if let Some(merged) = output.merged {
        println!("Merging timestamps into: {}", merged.display());
    }
    Ok(())
}

/// Log file used while the control panel runs, created on demand
pub fn open_panel_log() -> Option<File> {
    let dir = dirs::cache_dir()?.join(constants::app::CONFIG_DIR_NAME);
    std::fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(constants::app::PANEL_LOG_FILE_NAME))
        .ok()
}

/// Interactive terminal control panel
pub fn run_panel(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    // Tool output would scribble over the alternate screen
    let mut controller = CaptureController::new(
        &ctx.config,
        ctx.resolver.resolve().clone(),
        SystemToolRunner::new(ToolOutput::Log),
    );
    terminal::run(&ctx.config, &mut controller)
}
