// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use microscope_cam::constants::app;
use microscope_cam::{CaptureForm, CaptureMode};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

mod cli;

#[derive(Parser)]
#[command(name = "microscope-cam")]
#[command(about = "Capture control panel for a Raspberry Pi microscope camera")]
#[command(version = app::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Folder receiving captures (overrides the config file)
    #[arg(short, long, global = true)]
    save_dir: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected board, its video handling and the resolution presets
    Info,

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },

    /// Run the camera preview until Ctrl+C
    Preview {
        /// Resolution selector (see 'info'; default from config)
        #[arg(short, long)]
        resolution: Option<String>,
    },

    /// Capture a still image
    Photo {
        /// Resolution selector (see 'info'; default from config)
        #[arg(short, long)]
        resolution: Option<String>,

        /// File name without extension (default: capture_TIMESTAMP)
        #[arg(short, long, default_value = "")]
        output: String,
    },

    /// Record a video
    Video {
        /// Resolution selector (see 'info'; default from config)
        #[arg(short, long)]
        resolution: Option<String>,

        /// Framerate; omitted or too high selects the preset maximum
        #[arg(short, long, default_value = "")]
        framerate: String,

        /// Recording duration as HH:MM:SS
        #[arg(short, long, default_value = "00:00:10")]
        duration: String,

        /// File name without extension (default: capture_TIMESTAMP)
        #[arg(short, long, default_value = "")]
        output: String,
    },

    /// Capture a timelapse sequence
    Timelapse {
        /// Resolution selector (see 'info'; default from config)
        #[arg(short, long)]
        resolution: Option<String>,

        /// Seconds between frames
        #[arg(short, long, default_value = "1")]
        interval: u32,

        /// Total duration as HH:MM:SS
        #[arg(short, long, default_value = "00:00:10")]
        duration: String,

        /// File name prefix (default: capture_TIMESTAMP)
        #[arg(short, long, default_value = "")]
        output: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.command.is_none());
    let ctx = cli::Context::load(cli.config.as_deref(), cli.save_dir);

    let selected = |resolution: Option<String>| {
        resolution.unwrap_or_else(|| ctx.config.default_resolution.to_string())
    };

    match cli.command {
        Some(Commands::Info) => cli::show_info(&ctx),
        Some(Commands::Config { write }) => cli::show_config(&ctx, write),
        Some(Commands::Preview { resolution }) => cli::run_preview(&ctx, &selected(resolution)),
        Some(Commands::Photo { resolution, output }) => cli::capture(
            &ctx,
            CaptureForm {
                mode: CaptureMode::Image,
                resolution: selected(resolution),
                filename: output,
                ..CaptureForm::default()
            },
        ),
        Some(Commands::Video {
            resolution,
            framerate,
            duration,
            output,
        }) => cli::capture(
            &ctx,
            CaptureForm {
                mode: CaptureMode::Video,
                resolution: selected(resolution),
                filename: output,
                framerate,
                duration,
                ..CaptureForm::default()
            },
        ),
        Some(Commands::Timelapse {
            resolution,
            interval,
            duration,
            output,
        }) => cli::capture(
            &ctx,
            CaptureForm {
                mode: CaptureMode::Timelapse,
                resolution: selected(resolution),
                filename: output,
                duration,
                interval_seconds: interval,
                ..CaptureForm::default()
            },
        ),
        None => cli::run_panel(&ctx),
    }
}

/// Initialize logging
///
/// Set RUST_LOG environment variable to control log level
/// Examples: RUST_LOG=debug, RUST_LOG=microscope_cam=info
///
/// Subcommands log to stderr. The control panel owns the terminal, so its
/// logs (including forwarded tool output at debug level) go to a file.
fn init_logging(panel: bool) {
    let writer = if panel {
        match cli::open_panel_log() {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(std::io::sink),
        }
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(writer)
        .with_ansi(!panel)
        .with_target(true)
        .with_level(true)
        .init();
}
