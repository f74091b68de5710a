// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Default program names of the rpicam-apps suite and mkvtoolnix
pub mod tools {
    /// Preview window (runs until terminated)
    pub const PREVIEW: &str = "rpicam-hello";
    /// Still and timelapse capture
    pub const STILL: &str = "rpicam-still";
    /// Video capture
    pub const VIDEO: &str = "rpicam-vid";
    /// Timestamp merge into Matroska
    pub const MERGE: &str = "mkvmerge";
}

/// File extensions appended to the output base path
pub mod extensions {
    /// Still images and timelapse frames
    pub const IMAGE: &str = ".jpg";
    /// Timelapse frame suffix (printf-style, 4-digit frame counter)
    pub const TIMELAPSE_FRAME: &str = "_%04d.jpg";
    /// Raw H.264 elementary stream
    pub const H264: &str = ".h264";
    /// MP4 container (written directly on boards that support it)
    pub const MP4: &str = ".mp4";
    /// Matroska container produced by the timestamp merge
    pub const MKV: &str = ".mkv";
}

/// Device identification
pub mod device {
    /// Device tree node naming the board model
    pub const MODEL_SOURCE: &str = "/proc/device-tree/model";
    /// Environment variable overriding the model string
    pub const MODEL_ENV: &str = "MICROSCOPE_CAM_MODEL";
    /// Model reported when identification fails
    pub const UNKNOWN_MODEL: &str = "Unknown";
    /// Marker of the newest supported board generation
    pub const GEN5_MARKER: &str = "Raspberry Pi 5";
    /// Marker of the generation that needs a separate timestamp merge
    pub const GEN4_MARKER: &str = "Raspberry Pi 4";
}

/// Capture defaults and limits
pub mod capture {
    /// Default recording / timelapse duration (HH:MM:SS)
    pub const DEFAULT_DURATION: &str = "00:00:10";
    /// Largest hours field of a duration
    pub const MAX_DURATION_HOURS: u64 = 23;
    /// Longest recording / timelapse, 23:59:59
    pub const MAX_DURATION_SECS: u64 = MAX_DURATION_HOURS * 3600 + 59 * 60 + 59;
    /// Shortest timelapse interval in seconds
    pub const MIN_INTERVAL_SECS: u32 = 1;
    /// Longest timelapse interval in seconds
    pub const MAX_INTERVAL_SECS: u32 = 3600;
    /// Default timelapse interval in seconds
    pub const DEFAULT_INTERVAL_SECS: u32 = 1;
    /// Default resolution selector
    pub const DEFAULT_RESOLUTION: u8 = 1;
    /// Prefix of generated file names when the user leaves the name empty
    pub const DEFAULT_FILE_PREFIX: &str = "capture";
    /// Sidecar file receiving presentation timestamps
    pub const TIMESTAMP_FILE_NAME: &str = "timestamps.txt";
}

/// Application identity
pub mod app {
    /// Directory name under the user's config dir
    pub const CONFIG_DIR_NAME: &str = "microscope-cam";
    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "config.json";
    /// Log file written while the control panel owns the terminal
    pub const PANEL_LOG_FILE_NAME: &str = "panel.log";

    /// Version string embedded by the build script
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
