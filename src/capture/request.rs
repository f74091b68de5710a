// SPDX-License-Identifier: GPL-3.0-only

//! Validated capture requests and the parsers that produce their fields

use crate::constants::capture::{
    MAX_DURATION_HOURS, MAX_DURATION_SECS, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};
use crate::errors::{CaptureError, CaptureResult};
use crate::profile::{ResolutionProfile, resolve_resolution};
use std::fmt;
use std::path::PathBuf;

/// What a capture produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    Image,
    Video,
    Timelapse,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 3] = [CaptureMode::Image, CaptureMode::Video, CaptureMode::Timelapse];

    pub fn display_name(&self) -> &'static str {
        match self {
            CaptureMode::Image => "image",
            CaptureMode::Video => "video",
            CaptureMode::Timelapse => "timelapse",
        }
    }

    /// Next mode in picker order, wrapping around
    pub fn next(&self) -> Self {
        match self {
            CaptureMode::Image => CaptureMode::Video,
            CaptureMode::Video => CaptureMode::Timelapse,
            CaptureMode::Timelapse => CaptureMode::Image,
        }
    }

    /// Whether the mode records over time (duration applies)
    pub fn uses_duration(&self) -> bool {
        !matches!(self, CaptureMode::Image)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One capture, fully validated. Built per operation and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub mode: CaptureMode,
    pub resolution_selector: u8,
    /// Output path without extension
    pub output_base_path: PathBuf,
    /// Requested video framerate; clamped to the preset ceiling at capture
    pub framerate: Option<f64>,
    pub duration_seconds: u64,
    /// Seconds between timelapse frames
    pub interval_seconds: Option<u32>,
}

impl CaptureRequest {
    pub fn image(resolution_selector: u8, output_base_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: CaptureMode::Image,
            resolution_selector,
            output_base_path: output_base_path.into(),
            framerate: None,
            duration_seconds: 0,
            interval_seconds: None,
        }
    }

    pub fn video(
        resolution_selector: u8,
        output_base_path: impl Into<PathBuf>,
        framerate: Option<f64>,
        duration_seconds: u64,
    ) -> Self {
        Self {
            mode: CaptureMode::Video,
            resolution_selector,
            output_base_path: output_base_path.into(),
            framerate,
            duration_seconds,
            interval_seconds: None,
        }
    }

    pub fn timelapse(
        resolution_selector: u8,
        output_base_path: impl Into<PathBuf>,
        interval_seconds: u32,
        duration_seconds: u64,
    ) -> Self {
        Self {
            mode: CaptureMode::Timelapse,
            resolution_selector,
            output_base_path: output_base_path.into(),
            framerate: None,
            duration_seconds,
            interval_seconds: Some(interval_seconds),
        }
    }

    /// Check every field the mode uses and resolve the preset.
    ///
    /// Requests can be built directly, so the controller runs this again
    /// before it touches any process.
    pub fn validate(&self) -> CaptureResult<ResolutionProfile> {
        let resolution = resolve_resolution(self.resolution_selector)?;
        validate_duration(self.mode, self.duration_seconds)?;

        match self.mode {
            CaptureMode::Image => {}
            CaptureMode::Video => {
                if let Some(fps) = self.framerate
                    && !(fps.is_finite() && fps > 0.0)
                {
                    return Err(CaptureError::InvalidFramerate(fps.to_string()));
                }
            }
            CaptureMode::Timelapse => {
                let interval = self.interval_seconds.ok_or_else(|| {
                    CaptureError::InvalidInterval("timelapse requires an interval".to_string())
                })?;
                validate_interval(interval)?;
            }
        }
        Ok(resolution)
    }
}

/// Parse `hours:minutes:seconds` into total seconds
///
/// `"01:02:03"` → 3723. Exactly three numeric fields are required, with
/// hours in 0..=23 and minutes and seconds in 0..=59.
pub fn parse_duration(text: &str) -> CaptureResult<u64> {
    let invalid = || CaptureError::InvalidDuration(text.to_string());

    let fields = text
        .split(':')
        .map(|field| field.trim().parse::<u64>().map_err(|_| invalid()))
        .collect::<CaptureResult<Vec<_>>>()?;

    match fields.as_slice() {
        [hours, minutes, seconds]
            if *hours <= MAX_DURATION_HOURS && *minutes < 60 && *seconds < 60 =>
        {
            Ok(hours * 3600 + minutes * 60 + seconds)
        }
        _ => Err(invalid()),
    }
}

/// Check a duration in seconds for `mode`.
///
/// Video and timelapse need a non-zero duration: the tools treat zero as
/// "run until stopped" and captures cannot be cancelled.
pub fn validate_duration(mode: CaptureMode, seconds: u64) -> CaptureResult<u64> {
    if seconds > MAX_DURATION_SECS || (mode.uses_duration() && seconds == 0) {
        return Err(CaptureError::InvalidDuration(format_duration(seconds)));
    }
    Ok(seconds)
}

/// Format seconds as `HH:MM:SS`
pub fn format_duration(total_seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

/// Parse an optional framerate. Blank means "use the preset maximum".
pub fn parse_framerate(text: &str) -> CaptureResult<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(fps) if fps.is_finite() && fps > 0.0 => Ok(Some(fps)),
        _ => Err(CaptureError::InvalidFramerate(text.to_string())),
    }
}

/// Check a timelapse interval against the accepted range
pub fn validate_interval(seconds: u32) -> CaptureResult<u32> {
    if (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(CaptureError::InvalidInterval(format!(
            "{} s is outside {}..={} s",
            seconds, MIN_INTERVAL_SECS, MAX_INTERVAL_SECS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("01:02:03"), Ok(3723));
        assert_eq!(parse_duration("00:00:10"), Ok(10));
        assert_eq!(parse_duration("0:5:0"), Ok(300));
        assert_eq!(parse_duration("23:59:59"), Ok(MAX_DURATION_SECS));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        for text in ["", "10", "00:10", "00:00:00:10", "aa:00:10", "00:-1:10", "1.5:00:00"] {
            assert_eq!(
                parse_duration(text),
                Err(CaptureError::InvalidDuration(text.to_string())),
                "{:?} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range_fields() {
        for text in ["24:00:00", "00:60:00", "00:00:60", "0:90:0", "5000000000000000:00:00"] {
            assert_eq!(
                parse_duration(text),
                Err(CaptureError::InvalidDuration(text.to_string())),
                "{:?} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_zero_duration_only_allowed_for_images() {
        assert_eq!(validate_duration(CaptureMode::Image, 0), Ok(0));
        assert!(validate_duration(CaptureMode::Video, 0).is_err());
        assert!(validate_duration(CaptureMode::Timelapse, 0).is_err());
        assert!(validate_duration(CaptureMode::Video, MAX_DURATION_SECS + 1).is_err());
    }

    #[test]
    fn test_validate_request() {
        let video = CaptureRequest::video(2, "/tmp/v", Some(30.0), 10);
        assert_eq!(video.validate().map(|r| r.width), Ok(2028));

        let mut timelapse = CaptureRequest::timelapse(1, "/tmp/t", 5, 60);
        assert!(timelapse.validate().is_ok());
        timelapse.interval_seconds = None;
        assert!(matches!(timelapse.validate(), Err(CaptureError::InvalidInterval(_))));
        timelapse.interval_seconds = Some(0);
        assert!(matches!(timelapse.validate(), Err(CaptureError::InvalidInterval(_))));

        let forever = CaptureRequest::video(1, "/tmp/v", None, 0);
        assert!(matches!(forever.validate(), Err(CaptureError::InvalidDuration(_))));

        let bad_fps = CaptureRequest::video(1, "/tmp/v", Some(-1.0), 10);
        assert!(matches!(bad_fps.validate(), Err(CaptureError::InvalidFramerate(_))));

        let unknown = CaptureRequest::image(7, "/tmp/i");
        assert!(matches!(unknown.validate(), Err(CaptureError::UnknownResolution(_))));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3723), "01:02:03");
        assert_eq!(format_duration(10), "00:00:10");
    }

    #[test]
    fn test_parse_framerate() {
        assert_eq!(parse_framerate(""), Ok(None));
        assert_eq!(parse_framerate("  "), Ok(None));
        assert_eq!(parse_framerate("30"), Ok(Some(30.0)));
        assert_eq!(parse_framerate("24.5"), Ok(Some(24.5)));
        assert!(matches!(parse_framerate("fast"), Err(CaptureError::InvalidFramerate(_))));
        assert!(matches!(parse_framerate("0"), Err(CaptureError::InvalidFramerate(_))));
        assert!(matches!(parse_framerate("-5"), Err(CaptureError::InvalidFramerate(_))));
        assert!(matches!(parse_framerate("NaN"), Err(CaptureError::InvalidFramerate(_))));
    }

    #[test]
    fn test_validate_interval() {
        assert_eq!(validate_interval(1), Ok(1));
        assert_eq!(validate_interval(3600), Ok(3600));
        assert!(validate_interval(0).is_err());
        assert!(validate_interval(3601).is_err());
    }

    #[test]
    fn test_mode_cycle() {
        let mut mode = CaptureMode::default();
        for expected in [CaptureMode::Video, CaptureMode::Timelapse, CaptureMode::Image] {
            mode = mode.next();
            assert_eq!(mode, expected);
        }
    }
}
