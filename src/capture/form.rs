// SPDX-License-Identifier: GPL-3.0-only

//! Raw front-end input and its validation into a [`CaptureRequest`]
//!
//! Front ends only ever hold text; this is the one place it is parsed.
//! Validation finishes before any process is touched.

use super::request::{
    CaptureMode, CaptureRequest, parse_duration, parse_framerate, validate_interval,
};
use crate::constants::capture::{DEFAULT_DURATION, DEFAULT_INTERVAL_SECS};
use crate::errors::CaptureResult;
use crate::profile::parse_selector;
use crate::storage;
use std::path::Path;
use tracing::debug;

/// Form state as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureForm {
    pub mode: CaptureMode,
    /// Selector key or picker label
    pub resolution: String,
    /// File name relative to the save folder; blank generates one
    pub filename: String,
    /// Video framerate; blank selects the preset maximum
    pub framerate: String,
    /// `HH:MM:SS`
    pub duration: String,
    /// Seconds between timelapse frames
    pub interval_seconds: u32,
}

impl Default for CaptureForm {
    fn default() -> Self {
        Self {
            mode: CaptureMode::default(),
            resolution: crate::constants::capture::DEFAULT_RESOLUTION.to_string(),
            filename: String::new(),
            framerate: String::new(),
            duration: DEFAULT_DURATION.to_string(),
            interval_seconds: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl CaptureForm {
    /// Validate every field and build the request.
    ///
    /// Duration is checked in every mode, matching what the form always
    /// submits; framerate and interval only where the mode uses them.
    pub fn to_request(&self, save_dir: &Path) -> CaptureResult<CaptureRequest> {
        let selector = parse_selector(&self.resolution)?;
        let duration_seconds = parse_duration(&self.duration)?;
        let output_base_path = storage::output_base_path(save_dir, &self.filename);

        let request = match self.mode {
            CaptureMode::Image => CaptureRequest::image(selector, output_base_path),
            CaptureMode::Video => CaptureRequest::video(
                selector,
                output_base_path,
                parse_framerate(&self.framerate)?,
                duration_seconds,
            ),
            CaptureMode::Timelapse => CaptureRequest::timelapse(
                selector,
                output_base_path,
                validate_interval(self.interval_seconds)?,
                duration_seconds,
            ),
        };

        request.validate()?;
        debug!(?request, "Validated capture form");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CaptureError;
    use std::path::PathBuf;

    fn form(mode: CaptureMode) -> CaptureForm {
        CaptureForm {
            mode,
            resolution: "2".to_string(),
            filename: "shot".to_string(),
            ..CaptureForm::default()
        }
    }

    #[test]
    fn test_image_request() {
        let request = form(CaptureMode::Image).to_request(Path::new("/tmp")).unwrap();
        assert_eq!(request, CaptureRequest::image(2, "/tmp/shot"));
    }

    #[test]
    fn test_video_request_blank_framerate() {
        let mut f = form(CaptureMode::Video);
        f.duration = "00:01:00".to_string();
        let request = f.to_request(Path::new("/tmp")).unwrap();
        assert_eq!(request.framerate, None);
        assert_eq!(request.duration_seconds, 60);
        assert_eq!(request.output_base_path, PathBuf::from("/tmp/shot"));
    }

    #[test]
    fn test_timelapse_request() {
        let mut f = form(CaptureMode::Timelapse);
        f.interval_seconds = 30;
        f.duration = "02:00:00".to_string();
        let request = f.to_request(Path::new("/data")).unwrap();
        assert_eq!(request, CaptureRequest::timelapse(2, "/data/shot", 30, 7200));
    }

    #[test]
    fn test_zero_duration_rejected_for_recordings() {
        let mut image = form(CaptureMode::Image);
        image.duration = "00:00:00".to_string();
        assert!(image.to_request(Path::new("/tmp")).is_ok());

        for mode in [CaptureMode::Video, CaptureMode::Timelapse] {
            let mut f = form(mode);
            f.duration = "00:00:00".to_string();
            assert!(matches!(
                f.to_request(Path::new("/tmp")),
                Err(CaptureError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_huge_duration_rejected() {
        let mut f = form(CaptureMode::Timelapse);
        f.duration = "5000000000000000:00:00".to_string();
        assert_eq!(
            f.to_request(Path::new("/tmp")),
            Err(CaptureError::InvalidDuration("5000000000000000:00:00".to_string()))
        );
    }

    #[test]
    fn test_invalid_duration_fails_in_any_mode() {
        for mode in CaptureMode::ALL {
            let mut f = form(mode);
            f.duration = "ten seconds".to_string();
            assert!(matches!(
                f.to_request(Path::new("/tmp")),
                Err(CaptureError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_unknown_resolution() {
        let mut f = form(CaptureMode::Image);
        f.resolution = "9".to_string();
        assert_eq!(
            f.to_request(Path::new("/tmp")),
            Err(CaptureError::UnknownResolution("9".to_string()))
        );
    }

    #[test]
    fn test_framerate_only_checked_for_video() {
        let mut f = form(CaptureMode::Image);
        f.framerate = "fast".to_string();
        assert!(f.to_request(Path::new("/tmp")).is_ok());

        f.mode = CaptureMode::Video;
        assert!(matches!(
            f.to_request(Path::new("/tmp")),
            Err(CaptureError::InvalidFramerate(_))
        ));
    }

    #[test]
    fn test_interval_out_of_range() {
        let mut f = form(CaptureMode::Timelapse);
        f.interval_seconds = 0;
        assert!(matches!(
            f.to_request(Path::new("/tmp")),
            Err(CaptureError::InvalidInterval(_))
        ));
    }
}
