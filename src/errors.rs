// SPDX-License-Identifier: GPL-3.0-only

//! Error types for capture operations

use std::fmt;

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

/// The external programs the controller drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Long-running preview window (rpicam-hello)
    Preview,
    /// Still and timelapse capture (rpicam-still)
    Still,
    /// Video capture (rpicam-vid)
    Video,
    /// Timestamp merge into a Matroska container (mkvmerge)
    Merge,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Preview => "preview",
            Tool::Still => "still capture",
            Tool::Video => "video capture",
            Tool::Merge => "timestamp merge",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How an external tool ended, when it did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitInfo {
    /// Process exited with a non-zero code
    Code(i32),
    /// Process was terminated by a signal
    Signal(i32),
    /// Process could not be started
    Spawn(String),
    /// Waiting for the process failed
    Wait(String),
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitInfo::Code(code) => write!(f, "exited with status {}", code),
            ExitInfo::Signal(signal) => write!(f, "killed by signal {}", signal),
            ExitInfo::Spawn(msg) => write!(f, "failed to start: {}", msg),
            ExitInfo::Wait(msg) => write!(f, "failed to wait: {}", msg),
        }
    }
}

/// Main error type for the capture core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Resolution selector is not in the preset table
    UnknownResolution(String),
    /// Duration text is not HH:MM:SS with numeric fields
    InvalidDuration(String),
    /// Framerate text is not a positive number
    InvalidFramerate(String),
    /// Timelapse interval outside the accepted range
    InvalidInterval(String),
    /// Host model could not be read; callers downgrade to the Unknown profile
    DeviceIdentificationUnavailable(String),
    /// An external tool failed to start or exited unsuccessfully
    ExternalToolFailure { tool: Tool, exit: ExitInfo },
    /// Save folder could not be prepared
    Storage(String),
}

impl CaptureError {
    /// True for errors caused by user input rather than the system
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CaptureError::UnknownResolution(_)
                | CaptureError::InvalidDuration(_)
                | CaptureError::InvalidFramerate(_)
                | CaptureError::InvalidInterval(_)
        )
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::UnknownResolution(sel) => write!(f, "Unknown resolution: {:?}", sel),
            CaptureError::InvalidDuration(text) => write!(
                f,
                "Invalid duration {:?}. Use hours:minutes:seconds.",
                text
            ),
            CaptureError::InvalidFramerate(text) => write!(f, "Invalid framerate: {:?}", text),
            CaptureError::InvalidInterval(msg) => write!(f, "Invalid interval: {}", msg),
            CaptureError::DeviceIdentificationUnavailable(msg) => {
                write!(f, "Failed to detect Raspberry Pi model: {}", msg)
            }
            CaptureError::ExternalToolFailure { tool, exit } => {
                write!(f, "{} tool {}", tool, exit)
            }
            CaptureError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_classified() {
        assert!(CaptureError::InvalidDuration("x".into()).is_input_error());
        assert!(CaptureError::UnknownResolution("9".into()).is_input_error());
        assert!(
            !CaptureError::ExternalToolFailure {
                tool: Tool::Still,
                exit: ExitInfo::Code(1),
            }
            .is_input_error()
        );
    }

    #[test]
    fn test_tool_failure_message() {
        let err = CaptureError::ExternalToolFailure {
            tool: Tool::Video,
            exit: ExitInfo::Code(255),
        };
        assert_eq!(err.to_string(), "video capture tool exited with status 255");
    }
}
