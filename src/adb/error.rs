use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for ADB operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for all device-side operations.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error(
        "'adb' executable '{adb_path}' not found. Install Android Platform Tools (https://developer.android.com/tools/adb), add it to PATH, or run with --impl=rust."
    )]
    AdbNotFound { adb_path: String },

    #[error("Failed to connect to device '{target}': {description}")]
    ConnectionFailed { target: String, description: String },

    #[error("Device target '{target}' is not a valid serial or host:port address")]
    InvalidTarget { target: String },

    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Shell command '{command}' failed: {source}")]
    RustAdbCommand {
        command: String,
        source: adb_client::RustADBError,
    },

    #[error("Captured frame could not be decoded: {description}")]
    FrameDecodeFailed { description: String },

    #[error("Local file {path:?} could not be accessed: {source}")]
    LocalIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse screen size from 'wm size' output.")]
    ScreenSizeParseFailed,

    #[error("Tap coordinates are out of bounds: x={x}, y={y}")]
    TapOutOfBounds { x: u32, y: u32 },

    #[error("Zoom scale {scale} must be a positive finite factor")]
    InvalidZoomScale { scale: f64 },
}

impl AdbError {
    /// Connection problems are fatal at startup; everything else is scoped to one command.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            AdbError::AdbNotFound { .. }
                | AdbError::ConnectionFailed { .. }
                | AdbError::InvalidTarget { .. }
        )
    }

    /// True when the frame reached us but its bytes were unreadable.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, AdbError::FrameDecodeFailed { .. })
    }

    pub(crate) fn rust_adb(command: &[&str], source: adb_client::RustADBError) -> Self {
        AdbError::RustAdbCommand {
            command: command.join(" "),
            source,
        }
    }
}
