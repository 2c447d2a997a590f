// ADB module - device port for the matcher
// Two interchangeable transports: the external `adb` executable and the
// pure Rust `adb_client` protocol implementation.

pub mod backend;
pub mod error;
pub mod rust_impl;
pub mod shell;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export the main types for easy access
pub use backend::AdbBackend;
pub use error::{AdbError, AdbResult};
pub use rust_impl::RustAdb;
pub use shell::AdbShell;
pub use types::{
    BackendKind, CaptureConfig, CaptureMode, DEFAULT_SWIPE_MS, DEFAULT_TARGET,
    DEFAULT_ZOOM_IN_SCALE, DEFAULT_ZOOM_OUT_MS, DEFAULT_ZOOM_OUT_SCALE, Device, DeviceActions,
    DeviceConfig,
};
