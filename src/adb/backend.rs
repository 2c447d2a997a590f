use super::error::AdbResult;
use super::rust_impl::RustAdb;
use super::shell::AdbShell;
use super::types::{BackendKind, DeviceActions, DeviceConfig};
use image::DynamicImage;

pub enum AdbBackend {
    Shell(AdbShell),
    Rust(RustAdb),
}

impl AdbBackend {
    /// Open the configured backend. Any failure here is a startup failure.
    pub fn connect(config: &DeviceConfig) -> AdbResult<Self> {
        log::info!(
            "Connecting to {} via {} backend",
            config.target,
            config.backend.as_str()
        );
        match config.backend {
            BackendKind::Shell => Ok(AdbBackend::Shell(AdbShell::connect(
                &config.adb_path,
                &config.target,
                config.capture.clone(),
            )?)),
            BackendKind::Rust => Ok(AdbBackend::Rust(RustAdb::connect(
                &config.target,
                config.capture.clone(),
            )?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            AdbBackend::Shell(_) => BackendKind::Shell,
            AdbBackend::Rust(_) => BackendKind::Rust,
        }
    }

    pub fn screen_dimensions(&self) -> (u32, u32) {
        match self {
            AdbBackend::Shell(s) => s.screen_dimensions(),
            AdbBackend::Rust(r) => r.screen_dimensions(),
        }
    }

    pub fn input_text(&mut self, text: &str) -> AdbResult<()> {
        match self {
            AdbBackend::Shell(s) => s.input_text(text),
            AdbBackend::Rust(r) => r.input_text(text),
        }
    }
}

impl DeviceActions for AdbBackend {
    fn target(&self) -> &str {
        match self {
            AdbBackend::Shell(s) => s.target(),
            AdbBackend::Rust(r) => r.target(),
        }
    }

    fn set_target(&mut self, target: &str) -> AdbResult<()> {
        match self {
            AdbBackend::Shell(s) => s.set_target(target),
            AdbBackend::Rust(r) => r.set_target(target),
        }
    }

    fn capture_screen(&mut self) -> AdbResult<DynamicImage> {
        match self {
            AdbBackend::Shell(s) => s.capture_screen(),
            AdbBackend::Rust(r) => r.capture_screen(),
        }
    }

    fn tap(&mut self, x: u32, y: u32) -> AdbResult<()> {
        match self {
            AdbBackend::Shell(s) => s.tap(x, y),
            AdbBackend::Rust(r) => r.tap(x, y),
        }
    }

    fn swipe(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, duration_ms: u32) -> AdbResult<()> {
        match self {
            AdbBackend::Shell(s) => s.swipe(x1, y1, x2, y2, duration_ms),
            AdbBackend::Rust(r) => r.swipe(x1, y1, x2, y2, duration_ms),
        }
    }
}
