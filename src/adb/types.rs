// Core device types and the action port consumed by the matcher
use super::error::{AdbError, AdbResult};
use image::DynamicImage;
use serde::Serialize;
use std::path::PathBuf;

/// Default emulator bridge address (MuMu style port forwarding).
pub const DEFAULT_TARGET: &str = "127.0.0.1:16384";
pub const DEFAULT_REMOTE_SCREENSHOT: &str = "/sdcard/temp_screenshot.png";
pub const DEFAULT_LOCAL_SCREENSHOT: &str = "tmp_img_save_folder/screenshot.png";
pub const DEFAULT_SWIPE_MS: u32 = 300;
/// Finger spacing a zoom-in starts from.
pub const ZOOM_IN_BASE_DISTANCE: u32 = 100;
/// Finger spacing a zoom-out starts from.
pub const ZOOM_OUT_START_DISTANCE: u32 = 600;
pub const DEFAULT_ZOOM_IN_SCALE: f64 = 1.5;
pub const DEFAULT_ZOOM_OUT_SCALE: f64 = 2.0;
pub const DEFAULT_ZOOM_OUT_MS: u32 = 500;

/// Operations the matching core needs from a device. Everything blocks until
/// the device has answered.
pub trait DeviceActions {
    /// Address of the connected device (serial or `host:port`).
    fn target(&self) -> &str;

    /// Point the port at another device, reconnecting as required.
    fn set_target(&mut self, target: &str) -> AdbResult<()>;

    /// Capture the display and decode it. Never returns a partial image.
    fn capture_screen(&mut self) -> AdbResult<DynamicImage>;

    fn tap(&mut self, x: u32, y: u32) -> AdbResult<()>;

    fn swipe(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, duration_ms: u32) -> AdbResult<()>;

    /// Drag from `(x, y)` by `(dx, dy)`; the end point saturates at the screen origin.
    fn swipe_relative(
        &mut self,
        x: u32,
        y: u32,
        dx: i32,
        dy: i32,
        duration_ms: u32,
    ) -> AdbResult<()> {
        let end_x = x.saturating_add_signed(dx);
        let end_y = y.saturating_add_signed(dy);
        self.swipe(x, y, end_x, end_y, duration_ms)
    }

    /// Horizontal two-finger pinch around a center. Plain `input` cannot do
    /// multi-touch, so the two fingers run as consecutive swipes.
    fn pinch(
        &mut self,
        center_x: u32,
        center_y: u32,
        start_distance: u32,
        end_distance: u32,
        duration_ms: u32,
    ) -> AdbResult<()> {
        let half_start = start_distance / 2;
        let half_end = end_distance / 2;
        log::info!(
            "{} gesture at ({center_x}, {center_y}): {start_distance}px -> {end_distance}px",
            if end_distance > start_distance { "Zoom-in" } else { "Zoom-out" }
        );
        self.swipe(
            center_x.saturating_sub(half_start),
            center_y,
            center_x.saturating_sub(half_end),
            center_y,
            duration_ms,
        )?;
        self.swipe(
            center_x.saturating_add(half_start),
            center_y,
            center_x.saturating_add(half_end),
            center_y,
            duration_ms,
        )
    }

    /// Spread the fingers from 100px to `100 * scale` px.
    fn zoom_in(
        &mut self,
        center_x: u32,
        center_y: u32,
        scale: f64,
        duration_ms: u32,
    ) -> AdbResult<()> {
        let end = zoom_distance(f64::from(ZOOM_IN_BASE_DISTANCE) * scale, scale)?;
        self.pinch(center_x, center_y, ZOOM_IN_BASE_DISTANCE, end, duration_ms)
    }

    /// Close the fingers from 600px to `300 / scale` px.
    fn zoom_out(
        &mut self,
        center_x: u32,
        center_y: u32,
        scale: f64,
        duration_ms: u32,
    ) -> AdbResult<()> {
        let end = zoom_distance(f64::from(ZOOM_OUT_START_DISTANCE / 2) / scale, scale)?;
        self.pinch(center_x, center_y, ZOOM_OUT_START_DISTANCE, end, duration_ms)
    }
}

fn zoom_distance(distance: f64, scale: f64) -> AdbResult<u32> {
    let representable = distance.is_finite() && distance <= f64::from(u32::MAX);
    if !scale.is_finite() || scale <= 0.0 || !representable {
        return Err(AdbError::InvalidZoomScale { scale });
    }
    Ok(distance as u32)
}

/// Device side of a staged capture: run a device shell command, and copy a
/// device file into memory.
pub(crate) trait StagedTransport {
    fn device_shell(&mut self, args: &[&str]) -> AdbResult<()>;

    fn fetch(&mut self, remote: &str) -> AdbResult<Vec<u8>>;
}

/// `screencap` into `remote`, fetch it, then delete it from the device. The
/// delete runs even when the fetch failed; the fetch error is reported first.
pub(crate) fn staged_round_trip(
    transport: &mut impl StagedTransport,
    remote: &str,
) -> AdbResult<Vec<u8>> {
    transport.device_shell(&["screencap", "-p", remote])?;
    let fetched = transport.fetch(remote);
    let removed = transport.device_shell(&["rm", remote]);
    match (fetched, removed) {
        (Err(e), Err(rm)) => {
            log::warn!("Staged screenshot {remote} left on device: {rm}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(rm)) => Err(rm),
        (Ok(bytes), Ok(())) => Ok(bytes),
    }
}

#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Device {
    pub name: String,
    pub transport_id: Option<String>,
}

/// Which transport implementation talks to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// External `adb` executable.
    #[default]
    Shell,
    /// `adb_client` speaking to the local ADB server.
    Rust,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Shell => "shell",
            BackendKind::Rust => "rust",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shell" => Ok(BackendKind::Shell),
            "rust" => Ok(BackendKind::Rust),
            other => Err(format!("unknown impl '{other}', expected 'rust' or 'shell'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// screencap to a device file, pull it, delete it.
    #[default]
    Staged,
    /// `exec-out screencap -p` straight into memory.
    ExecOut,
}

impl std::str::FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staged" => Ok(CaptureMode::Staged),
            "exec-out" => Ok(CaptureMode::ExecOut),
            other => Err(format!(
                "unknown capture mode '{other}', expected 'staged' or 'exec-out'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub mode: CaptureMode,
    /// Device-side temporary file for staged captures.
    pub remote_path: String,
    /// Local destination of pulled screenshots.
    pub local_path: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::default(),
            remote_path: DEFAULT_REMOTE_SCREENSHOT.to_string(),
            local_path: PathBuf::from(DEFAULT_LOCAL_SCREENSHOT),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub target: String,
    pub adb_path: String,
    pub backend: BackendKind,
    pub capture: CaptureConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            adb_path: "adb".to_string(),
            backend: BackendKind::default(),
            capture: CaptureConfig::default(),
        }
    }
}

/// `host:port` targets must be attached with `adb connect` before use.
pub fn is_network_target(target: &str) -> bool {
    target
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}

/// Parse `adb devices -l` output, keeping only entries in the `device` state.
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 && parts[1] == "device" {
                let transport_id = parts
                    .iter()
                    .find_map(|part| part.strip_prefix("transport_id:"))
                    .map(str::to_string);
                Some(Device {
                    name: parts[0].to_string(),
                    transport_id,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Parse `wm size` output (`Physical size: 1080x2340`). An override size wins
/// when present because that is what input coordinates are mapped against.
pub fn parse_screen_size(stdout: &str) -> AdbResult<(u32, u32)> {
    let parse = |prefix: &str| {
        stdout.lines().find_map(|line| {
            let (w, h) = line.trim().strip_prefix(prefix)?.trim().split_once('x')?;
            Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?))
        })
    };
    parse("Override size:")
        .or_else(|| parse("Physical size:"))
        .ok_or(AdbError::ScreenSizeParseFailed)
}

/// `input text` treats spaces as argument separators; `%s` is its escape.
pub fn escape_input_text(text: &str) -> String {
    text.replace(' ', "%s")
}

pub(crate) fn decode_frame(bytes: &[u8]) -> AdbResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(AdbError::FrameDecodeFailed {
            description: "device returned 0 bytes".to_string(),
        });
    }
    image::load_from_memory(bytes).map_err(|e| AdbError::FrameDecodeFailed {
        description: format!("{} bytes: {e}", bytes.len()),
    })
}
