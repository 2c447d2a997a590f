// https://crates.io/crates/adb_client
use super::error::{AdbError, AdbResult};
use super::types::{
    CaptureConfig, CaptureMode, Device, DeviceActions, StagedTransport, staged_round_trip,
    decode_frame, escape_input_text, is_network_target, parse_screen_size,
};
use adb_client::{ADBDeviceExt, ADBServer, ADBServerDevice};
use image::DynamicImage;
use std::net::SocketAddrV4;

/// Device port speaking the ADB server protocol through `adb_client`.
pub struct RustAdb {
    server: ADBServer,
    server_device: ADBServerDevice,
    target: String,
    capture: CaptureConfig,
    screen_x: u32,
    screen_y: u32,
}

impl RustAdb {
    pub fn list_devices() -> AdbResult<Vec<Device>> {
        let mut server = ADBServer::default();
        Self::devices_from(&mut server)
    }

    fn devices_from(server: &mut ADBServer) -> AdbResult<Vec<Device>> {
        let devices = server
            .devices()
            .map_err(|e| AdbError::ConnectionFailed {
                target: "adb server".to_string(),
                description: format!("devices failed: {e}"),
            })?;
        Ok(devices
            .into_iter()
            .map(|d| Device {
                name: d.identifier,
                transport_id: None,
            })
            .collect())
    }

    fn open(server: &mut ADBServer, target: &str) -> AdbResult<ADBServerDevice> {
        if target.trim().is_empty() {
            return Err(AdbError::InvalidTarget {
                target: target.to_string(),
            });
        }
        if is_network_target(target) {
            let address: SocketAddrV4 = target.parse().map_err(|_| AdbError::InvalidTarget {
                target: target.to_string(),
            })?;
            server
                .connect_device(address)
                .map_err(|e| AdbError::ConnectionFailed {
                    target: target.to_string(),
                    description: format!("connect failed: {e}"),
                })?;
        }

        let devices = Self::devices_from(server)?;
        if devices.is_empty() {
            return Err(AdbError::ConnectionFailed {
                target: target.to_string(),
                description: "no ADB devices detected".to_string(),
            });
        }

        server
            .get_device_by_name(target)
            .map_err(|e| AdbError::ConnectionFailed {
                target: target.to_string(),
                description: format!("open device failed: {e}"),
            })
    }

    pub fn connect(target: &str, capture: CaptureConfig) -> AdbResult<Self> {
        let mut server = ADBServer::default();
        let server_device = Self::open(&mut server, target)?;
        let mut adb = RustAdb {
            server,
            server_device,
            target: target.to_string(),
            capture,
            screen_x: 0,
            screen_y: 0,
        };
        let (sx, sy) = adb.screen_size()?;
        adb.screen_x = sx;
        adb.screen_y = sy;
        log::info!("RustAdb connected: {target} ({sx}x{sy})");
        Ok(adb)
    }

    pub fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    fn shell(&mut self, command: &[&str]) -> AdbResult<Vec<u8>> {
        log::debug!("RustAdb shell: {}", command.join(" "));
        let mut out: Vec<u8> = Vec::new();
        self.server_device
            .shell_command(command, &mut out)
            .map_err(|e| {
                log::error!("RustAdb command failed: {}: {e}", command.join(" "));
                AdbError::rust_adb(command, e)
            })?;
        Ok(out)
    }

    pub fn screen_size(&mut self) -> AdbResult<(u32, u32)> {
        let out = self.shell(&["wm", "size"])?;
        parse_screen_size(&String::from_utf8_lossy(&out))
    }

    pub fn input_text(&mut self, text: &str) -> AdbResult<()> {
        let escaped = escape_input_text(text);
        self.shell(&["input", "text", escaped.as_str()])?;
        Ok(())
    }

    fn capture_staged(&mut self) -> AdbResult<Vec<u8>> {
        let remote = self.capture.remote_path.clone();
        let bytes = staged_round_trip(self, &remote)?;

        // Keep the local copy the shell backend would have left behind.
        let local = &self.capture.local_path;
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AdbError::LocalIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(local, &bytes).map_err(|source| AdbError::LocalIo {
            path: local.clone(),
            source,
        })?;
        Ok(bytes)
    }

    fn check_bounds(&self, x: u32, y: u32) -> AdbResult<()> {
        if (self.screen_x > 0 && x >= self.screen_x) || (self.screen_y > 0 && y >= self.screen_y) {
            return Err(AdbError::TapOutOfBounds { x, y });
        }
        Ok(())
    }
}

impl StagedTransport for RustAdb {
    fn device_shell(&mut self, args: &[&str]) -> AdbResult<()> {
        self.shell(args).map(drop)
    }

    fn fetch(&mut self, remote: &str) -> AdbResult<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();
        self.server_device
            .pull(&remote, &mut bytes)
            .map_err(|e| AdbError::rust_adb(&["pull", remote], e))?;
        Ok(bytes)
    }
}

impl DeviceActions for RustAdb {
    fn target(&self) -> &str {
        &self.target
    }

    fn set_target(&mut self, target: &str) -> AdbResult<()> {
        self.server_device = Self::open(&mut self.server, target)?;
        self.target = target.to_string();
        let (sx, sy) = self.screen_size()?;
        self.screen_x = sx;
        self.screen_y = sy;
        Ok(())
    }

    fn capture_screen(&mut self) -> AdbResult<DynamicImage> {
        let start = std::time::Instant::now();
        let bytes = match self.capture.mode {
            CaptureMode::Staged => self.capture_staged()?,
            CaptureMode::ExecOut => self.shell(&["screencap", "-p"])?,
        };
        let frame = decode_frame(&bytes)?;
        log::info!(
            "RustAdb screenshot {}x{} in {}ms",
            frame.width(),
            frame.height(),
            start.elapsed().as_millis()
        );
        Ok(frame)
    }

    fn tap(&mut self, x: u32, y: u32) -> AdbResult<()> {
        self.check_bounds(x, y)?;
        let (xs, ys) = (x.to_string(), y.to_string());
        self.shell(&["input", "tap", xs.as_str(), ys.as_str()])?;
        log::info!("Tap at ({x}, {y})");
        Ok(())
    }

    fn swipe(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, duration_ms: u32) -> AdbResult<()> {
        for (x, y) in [(x1, y1), (x2, y2)] {
            self.check_bounds(x, y)?;
        }
        let args = [x1, y1, x2, y2, duration_ms].map(|v| v.to_string());
        let mut command = vec!["input", "swipe"];
        command.extend(args.iter().map(String::as_str));
        self.shell(&command)?;
        log::info!("Swipe ({x1}, {y1}) -> ({x2}, {y2}) over {duration_ms}ms");
        Ok(())
    }
}
