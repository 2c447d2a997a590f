use super::error::{AdbError, AdbResult};
use super::types::{
    CaptureConfig, CaptureMode, Device, DeviceActions, StagedTransport, staged_round_trip,
    decode_frame, escape_input_text, is_network_target, parse_devices, parse_screen_size,
};
use image::DynamicImage;
use std::process::{Command, Output};

/// Device port backed by the external `adb` executable.
pub struct AdbShell {
    adb_path: String,
    target: String,
    capture: CaptureConfig,
    screen_x: u32,
    screen_y: u32,
}

impl AdbShell {
    fn ensure_adb_available(adb_path: &str) -> AdbResult<()> {
        match Command::new(adb_path).arg("version").output() {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(AdbError::CommandFailed {
                command: format!("{adb_path} version"),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AdbError::AdbNotFound {
                adb_path: adb_path.to_string(),
            }),
            Err(source) => Err(AdbError::Spawn {
                command: format!("{adb_path} version"),
                source,
            }),
        }
    }

    /// Attach to `target`, failing when the device never shows up in `adb devices`.
    pub fn connect(adb_path: &str, target: &str, capture: CaptureConfig) -> AdbResult<Self> {
        Self::ensure_adb_available(adb_path)?;
        let mut shell = Self {
            adb_path: adb_path.to_string(),
            target: String::new(),
            capture,
            screen_x: 0,
            screen_y: 0,
        };
        shell.attach(target)?;
        Ok(shell)
    }

    fn attach(&mut self, target: &str) -> AdbResult<()> {
        if target.trim().is_empty() {
            return Err(AdbError::InvalidTarget {
                target: target.to_string(),
            });
        }

        if is_network_target(target) {
            let out = self.run_global(&["connect", target])?;
            let stdout = String::from_utf8_lossy(&out.stdout);
            if stdout.contains("Connection refused")
                || stdout.contains("failed to connect")
                || stdout.contains("cannot connect")
            {
                return Err(AdbError::ConnectionFailed {
                    target: target.to_string(),
                    description: format!("{} Try: 'adb tcpip 5555'", stdout.trim()),
                });
            }
        }

        let devices = self.list_devices()?;
        if devices.is_empty() {
            return Err(AdbError::ConnectionFailed {
                target: target.to_string(),
                description: "no ADB devices detected".to_string(),
            });
        }
        if !devices.iter().any(|d| d.name == target) {
            let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
            return Err(AdbError::ConnectionFailed {
                target: target.to_string(),
                description: format!("device not listed; available: {}", names.join(", ")),
            });
        }

        self.target = target.to_string();
        let (sx, sy) = self.screen_size()?;
        self.screen_x = sx;
        self.screen_y = sy;
        log::info!(
            "ADB connected: {} ({}x{}, {} device(s) attached)",
            self.target,
            sx,
            sy,
            devices.len()
        );
        Ok(())
    }

    pub fn list_devices(&self) -> AdbResult<Vec<Device>> {
        let out = self.run_global(&["devices", "-l"])?;
        Ok(parse_devices(&String::from_utf8_lossy(&out.stdout)))
    }

    pub fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    pub fn screen_size(&self) -> AdbResult<(u32, u32)> {
        let out = self.run(&["shell", "wm", "size"])?;
        parse_screen_size(&String::from_utf8_lossy(&out.stdout))
    }

    pub fn input_text(&self, text: &str) -> AdbResult<()> {
        let escaped = escape_input_text(text);
        self.run(&["shell", "input", "text", escaped.as_str()])?;
        log::info!("Typed text: {text}");
        Ok(())
    }

    /// Command line for one device-scoped invocation, without the executable.
    pub(crate) fn device_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if !self.target.is_empty() {
            full.extend(["-s", self.target.as_str()]);
        }
        full.extend_from_slice(args);
        full
    }

    fn run(&self, args: &[&str]) -> AdbResult<Output> {
        let full = self.device_args(args);
        self.execute(&full)
    }

    fn run_global(&self, args: &[&str]) -> AdbResult<Output> {
        self.execute(args)
    }

    fn execute(&self, args: &[&str]) -> AdbResult<Output> {
        let command = format!("{} {}", self.adb_path, args.join(" "));
        log::debug!("Executing: {command}");
        let output = Command::new(&self.adb_path)
            .args(args)
            .output()
            .map_err(|source| AdbError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("ADB command failed: {command}\n  stderr: {stderr}");
            return Err(AdbError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(output)
    }

    fn capture_staged(&mut self) -> AdbResult<Vec<u8>> {
        let local = &self.capture.local_path;
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AdbError::LocalIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let remote = self.capture.remote_path.clone();
        staged_round_trip(self, &remote)
    }

    fn capture_exec_out(&self) -> AdbResult<Vec<u8>> {
        Ok(self.run(&["exec-out", "screencap", "-p"])?.stdout)
    }

    fn check_bounds(&self, x: u32, y: u32) -> AdbResult<()> {
        // Unknown screen size (0) disables the check.
        if (self.screen_x > 0 && x >= self.screen_x) || (self.screen_y > 0 && y >= self.screen_y) {
            return Err(AdbError::TapOutOfBounds { x, y });
        }
        Ok(())
    }
}

impl StagedTransport for AdbShell {
    fn device_shell(&mut self, args: &[&str]) -> AdbResult<()> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);
        self.run(&full).map(drop)
    }

    fn fetch(&mut self, remote: &str) -> AdbResult<Vec<u8>> {
        let local = self.capture.local_path.clone();
        let local_str = local.to_string_lossy();
        self.run(&["pull", remote, local_str.as_ref()])?;
        std::fs::read(&local).map_err(|source| AdbError::LocalIo {
            path: local.clone(),
            source,
        })
    }
}

impl DeviceActions for AdbShell {
    fn target(&self) -> &str {
        &self.target
    }

    fn set_target(&mut self, target: &str) -> AdbResult<()> {
        self.attach(target)
    }

    fn capture_screen(&mut self) -> AdbResult<DynamicImage> {
        let start = std::time::Instant::now();
        let bytes = match self.capture.mode {
            CaptureMode::Staged => self.capture_staged()?,
            CaptureMode::ExecOut => self.capture_exec_out()?,
        };
        let frame = decode_frame(&bytes)?;
        log::info!(
            "Screenshot {}x{} captured in {}ms",
            frame.width(),
            frame.height(),
            start.elapsed().as_millis()
        );
        Ok(frame)
    }

    fn tap(&mut self, x: u32, y: u32) -> AdbResult<()> {
        self.check_bounds(x, y)?;
        let (xs, ys) = (x.to_string(), y.to_string());
        self.run(&["shell", "input", "tap", xs.as_str(), ys.as_str()])?;
        log::info!("Tap at ({x}, {y})");
        Ok(())
    }

    fn swipe(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, duration_ms: u32) -> AdbResult<()> {
        for (x, y) in [(x1, y1), (x2, y2)] {
            self.check_bounds(x, y)?;
        }
        let coords = [x1, y1, x2, y2, duration_ms].map(|v| v.to_string());
        let mut args = vec!["shell", "input", "swipe"];
        args.extend(coords.iter().map(String::as_str));
        self.run(&args)?;
        log::info!("Swipe ({x1}, {y1}) -> ({x2}, {y2}) over {duration_ms}ms");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_shell(target: &str) -> AdbShell {
        AdbShell {
            adb_path: "adb".to_string(),
            target: target.to_string(),
            capture: CaptureConfig::default(),
            screen_x: 1080,
            screen_y: 2340,
        }
    }

    #[test]
    fn test_device_args_are_scoped_to_target() {
        let shell = offline_shell("127.0.0.1:16384");
        assert_eq!(
            shell.device_args(&["shell", "input", "tap", "1", "2"]),
            vec!["-s", "127.0.0.1:16384", "shell", "input", "tap", "1", "2"]
        );
    }

    #[test]
    fn test_device_args_without_target() {
        let shell = offline_shell("");
        assert_eq!(shell.device_args(&["devices"]), vec!["devices"]);
    }

    #[test]
    fn test_bounds_check() {
        let shell = offline_shell("emulator-5554");
        assert!(shell.check_bounds(0, 0).is_ok());
        assert!(shell.check_bounds(1079, 2339).is_ok());
        assert!(matches!(
            shell.check_bounds(1080, 10),
            Err(AdbError::TapOutOfBounds { x: 1080, y: 10 })
        ));
        assert!(shell.check_bounds(10, 2340).is_err());
    }

    #[test]
    fn test_missing_adb_binary_is_connection_failure() {
        let err = AdbShell::connect(
            "/definitely/not/an/adb/binary",
            "127.0.0.1:16384",
            CaptureConfig::default(),
        )
        .err()
        .expect("connect must fail without adb");
        assert!(err.is_connection_failure(), "unexpected error: {err}");
    }
}
