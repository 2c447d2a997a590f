// Tests for the device port helpers
// Focus: adb output parsing, target handling, gesture composition

#[cfg(test)]
mod device_port_tests {
    use super::super::error::{AdbError, AdbResult};
    use super::super::types::*;
    use image::DynamicImage;

    /// Records every gesture instead of talking to a device.
    #[derive(Default)]
    struct RecordingDevice {
        target: String,
        swipes: Vec<(u32, u32, u32, u32, u32)>,
        taps: Vec<(u32, u32)>,
    }

    impl DeviceActions for RecordingDevice {
        fn target(&self) -> &str {
            &self.target
        }

        fn set_target(&mut self, target: &str) -> AdbResult<()> {
            self.target = target.to_string();
            Ok(())
        }

        fn capture_screen(&mut self) -> AdbResult<DynamicImage> {
            Ok(DynamicImage::new_luma8(4, 4))
        }

        fn tap(&mut self, x: u32, y: u32) -> AdbResult<()> {
            self.taps.push((x, y));
            Ok(())
        }

        fn swipe(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, ms: u32) -> AdbResult<()> {
            self.swipes.push((x1, y1, x2, y2, ms));
            Ok(())
        }
    }

    // ============================================================
    // ADB OUTPUT PARSING TESTS
    // ============================================================

    #[test]
    fn test_parse_devices_keeps_online_devices() {
        let output = "List of devices attached\n\
            127.0.0.1:16384        device product:cepheus model:MuMu transport_id:3\n\
            emulator-5554          offline transport_id:1\n\
            R58M123ABC             unauthorized usb:1-1\n\
            \n";
        let devices = parse_devices(output);

        assert_eq!(devices.len(), 1, "Only 'device' state entries are usable");
        assert_eq!(devices[0].name, "127.0.0.1:16384");
        assert_eq!(devices[0].transport_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_parse_devices_empty_list() {
        assert!(parse_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn test_parse_screen_size_physical() {
        let size = parse_screen_size("Physical size: 1080x2340\n").unwrap();
        assert_eq!(size, (1080, 2340));
    }

    #[test]
    fn test_parse_screen_size_prefers_override() {
        let size = parse_screen_size("Physical size: 1080x2340\nOverride size: 720x1560\n").unwrap();
        assert_eq!(size, (720, 1560), "Override size is what input maps to");
    }

    #[test]
    fn test_parse_screen_size_garbage() {
        assert!(matches!(
            parse_screen_size("error: no devices/emulators found"),
            Err(AdbError::ScreenSizeParseFailed)
        ));
    }

    // ============================================================
    // TARGET AND CONFIG TESTS
    // ============================================================

    #[test]
    fn test_network_target_detection() {
        assert!(is_network_target("127.0.0.1:16384"));
        assert!(is_network_target("192.168.1.20:5555"));
        assert!(!is_network_target("emulator-5554"));
        assert!(!is_network_target("R58M123ABC"));
        assert!(!is_network_target(":5555"));
        assert!(!is_network_target("host:notaport"));
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("shell".parse::<BackendKind>(), Ok(BackendKind::Shell));
        assert_eq!("rust".parse::<BackendKind>(), Ok(BackendKind::Rust));
        assert!("usb".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::default(), BackendKind::Shell);
    }

    #[test]
    fn test_device_config_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.target, DEFAULT_TARGET);
        assert_eq!(config.adb_path, "adb");
        assert_eq!(config.capture.mode, CaptureMode::Staged);
        assert_eq!(config.capture.remote_path, DEFAULT_REMOTE_SCREENSHOT);
    }

    #[test]
    fn test_escape_input_text() {
        assert_eq!(escape_input_text("hello big world"), "hello%sbig%sworld");
        assert_eq!(escape_input_text("plain"), "plain");
    }

    #[test]
    fn test_decode_frame_rejects_empty_and_garbage() {
        let empty = decode_frame(&[]).unwrap_err();
        assert!(empty.is_decode_failure());
        let garbage = decode_frame(b"not a png").unwrap_err();
        assert!(garbage.is_decode_failure());
        assert!(!garbage.is_connection_failure());
    }

    #[test]
    fn test_decode_frame_png() {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(3, 2)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let frame = decode_frame(&bytes).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
    }

    // ============================================================
    // GESTURE COMPOSITION TESTS
    // ============================================================

    #[test]
    fn test_swipe_relative_saturates_at_origin() {
        let mut dev = RecordingDevice::default();
        dev.swipe_relative(100, 50, -300, 20, DEFAULT_SWIPE_MS).unwrap();
        assert_eq!(dev.swipes, vec![(100, 50, 0, 70, 300)]);
    }

    #[test]
    fn test_pinch_zoom_in_moves_fingers_apart() {
        let mut dev = RecordingDevice::default();
        dev.pinch(500, 800, 100, 400, 250).unwrap();
        assert_eq!(
            dev.swipes,
            vec![(450, 800, 300, 800, 250), (550, 800, 700, 800, 250)],
            "Left finger moves left, right finger moves right"
        );
        assert!(dev.taps.is_empty());
    }

    #[test]
    fn test_pinch_zoom_out_clamps_left_finger() {
        let mut dev = RecordingDevice::default();
        dev.pinch(40, 100, 200, 20, 300).unwrap();
        assert_eq!(dev.swipes[0], (0, 100, 30, 100, 300));
        assert_eq!(dev.swipes[1], (140, 100, 50, 100, 300));
    }

    #[test]
    fn test_zoom_in_spreads_from_base_distance() {
        let mut dev = RecordingDevice::default();
        dev.zoom_in(500, 800, DEFAULT_ZOOM_IN_SCALE, DEFAULT_SWIPE_MS).unwrap();
        assert_eq!(
            dev.swipes,
            vec![(450, 800, 425, 800, 300), (550, 800, 575, 800, 300)]
        );
    }

    #[test]
    fn test_zoom_out_closes_to_fraction_of_half_start() {
        let mut dev = RecordingDevice::default();
        dev.zoom_out(540, 960, DEFAULT_ZOOM_OUT_SCALE, DEFAULT_ZOOM_OUT_MS).unwrap();
        // 600px apart down to 300 / 2 = 150px apart
        assert_eq!(
            dev.swipes,
            vec![(240, 960, 465, 960, 500), (840, 960, 615, 960, 500)]
        );
    }

    #[test]
    fn test_zoom_rejects_unusable_scale() {
        let mut dev = RecordingDevice::default();
        for scale in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                dev.zoom_in(500, 800, scale, 300),
                Err(AdbError::InvalidZoomScale { .. })
            ));
            assert!(matches!(
                dev.zoom_out(500, 800, scale, 300),
                Err(AdbError::InvalidZoomScale { .. })
            ));
        }
        assert!(dev.zoom_out(500, 800, 1e-300, 300).is_err());
        assert!(dev.swipes.is_empty());
    }

    // ============================================================
    // STAGED CAPTURE TESTS
    // ============================================================

    /// Logs device commands; `pull` and `rm` can be told to fail.
    #[derive(Default)]
    struct ScriptedTransport {
        commands: Vec<String>,
        fail_fetch: bool,
        fail_rm: bool,
    }

    impl StagedTransport for ScriptedTransport {
        fn device_shell(&mut self, args: &[&str]) -> AdbResult<()> {
            let command = args.join(" ");
            self.commands.push(command.clone());
            if self.fail_rm && args.first() == Some(&"rm") {
                return Err(AdbError::CommandFailed {
                    command,
                    status: "exit status: 1".to_string(),
                    stderr: "Read-only file system".to_string(),
                });
            }
            Ok(())
        }

        fn fetch(&mut self, remote: &str) -> AdbResult<Vec<u8>> {
            self.commands.push(format!("pull {remote}"));
            if self.fail_fetch {
                return Err(AdbError::CommandFailed {
                    command: format!("pull {remote}"),
                    status: "exit status: 1".to_string(),
                    stderr: "device offline".to_string(),
                });
            }
            Ok(vec![1, 2, 3])
        }
    }

    const REMOTE: &str = DEFAULT_REMOTE_SCREENSHOT;

    #[test]
    fn test_staged_capture_sequence() {
        let mut transport = ScriptedTransport::default();
        let bytes = staged_round_trip(&mut transport, REMOTE).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(
            transport.commands,
            vec![
                format!("screencap -p {REMOTE}"),
                format!("pull {REMOTE}"),
                format!("rm {REMOTE}"),
            ]
        );
    }

    #[test]
    fn test_failed_pull_still_removes_remote_file() {
        let mut transport = ScriptedTransport {
            fail_fetch: true,
            ..Default::default()
        };
        let err = staged_round_trip(&mut transport, REMOTE).unwrap_err();
        assert!(err.to_string().contains("device offline"), "unexpected error: {err}");
        assert_eq!(transport.commands.last(), Some(&format!("rm {REMOTE}")));
    }

    #[test]
    fn test_pull_error_wins_over_cleanup_error() {
        let mut transport = ScriptedTransport {
            fail_fetch: true,
            fail_rm: true,
            ..Default::default()
        };
        let err = staged_round_trip(&mut transport, REMOTE).unwrap_err();
        assert!(err.to_string().contains("device offline"), "unexpected error: {err}");
        assert_eq!(transport.commands.len(), 3);
    }

    #[test]
    fn test_failed_cleanup_fails_capture() {
        let mut transport = ScriptedTransport {
            fail_rm: true,
            ..Default::default()
        };
        let err = staged_round_trip(&mut transport, REMOTE).unwrap_err();
        assert!(err.to_string().contains("Read-only"), "unexpected error: {err}");
    }
}
