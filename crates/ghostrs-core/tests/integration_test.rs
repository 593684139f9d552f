// Ghostrs Pure Rust Integration Tests
//
// These tests verify the complete pipeline:
// settings -> session -> ghost filter -> virtual output
//
// Run with: cargo test --features pure-rust --test integration_test

#[cfg(feature = "pure-rust")]
mod tests {
    use ghostrs_core::input::ButtonEvent;
    use ghostrs_core::output::{OutputError, VirtualJoystick};
    use ghostrs_core::session::{DeviceSession, SessionConfig};
    use ghostrs_core::settings::{validate_virtual_index, Settings};

    const B3: u16 = 0x122; // Joy 3
    const B7: u16 = 0x126; // Joy 7

    /// In-memory virtual joystick recording every set_button call
    #[derive(Debug, Default)]
    struct FakeJoystick {
        calls: Vec<(u16, bool)>,
    }

    impl VirtualJoystick for FakeJoystick {
        fn set_button(&mut self, button: u16, pressed: bool) -> Result<(), OutputError> {
            self.calls.push((button, pressed));
            Ok(())
        }
    }

    const CONFIG: &str = r#"
[logging]
verbose = false
summary_every = 0

[filter]
window_ms = 50
threshold = 2

[[device]]
match = "/dev/input/event7"
name = "Stick"
virtual_index = 1
mode = "Flight"
"#;

    /// Build a session from the first device section of a config string
    fn session_from(config: &str) -> DeviceSession {
        let settings = Settings::from_toml(config).unwrap();
        let device = &settings.devices[0];

        let session_config = SessionConfig {
            name: device.name.clone().unwrap_or_else(|| device.matcher.clone()),
            mode: device.mode.clone(),
            virtual_index: validate_virtual_index(device.virtual_index.unwrap_or(1)).unwrap(),
            params: settings.params_for(device),
            verbose: settings.verbose,
            summary_every: settings.summary_every,
        };
        DeviceSession::new(session_config)
    }

    #[test]
    fn test_configured_session_identity() {
        let session = session_from(CONFIG);
        assert_eq!(session.name(), "Stick");
        assert_eq!(session.mode(), "Flight");
        assert_eq!(session.virtual_index(), 1);
        assert!(session.is_enabled());
    }

    #[test]
    fn test_clean_press_flows_to_virtual_device() {
        let mut session = session_from(CONFIG);
        let mut out = FakeJoystick::default();

        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.handle_event(ButtonEvent::release(B3, 10_000), &mut out);
        session.flush(70_000, &mut out);

        assert_eq!(out.calls, vec![(B3, true), (B3, false)]);
        assert_eq!(session.stats().total_allowed(), 1);
        assert_eq!(session.stats().total_blocked(), 0);
    }

    #[test]
    fn test_ghost_burst_blocked_end_to_end() {
        let mut session = session_from(CONFIG);
        let mut out = FakeJoystick::default();

        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.handle_event(ButtonEvent::press(B7, 5_000), &mut out);
        session.handle_event(ButtonEvent::release(B3, 8_000), &mut out);
        session.handle_event(ButtonEvent::release(B7, 9_000), &mut out);
        session.flush(100_000, &mut out);

        assert!(out.calls.is_empty());
        assert_eq!(session.stats().total_blocked(), 2);
    }

    #[test]
    fn test_per_device_window_override_applies() {
        let config = r#"
[filter]
window_ms = 50

[[device]]
match = "x"
virtual_index = 1
window_ms = 5
"#;
        let mut session = session_from(config);
        let mut out = FakeJoystick::default();

        // 10ms apart: simultaneous under the 50ms default, but not
        // under this device's 5ms override
        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.handle_event(ButtonEvent::press(B7, 10_000), &mut out);
        session.flush(50_000, &mut out);

        assert_eq!(out.calls, vec![(B3, true), (B7, true)]);
        assert_eq!(session.stats().total_blocked(), 0);
    }

    #[test]
    fn test_filtering_disabled_passes_bursts_through() {
        let config = r#"
[[device]]
match = "x"
virtual_index = 1
filtering = false
"#;
        let mut session = session_from(config);
        let mut out = FakeJoystick::default();

        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.handle_event(ButtonEvent::press(B7, 5_000), &mut out);

        // Bypass resolves immediately; no flush needed
        assert_eq!(out.calls, vec![(B3, true), (B7, true)]);
    }

    #[test]
    fn test_invalid_filter_config_degrades_to_defaults() {
        let config = r#"
[[device]]
match = "x"
virtual_index = 1
window_ms = -10
threshold = 0
"#;
        let mut session = session_from(config);
        let mut out = FakeJoystick::default();

        // Defaults (50ms, 2) are in force: a pair 5ms apart is a ghost
        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.handle_event(ButtonEvent::press(B7, 5_000), &mut out);
        session.flush(100_000, &mut out);

        assert!(out.calls.is_empty());
        assert_eq!(session.stats().total_blocked(), 2);
    }

    #[test]
    fn test_out_of_range_virtual_index_disables_session() {
        let settings = Settings::from_toml(
            r#"
[[device]]
match = "x"
virtual_index = 99
"#,
        )
        .unwrap();
        let device = &settings.devices[0];

        let raw = device.virtual_index.unwrap();
        let error = validate_virtual_index(raw).unwrap_err();

        let session_config = SessionConfig {
            name: "x".to_string(),
            mode: device.mode.clone(),
            virtual_index: raw as usize,
            params: settings.params_for(device),
            verbose: false,
            summary_every: 0,
        };
        let mut session = DeviceSession::disabled(session_config, &error.to_string());
        let mut out = FakeJoystick::default();

        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.flush(100_000, &mut out);

        assert!(!session.is_enabled());
        assert!(out.calls.is_empty());
    }

    #[test]
    fn test_summary_reports_session_activity() {
        let mut session = session_from(CONFIG);
        let mut out = FakeJoystick::default();

        session.handle_event(ButtonEvent::press(B3, 0), &mut out);
        session.flush(60_000, &mut out);
        session.handle_event(ButtonEvent::press(B3, 100_000), &mut out);
        session.handle_event(ButtonEvent::press(B7, 103_000), &mut out);

        let mut buffer = Vec::new();
        session.write_summary(&mut buffer).unwrap();
        let summary = String::from_utf8(buffer).unwrap();

        assert!(summary.contains("\"Stick\" [Flight]"));
        assert!(summary.contains("inputs allowed:        1"));
        assert!(summary.contains("ghost inputs blocked:  2"));
    }
}
