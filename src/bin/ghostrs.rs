// Ghostrs Pure Rust CLI
// Standalone ghost-input filter runtime over evdev joystick devices

#![cfg_attr(feature = "pure-rust", allow(dead_code))]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[cfg(feature = "pure-rust")]
use clap::Parser;

#[cfg(feature = "pure-rust")]
use ghostrs_core::event::EventLoop;
#[cfg(feature = "pure-rust")]
use ghostrs_core::input::{
    is_joystick_button, short_label, timestamp_micros, ButtonEvent,
};
#[cfg(feature = "pure-rust")]
use ghostrs_core::output::UinputJoystick;
#[cfg(feature = "pure-rust")]
use ghostrs_core::session::{DeviceSession, SessionConfig};
#[cfg(feature = "pure-rust")]
use ghostrs_core::settings::{validate_virtual_index, DeviceSettings, Settings};

/// Pure Rust ghost-input filter for joysticks
#[derive(Parser, Debug)]
#[command(name = "ghostrs")]
#[command(author = "ghostrs contributors")]
#[command(version = "0.3.0")]
#[command(about = "Suppress ghost inputs between physical and virtual joysticks", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Manually specify devices to filter (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List available joystick devices
    #[arg(long)]
    list_devices: bool,
}

/// Poll timeout; bounds how late a deferred verdict can resolve past
/// its window
const POLL_TIMEOUT_MS: i32 = 10;

/// Main application state
#[cfg(feature = "pure-rust")]
struct Application {
    settings: Settings,
    args: Args,
    /// Flag to signal event loop to stop
    running: Arc<AtomicBool>,
}

#[cfg(feature = "pure-rust")]
impl Application {
    /// Create a new application from CLI arguments
    fn new(args: Args) -> Result<Self, Box<dyn std::error::Error>> {
        let settings = match &args.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::load_default()?,
        };

        Ok(Self {
            settings,
            args,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Validate configuration and report the resolved device sections
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!("Configuration is valid");
        println!(
            "  logging: verbose={} summary_every={}",
            self.settings.verbose, self.settings.summary_every
        );

        if self.settings.devices.is_empty() {
            let params = self.settings.default_params();
            println!(
                "  autodetect: window={}ms threshold={}",
                params.span_us / 1_000,
                params.threshold
            );
            return Ok(());
        }

        for (i, device) in self.settings.devices.iter().enumerate() {
            let params = self.settings.params_for(device);
            let virtual_index = device.virtual_index.unwrap_or((i + 1) as i64);
            let index_note = match validate_virtual_index(virtual_index) {
                Ok(v) => format!("virtual #{}", v),
                Err(e) => format!("DISABLED: {}", e),
            };
            println!(
                "  [{}] \"{}\" -> {} (window={}ms threshold={} filtering={})",
                device.mode,
                device.name.as_deref().unwrap_or(&device.matcher),
                index_note,
                params.span_us / 1_000,
                params.threshold,
                params.enabled
            );
        }
        Ok(())
    }

    /// List available joystick devices
    fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
        match EventLoop::list_devices() {
            Ok(devices) => {
                println!("Found {} joystick device(s):", devices.len());
                for device in &devices {
                    match &device.path {
                        Some(path) => println!(
                            "  {}: {} ({}, {} buttons)",
                            device.index, device.name, path, device.button_count
                        ),
                        None => println!(
                            "  {}: {} ({} buttons)",
                            device.index, device.name, device.button_count
                        ),
                    }
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("Error finding joystick devices: {}", e);
                Err(e.into())
            }
        }
    }

    /// Look up the `[[device]]` section matching an opened device
    fn section_for<'a>(&'a self, name: &str, path: &str) -> Option<&'a DeviceSettings> {
        self.settings
            .devices
            .iter()
            .find(|d| d.matcher == path || d.matcher == name)
    }

    /// Build the session and virtual device for one grabbed joystick.
    ///
    /// Any initialization failure disables the session (the physical
    /// device stays grabbed and silent) rather than aborting the run.
    fn build_session(
        &self,
        index: usize,
        event_loop: &EventLoop,
        taken_indices: &mut Vec<usize>,
        taken_names: &mut Vec<String>,
    ) -> (DeviceSession, Option<UinputJoystick>) {
        let device_name = event_loop.device_name(index).unwrap_or_default();
        let device_path = event_loop.device_path(index).unwrap_or_default().to_string();
        let section = self.section_for(&device_name, &device_path);

        // Nickname the device for logs; disambiguate duplicates
        let mut label = match section.and_then(|s| s.name.clone()) {
            Some(name) => name,
            None => short_label(&device_name),
        };
        let duplicates = taken_names.iter().filter(|n| **n == label).count();
        taken_names.push(label.clone());
        if duplicates > 0 {
            label = format!("{} {}", label, duplicates + 1);
        }

        let params = match section {
            Some(s) => self.settings.params_for(s),
            None => self.settings.default_params(),
        };

        let raw_index = section
            .and_then(|s| s.virtual_index)
            .unwrap_or((index + 1) as i64);

        let config = SessionConfig {
            name: label,
            mode: section.map(|s| s.mode.clone()).unwrap_or_else(|| "Default".to_string()),
            virtual_index: raw_index.max(0) as usize,
            params,
            verbose: self.settings.verbose,
            summary_every: self.settings.summary_every,
        };

        let virtual_index = match validate_virtual_index(raw_index) {
            Ok(v) => v,
            Err(e) => {
                return (DeviceSession::disabled(config, &e.to_string()), None);
            }
        };

        if taken_indices.contains(&virtual_index) {
            let reason = format!("virtual_index {} is already in use", virtual_index);
            return (DeviceSession::disabled(config, &reason), None);
        }

        let buttons = event_loop.device_buttons(index);
        if buttons.is_empty() {
            return (
                DeviceSession::disabled(config, "device advertises no joystick buttons"),
                None,
            );
        }

        match UinputJoystick::new(virtual_index, &buttons) {
            Ok(output) => {
                taken_indices.push(virtual_index);
                log::info!(
                    "\"{}\" ({}) mirrored as \"{}\" with {} buttons",
                    config.name,
                    device_path,
                    output.name(),
                    output.button_count()
                );
                (DeviceSession::new(config), Some(output))
            }
            Err(e) => (DeviceSession::disabled(config, &e.to_string()), None),
        }
    }

    /// Run the filter runtime
    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        // Resolve device filter precedence: CLI --devices > config
        // [[device]] match entries > autodetect.
        let active_device_filter = if !self.args.devices.is_empty() {
            self.args.devices.clone()
        } else {
            self.settings.device_matchers()
        };

        // Grab the physical devices so the game only sees the mirrors
        let mut event_loop = EventLoop::new_with_grab_filtered(&active_device_filter)?;
        log::info!(
            "grabbed {} joystick device(s): {:?}",
            event_loop.device_count(),
            event_loop.device_names()
        );

        // One session + virtual mirror per grabbed device
        let mut taken_indices = Vec::new();
        let mut taken_names = Vec::new();
        let mut sessions = Vec::new();
        let mut outputs = Vec::new();
        for index in 0..event_loop.device_count() {
            let (session, output) =
                self.build_session(index, &event_loop, &mut taken_indices, &mut taken_names);
            sessions.push(session);
            outputs.push(output);
        }

        if outputs.iter().all(|o| o.is_none()) {
            event_loop.ungrab_all();
            return Err("no device could be initialized; check the log".into());
        }

        // Set up signal handler for graceful shutdown
        {
            use signal_hook::iterator::Signals;
            let running = self.running.clone();

            std::thread::spawn(move || {
                if let Ok(mut signals) =
                    Signals::new(&[signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM])
                {
                    for signal in &mut signals {
                        match signal {
                            signal_hook::consts::SIGINT | signal_hook::consts::SIGTERM => {
                                println!("\nReceived signal, shutting down gracefully...");
                                running.store(false, Ordering::SeqCst);
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            });
        }

        println!("ghostrs is running. Press Ctrl+C to exit.");
        let result = self.run_main_loop(&mut event_loop, &mut sessions, &mut outputs);

        // Cleanup: summaries, released buttons, ungrabbed devices
        for (session, output) in sessions.iter_mut().zip(outputs.iter_mut()) {
            let mut stdout = std::io::stdout();
            if let Err(e) = session.write_summary(&mut stdout) {
                log::error!("failed to write summary: {}", e);
            }
            if let Some(output) = output {
                if let Err(e) = output.release_all() {
                    log::error!("failed to release virtual buttons: {}", e);
                }
            }
        }
        event_loop.ungrab_all();

        result
    }

    /// Run the main event processing loop
    fn run_main_loop(
        &self,
        event_loop: &mut EventLoop,
        sessions: &mut [DeviceSession],
        outputs: &mut [Option<UinputJoystick>],
    ) -> Result<(), Box<dyn std::error::Error>> {
        use evdev::EventType;

        while self.running.load(Ordering::SeqCst) {
            match event_loop.poll_for_events(POLL_TIMEOUT_MS) {
                Ok(events) => {
                    for polled in events {
                        let event = polled.event;
                        if event.event_type() != EventType::KEY {
                            continue;
                        }

                        let pressed = match event.value() {
                            0 => false,
                            1 => true,
                            // Repeats (and anything else) never apply to
                            // joystick buttons
                            _ => continue,
                        };

                        let code = event.code();
                        if !is_joystick_button(code) {
                            // Unexpected event shape: drop, never forward
                            log::debug!(
                                "dropping non-joystick code {:#x} from device {}",
                                code,
                                polled.device_index
                            );
                            continue;
                        }

                        let button_event = ButtonEvent {
                            button: code,
                            pressed,
                            timestamp_us: timestamp_micros(event.timestamp()),
                        };

                        let index = polled.device_index;
                        if let (Some(session), Some(slot)) =
                            (sessions.get_mut(index), outputs.get_mut(index))
                        {
                            if let Some(output) = slot.as_mut() {
                                session.handle_event(button_event, output);
                            }
                        }
                    }

                    // Resolve deferred verdicts on every tick, whether or
                    // not events arrived
                    let now_us = timestamp_micros(SystemTime::now());
                    for (session, output) in sessions.iter_mut().zip(outputs.iter_mut()) {
                        if let Some(output) = output {
                            session.flush(now_us, output);
                        }
                    }
                }
                Err(e) => {
                    log::error!("event poll failed: {}", e);
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "pure-rust")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    // Handle list-devices flag (doesn't require config)
    if args.list_devices {
        return Application::list_devices();
    }

    let app = Application::new(args)?;

    // Handle check-config flag
    if app.args.check_config {
        return app.validate();
    }

    // Run main loop
    app.run()
}

// Stub for when pure-rust feature is not enabled
#[cfg(not(feature = "pure-rust"))]
fn main() {
    eprintln!("Error: ghostrs binary requires the 'pure-rust' feature to be enabled.");
    eprintln!("Please build with: cargo build --release --features pure-rust --bin ghostrs");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_parsing() {
        use std::path::PathBuf;

        let args = Args::parse_from(["ghostrs", "--config", "/tmp/test.toml"]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
        assert!(args.devices.is_empty());
        assert!(!args.verbose);
        assert!(!args.check_config);
        assert!(!args.list_devices);
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "ghostrs",
            "--config",
            "/tmp/test.toml",
            "--verbose",
            "--devices",
            "/dev/input/event7",
            "--devices",
            "/dev/input/event9",
        ]);

        assert!(args.verbose);
        assert_eq!(args.devices.len(), 2);
        assert_eq!(args.devices[0], "/dev/input/event7");
        assert_eq!(args.devices[1], "/dev/input/event9");
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_list_devices() {
        let args = Args::parse_from(["ghostrs", "--list-devices"]);
        assert!(args.list_devices);
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_check_config() {
        let args = Args::parse_from(["ghostrs", "--config", "/tmp/test.toml", "--check-config"]);
        assert!(args.check_config);
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_section_lookup_prefers_exact_match() {
        let settings = Settings::from_toml(
            r#"
[[device]]
match = "/dev/input/event7"
name = "Stick"

[[device]]
match = "Thrustmaster TWCS Throttle"
name = "Throttle"
"#,
        )
        .unwrap();

        let app = Application {
            settings,
            args: Args::parse_from(["ghostrs"]),
            running: Arc::new(AtomicBool::new(true)),
        };

        let by_path = app.section_for("Some Stick", "/dev/input/event7");
        assert_eq!(by_path.unwrap().name.as_deref(), Some("Stick"));

        let by_name = app.section_for("Thrustmaster TWCS Throttle", "/dev/input/event9");
        assert_eq!(by_name.unwrap().name.as_deref(), Some("Throttle"));

        assert!(app.section_for("Unknown", "/dev/input/event0").is_none());
    }
}
