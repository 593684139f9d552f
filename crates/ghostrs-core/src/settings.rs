// Ghostrs Settings Module
// TOML configuration: logging, filter defaults and device sections

#![cfg(feature = "pure-rust")]

use std::path::{Path, PathBuf};

use crate::filter::FilterParams;

/// Highest accepted virtual device number (matches the 16-device limit
/// of the virtual joystick drivers this mirrors)
pub const MAX_VIRTUAL_DEVICES: i64 = 16;

/// Parsed configuration for a ghostrs run.
///
/// Loaded from a TOML file (default: ~/.config/ghostrs/ghostrs.toml).
/// Filter values are kept raw here; `params_for` resolves them through
/// `FilterParams::sanitized`, so invalid numbers degrade to defaults
/// instead of failing the load.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Log every legitimate press, not just ghosts
    pub verbose: bool,
    /// Presses between periodic summaries (0 = off)
    pub summary_every: u64,
    /// Global window length in milliseconds
    default_window_ms: i64,
    /// Global distinct-button threshold
    default_threshold: i64,
    /// Per-device sections
    pub devices: Vec<DeviceSettings>,
    /// Path the settings were loaded from (for reload)
    source_path: Option<PathBuf>,
}

/// One `[[device]]` section
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    /// Exact device path or name to match
    pub matcher: String,
    /// Log label; defaults to a nickname derived from the device name
    pub name: Option<String>,
    /// 1-based virtual device number; defaults to the section position
    pub virtual_index: Option<i64>,
    /// Profile mode label
    pub mode: String,
    /// Whether ghost filtering is active for this device
    pub filtering: bool,
    /// Per-device window override
    pub window_ms: Option<i64>,
    /// Per-device threshold override
    pub threshold: Option<i64>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    logging: Option<LoggingToml>,

    #[serde(default)]
    filter: Option<FilterToml>,

    #[serde(default)]
    device: Option<Vec<DeviceToml>>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct LoggingToml {
    #[serde(default)]
    verbose: Option<bool>,

    #[serde(default)]
    summary_every: Option<i64>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct FilterToml {
    #[serde(default)]
    window_ms: Option<i64>,

    #[serde(default)]
    threshold: Option<i64>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct DeviceToml {
    #[serde(rename = "match")]
    matcher: String,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    virtual_index: Option<i64>,

    #[serde(default)]
    mode: Option<String>,

    #[serde(default)]
    filtering: Option<bool>,

    #[serde(default)]
    window_ms: Option<i64>,

    #[serde(default)]
    threshold: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Create settings with every default: autodetect devices, 50ms
    /// window, threshold 2, quiet logging
    pub fn new() -> Self {
        Self {
            verbose: false,
            summary_every: 0,
            default_window_ms: crate::filter::DEFAULT_WINDOW_MS as i64,
            default_threshold: crate::filter::DEFAULT_THRESHOLD as i64,
            devices: Vec::new(),
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(logging) = parsed.logging {
            if let Some(verbose) = logging.verbose {
                settings.verbose = verbose;
            }
            if let Some(every) = logging.summary_every {
                if every < 0 {
                    return Err(SettingsError::InvalidValue(format!(
                        "summary_every must not be negative, got {}",
                        every
                    )));
                }
                settings.summary_every = every as u64;
            }
        }

        if let Some(filter) = parsed.filter {
            if let Some(window_ms) = filter.window_ms {
                settings.default_window_ms = window_ms;
            }
            if let Some(threshold) = filter.threshold {
                settings.default_threshold = threshold;
            }
        }

        for device in parsed.device.unwrap_or_default() {
            if device.matcher.is_empty() {
                return Err(SettingsError::InvalidValue(
                    "device match must not be empty".to_string(),
                ));
            }
            settings.devices.push(DeviceSettings {
                matcher: device.matcher,
                name: device.name,
                virtual_index: device.virtual_index,
                mode: device.mode.unwrap_or_else(|| "Default".to_string()),
                filtering: device.filtering.unwrap_or(true),
                window_ms: device.window_ms,
                threshold: device.threshold,
            });
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ghostrs").join("ghostrs.toml"))
    }

    /// Load from default location (~/.config/ghostrs/ghostrs.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        // Return default settings if file doesn't exist
        Ok(Self::new())
    }

    /// Reload settings from the original file
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        match self.source_path.clone() {
            Some(path) => {
                *self = Self::from_file(path)?;
                Ok(())
            }
            None => Err(SettingsError::InvalidValue(
                "No source path set".to_string(),
            )),
        }
    }

    /// Resolve filter parameters for one device section.
    ///
    /// Per-device overrides win over the global `[filter]` defaults;
    /// everything passes through sanitization.
    pub fn params_for(&self, device: &DeviceSettings) -> FilterParams {
        FilterParams::sanitized(
            device.window_ms.unwrap_or(self.default_window_ms),
            device.threshold.unwrap_or(self.default_threshold),
            device.filtering,
        )
    }

    /// Filter parameters from the global defaults alone (autodetected
    /// devices with no `[[device]]` section)
    pub fn default_params(&self) -> FilterParams {
        FilterParams::sanitized(self.default_window_ms, self.default_threshold, true)
    }

    /// The configured match strings, for device selection
    pub fn device_matchers(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.matcher.clone()).collect()
    }
}

/// Validate a 1-based virtual device number.
///
/// Out-of-range numbers are a configuration error that disables the
/// affected device section, not a reason to reject the whole file.
pub fn validate_virtual_index(raw: i64) -> Result<usize, SettingsError> {
    if (1..=MAX_VIRTUAL_DEVICES).contains(&raw) {
        Ok(raw as usize)
    } else {
        Err(SettingsError::InvalidValue(format!(
            "virtual_index must be between 1 and {}, got {}",
            MAX_VIRTUAL_DEVICES, raw
        )))
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Ghostrs Settings
# Place this file at: ~/.config/ghostrs/ghostrs.toml

[logging]
# Log every legitimate button press (instead of just ghost inputs)
verbose = false
# Log a summary every N presses (0 disables periodic summaries)
summary_every = 100

[filter]
# How close together (milliseconds) button changes must be to count
# as simultaneous
window_ms = 50
# How many buttons pressed at once constitute a ghost input
threshold = 2

# One section per physical device; omit all sections to autodetect
# every joystick with the [filter] defaults.
#
# [[device]]
# match = "/dev/input/event7"   # exact device path or name
# name = "Stick"
# virtual_index = 1
# mode = "Default"
# filtering = true
# window_ms = 50
# threshold = 2
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::new();
        assert!(!settings.verbose);
        assert_eq!(settings.summary_every, 0);
        assert!(settings.devices.is_empty());

        let params = settings.default_params();
        assert_eq!(params.span_us, 50_000);
        assert_eq!(params.threshold, 2);
        assert!(params.enabled);
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
[logging]
verbose = true
summary_every = 200

[filter]
window_ms = 30
threshold = 3

[[device]]
match = "/dev/input/event7"
name = "Stick"
virtual_index = 1

[[device]]
match = "Thrustmaster TWCS Throttle"
virtual_index = 2
mode = "Flight"
filtering = false
window_ms = 80
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert!(settings.verbose);
        assert_eq!(settings.summary_every, 200);
        assert_eq!(settings.devices.len(), 2);

        let stick = &settings.devices[0];
        assert_eq!(stick.matcher, "/dev/input/event7");
        assert_eq!(stick.name.as_deref(), Some("Stick"));
        assert_eq!(stick.mode, "Default");
        assert!(stick.filtering);

        let stick_params = settings.params_for(stick);
        assert_eq!(stick_params.span_us, 30_000);
        assert_eq!(stick_params.threshold, 3);

        let throttle = &settings.devices[1];
        assert_eq!(throttle.mode, "Flight");
        let throttle_params = settings.params_for(throttle);
        assert_eq!(throttle_params.span_us, 80_000);
        assert_eq!(throttle_params.threshold, 3);
        assert!(!throttle_params.enabled);
    }

    #[test]
    fn test_invalid_filter_values_fall_back_to_defaults() {
        let toml = r#"
[filter]
window_ms = 0
threshold = -2
"#;

        let settings = Settings::from_toml(toml).unwrap();
        let params = settings.default_params();
        assert_eq!(params.span_us, 50_000);
        assert_eq!(params.threshold, 2);
    }

    #[test]
    fn test_empty_match_is_rejected() {
        let toml = r#"
[[device]]
match = ""
"#;
        assert!(matches!(
            Settings::from_toml(toml),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_negative_summary_every_is_rejected() {
        let toml = r#"
[logging]
summary_every = -1
"#;
        assert!(matches!(
            Settings::from_toml(toml),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Settings::from_toml("[logging"),
            Err(SettingsError::TomlParse(_))
        ));
    }

    #[test]
    fn test_validate_virtual_index() {
        assert_eq!(validate_virtual_index(1).unwrap(), 1);
        assert_eq!(validate_virtual_index(16).unwrap(), 16);
        assert!(validate_virtual_index(0).is_err());
        assert!(validate_virtual_index(-1).is_err());
        assert!(validate_virtual_index(17).is_err());
    }

    #[test]
    fn test_device_matchers() {
        let toml = r#"
[[device]]
match = "A"

[[device]]
match = "B"
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.device_matchers(), vec!["A", "B"]);
    }

    #[test]
    fn test_reload_without_source_path_fails() {
        let mut settings = Settings::new();
        assert!(matches!(
            settings.reload(),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_default_settings_content_parses() {
        let settings = Settings::from_toml(default_settings_content()).unwrap();
        assert_eq!(settings.summary_every, 100);
        assert!(settings.devices.is_empty());
    }
}
