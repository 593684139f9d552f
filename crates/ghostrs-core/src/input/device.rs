// Ghostrs Input Layer - Device Detection
// Device capability analysis and joystick detection

use crate::input::event::is_joystick_button;

/// Device capabilities extracted from evdev device.capabilities()
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Whether the device supports EV_KEY events
    pub has_ev_key: bool,
    /// List of supported key codes (EV_KEY capability codes)
    pub supported_keys: Vec<u16>,
}

impl DeviceCapabilities {
    /// Create a new DeviceCapabilities struct
    pub fn new(has_ev_key: bool, supported_keys: Vec<u16>) -> Self {
        Self {
            has_ev_key,
            supported_keys,
        }
    }

    /// Check if a specific key code is supported
    pub fn supports_key(&self, key_code: u16) -> bool {
        self.supported_keys.contains(&key_code)
    }

    /// Count the joystick buttons the device advertises
    pub fn joystick_button_count(&self) -> usize {
        self.supported_keys
            .iter()
            .filter(|code| is_joystick_button(**code))
            .count()
    }
}

/// Determine if a device is a joystick based on its capabilities.
///
/// A device is considered a joystick if it supports EV_KEY events and
/// advertises at least one button in the BTN_JOYSTICK / BTN_GAMEPAD /
/// BTN_TRIGGER_HAPPY blocks. Keyboards and mice report EV_KEY too but
/// their codes fall outside those blocks.
pub fn is_joystick(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }

    capabilities
        .supported_keys
        .iter()
        .any(|code| is_joystick_button(*code))
}

/// Check if a device is a virtual device based on its name.
///
/// Virtual devices are created by ghostrs itself and must be filtered
/// out to prevent feedback loops.
///
/// # Arguments
/// * `name` - The device name from evdev
/// * `prefix` - The virtual device prefix (e.g., "Ghostrs (virtual)")
pub fn is_virtual_device(name: &str, prefix: &str) -> bool {
    name.contains(prefix)
}

/// Produce a short log label for a device name.
///
/// HOTAS setups commonly pair a stick and a throttle whose full names
/// are long; "Stick"/"Throttle" keep the log columns readable. Anything
/// else keeps its reported name.
pub fn short_label(name: &str) -> String {
    let lowered = name.to_lowercase();
    if lowered.contains("stick") {
        "Stick".to_string()
    } else if lowered.contains("throttle") {
        "Throttle".to_string()
    } else {
        name.to_string()
    }
}
