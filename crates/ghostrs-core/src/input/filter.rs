// Ghostrs Input Layer - Device Filtering
// Device matching logic for autodetection and manual selection

/// Check if a device matches the given selection criteria.
///
/// The selection logic is:
///
/// 1. If matches are specified, only match devices by path or name
/// 2. If no matches, exclude virtual devices and non-joysticks
///
/// # Arguments
/// * `device_name` - The device name from evdev
/// * `device_path` - The device path (e.g., "/dev/input/event7")
/// * `filter_names` - List of device names/paths to match (empty for autodetect)
/// * `autodetect` - Whether to autodetect joysticks (true when filter_names is empty)
/// * `is_joystick` - Whether the device is a joystick (from is_joystick())
/// * `is_virtual` - Whether the device is a virtual device (from is_virtual_device())
///
/// # Returns
/// * `true` if the device should be used, `false` otherwise
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    autodetect: bool,
    is_joystick: bool,
    is_virtual: bool,
) -> bool {
    // If matches are specified, only match by path or name
    if !filter_names.is_empty() {
        return filter_names
            .iter()
            .any(|match_name| device_path == match_name || device_name == match_name);
    }

    // Autodetect mode: exclude virtual devices
    if is_virtual {
        return false;
    }

    // Autodetect mode: only use joystick devices
    if autodetect && !is_joystick {
        return false;
    }

    true
}
