// Ghostrs Input Layer - Event Model
// Button event type and evdev code classification

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// EV_KEY event type code from evdev.ecodes
pub const EV_KEY: u16 = 0x01;

/// First code of the BTN_JOYSTICK block (BTN_TRIGGER)
pub const BTN_JOYSTICK_BASE: u16 = 0x120;
/// First code of the BTN_GAMEPAD block (BTN_SOUTH)
pub const BTN_GAMEPAD_BASE: u16 = 0x130;
/// First code of the BTN_TRIGGER_HAPPY block
pub const BTN_TRIGGER_HAPPY_BASE: u16 = 0x2c0;

/// A single button state change on one physical device.
///
/// `timestamp_us` is monotonic microseconds; only differences between
/// timestamps are ever interpreted, never absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// evdev BTN_* code of the button
    pub button: u16,
    /// true for press, false for release
    pub pressed: bool,
    /// Event time in microseconds
    pub timestamp_us: u64,
}

impl ButtonEvent {
    /// Create a press event
    pub fn press(button: u16, timestamp_us: u64) -> Self {
        Self {
            button,
            pressed: true,
            timestamp_us,
        }
    }

    /// Create a release event
    pub fn release(button: u16, timestamp_us: u64) -> Self {
        Self {
            button,
            pressed: false,
            timestamp_us,
        }
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            button_label(self.button),
            if self.pressed { "down" } else { "up" }
        )
    }
}

/// Check if an event is a key/button event.
///
/// Button events have event.type == EV_KEY (0x01); joysticks report
/// their buttons through the same event type as keyboards.
pub fn is_button_event(event_type: u16) -> bool {
    event_type == EV_KEY
}

/// Check if a key code belongs to one of the joystick button blocks.
///
/// Covers BTN_JOYSTICK (0x120-0x12f), BTN_GAMEPAD (0x130-0x13e) and
/// BTN_TRIGGER_HAPPY (0x2c0-0x2e7) from input-event-codes.h.
pub fn is_joystick_button(code: u16) -> bool {
    matches!(code, 0x120..=0x13e | 0x2c0..=0x2e7)
}

/// Map a BTN code to a 0-based joystick button index, if it has one.
///
/// The BTN_JOYSTICK block covers buttons 0-15 and BTN_TRIGGER_HAPPY
/// continues from 16. Gamepad buttons (BTN_SOUTH etc.) carry names
/// instead of indices and return None.
pub fn joystick_button_index(code: u16) -> Option<u16> {
    match code {
        0x120..=0x12f => Some(code - BTN_JOYSTICK_BASE),
        0x2c0..=0x2e7 => Some(16 + (code - BTN_TRIGGER_HAPPY_BASE)),
        _ => None,
    }
}

/// Human-readable label for a button code, for logs and summaries.
///
/// Indexed joystick buttons render as "Joy N" (1-based, matching how
/// joystick software numbers them); gamepad buttons by name; anything
/// else as the raw code.
pub fn button_label(code: u16) -> String {
    if let Some(index) = joystick_button_index(code) {
        return format!("Joy {}", index + 1);
    }

    match code {
        0x130 => "BTN_SOUTH".to_string(),
        0x131 => "BTN_EAST".to_string(),
        0x132 => "BTN_C".to_string(),
        0x133 => "BTN_NORTH".to_string(),
        0x134 => "BTN_WEST".to_string(),
        0x135 => "BTN_Z".to_string(),
        0x136 => "BTN_TL".to_string(),
        0x137 => "BTN_TR".to_string(),
        0x138 => "BTN_TL2".to_string(),
        0x139 => "BTN_TR2".to_string(),
        0x13a => "BTN_SELECT".to_string(),
        0x13b => "BTN_START".to_string(),
        0x13c => "BTN_MODE".to_string(),
        0x13d => "BTN_THUMBL".to_string(),
        0x13e => "BTN_THUMBR".to_string(),
        other => format!("BTN_{:#x}", other),
    }
}

/// Convert a SystemTime (as reported by evdev) to microseconds.
///
/// Times before the epoch collapse to 0; the filter only compares
/// differences, so the anchor does not matter.
pub fn timestamp_micros(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_is_button_event_with_ev_key() {
        assert!(is_button_event(EV_KEY));
    }

    #[test]
    fn test_is_button_event_with_other_event() {
        assert!(!is_button_event(0x02)); // EV_REL
        assert!(!is_button_event(0x00)); // EV_SYN
        assert!(!is_button_event(0x04)); // EV_ABS
    }

    #[test]
    fn test_is_joystick_button_ranges() {
        assert!(is_joystick_button(0x120)); // BTN_TRIGGER
        assert!(is_joystick_button(0x12f)); // BTN_DEAD
        assert!(is_joystick_button(0x130)); // BTN_SOUTH
        assert!(is_joystick_button(0x13e)); // BTN_THUMBR
        assert!(is_joystick_button(0x2c0)); // BTN_TRIGGER_HAPPY1
        assert!(is_joystick_button(0x2e7)); // BTN_TRIGGER_HAPPY40

        assert!(!is_joystick_button(30)); // KEY_A
        assert!(!is_joystick_button(0x110)); // BTN_LEFT (mouse)
        assert!(!is_joystick_button(0x13f));
        assert!(!is_joystick_button(0x2e8));
    }

    #[test]
    fn test_joystick_button_index() {
        assert_eq!(joystick_button_index(0x120), Some(0));
        assert_eq!(joystick_button_index(0x12f), Some(15));
        assert_eq!(joystick_button_index(0x2c0), Some(16));
        assert_eq!(joystick_button_index(0x2e7), Some(55));
        assert_eq!(joystick_button_index(0x130), None); // named, not indexed
        assert_eq!(joystick_button_index(30), None);
    }

    #[test]
    fn test_button_label() {
        assert_eq!(button_label(0x120), "Joy 1");
        assert_eq!(button_label(0x12f), "Joy 16");
        assert_eq!(button_label(0x2c0), "Joy 17");
        assert_eq!(button_label(0x130), "BTN_SOUTH");
        assert_eq!(button_label(0x13e), "BTN_THUMBR");
    }

    #[test]
    fn test_button_event_constructors() {
        let press = ButtonEvent::press(0x122, 1_000);
        assert!(press.pressed);
        assert_eq!(press.button, 0x122);
        assert_eq!(press.timestamp_us, 1_000);

        let release = ButtonEvent::release(0x122, 2_000);
        assert!(!release.pressed);
        assert_eq!(release.timestamp_us, 2_000);
    }

    #[test]
    fn test_button_event_display() {
        assert_eq!(ButtonEvent::press(0x122, 0).to_string(), "Joy 3 down");
        assert_eq!(ButtonEvent::release(0x122, 0).to_string(), "Joy 3 up");
    }

    #[test]
    fn test_timestamp_micros() {
        let t = UNIX_EPOCH + Duration::from_micros(1_234_567);
        assert_eq!(timestamp_micros(t), 1_234_567);
        assert_eq!(timestamp_micros(UNIX_EPOCH), 0);
    }
}
