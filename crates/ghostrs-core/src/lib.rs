// Ghostrs Core Library
// Ghost-input suppression for joystick button events

pub mod action;
pub mod filter;
pub mod input;
pub mod output;
pub mod session;
pub mod stats;

#[cfg(feature = "pure-rust")]
pub mod settings;

// Event module hosts the evdev runtime loop
#[cfg(feature = "pure-rust")]
pub mod event;

pub use action::Action;
pub use filter::{
    Decision, Decisions, FilterParams, GhostFilter, PressWindow, DEFAULT_THRESHOLD,
    DEFAULT_WINDOW_MS,
};
pub use input::{
    button_label, is_button_event, is_joystick, is_joystick_button, is_virtual_device,
    joystick_button_index, matches_device_filter, short_label, timestamp_micros, ButtonEvent,
    DeviceCapabilities,
};
pub use output::{OutputError, PressedButtonState, VirtualJoystick};
pub use session::{DeviceSession, SessionConfig};
pub use stats::FilterStats;

#[cfg(feature = "pure-rust")]
pub use output::{UinputJoystick, VIRTUAL_DEVICE_PREFIX};

#[cfg(feature = "pure-rust")]
pub use settings::{
    default_settings_content, validate_virtual_index, DeviceSettings, Settings, SettingsError,
    MAX_VIRTUAL_DEVICES,
};

#[cfg(feature = "pure-rust")]
pub use event::{DeviceInfo, EventLoop, EventLoopError, EventLoopResult, PolledEvent};
