// Ghostrs Event Handling
// Pure Rust event loop over joystick devices

#[cfg(feature = "pure-rust")]
pub mod r#loop;

#[cfg(feature = "pure-rust")]
pub use evdev::InputEvent;
#[cfg(feature = "pure-rust")]
pub use r#loop::{DeviceInfo, EventLoop, EventLoopError, EventLoopResult, PolledEvent};
