// Ghostrs Output Layer
// Virtual joystick contract and button state management

mod state;

#[cfg(feature = "pure-rust")]
mod uinput;

pub use state::PressedButtonState;

#[cfg(feature = "pure-rust")]
pub use uinput::{UinputJoystick, VIRTUAL_DEVICE_PREFIX};

/// Error types for virtual device operations
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    WriteError(String),

    #[error("Button code {0:#x} is not advertised by the virtual device")]
    UnsupportedButton(u16),
}

/// The output boundary: set one virtual button's state.
///
/// Sessions drive this contract; the runtime backs it with a uinput
/// device and tests back it with an in-memory fake.
pub trait VirtualJoystick {
    /// Set the state of one button on the virtual device
    fn set_button(&mut self, button: u16, pressed: bool) -> Result<(), OutputError>;
}
