// Ghostrs Pure Rust uinput Output Layer
// Virtual joystick creation and button event emission

use std::collections::HashSet;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};

use super::state::PressedButtonState;
use super::{OutputError, VirtualJoystick};

/// Name prefix for every virtual device ghostrs creates.
///
/// Device selection filters on this prefix to avoid grabbing our own
/// output and feeding it back through the filter.
pub const VIRTUAL_DEVICE_PREFIX: &str = "Ghostrs (virtual)";

/// Virtual uinput joystick mirroring one physical device.
///
/// Advertises exactly the BTN codes the physical device reports, so a
/// game sees the same button map it would on the real hardware.
pub struct UinputJoystick {
    device: VirtualDevice,
    advertised: HashSet<u16>,
    pressed: PressedButtonState,
    name: String,
}

impl UinputJoystick {
    /// Create a virtual joystick numbered `index`, advertising `buttons`.
    pub fn new(index: usize, buttons: &[u16]) -> Result<Self, OutputError> {
        let name = format!("{} Joystick #{}", VIRTUAL_DEVICE_PREFIX, index);

        let mut keys = AttributeSet::new();
        for code in buttons {
            keys.insert(Key::new(*code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| OutputError::DeviceCreation(e.to_string()))?
            .name(name.as_str())
            .with_keys(&keys)
            .map_err(|e: std::io::Error| OutputError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| OutputError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device,
            advertised: buttons.iter().copied().collect(),
            pressed: PressedButtonState::new(),
            name,
        })
    }

    /// The virtual device's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of buttons the device advertises
    pub fn button_count(&self) -> usize {
        self.advertised.len()
    }

    /// Write a single button event to the virtual device
    fn write_button_event(&mut self, button: u16, pressed: bool) -> Result<(), OutputError> {
        let value = i32::from(pressed);
        let key_event = InputEvent::new(EventType::KEY, button, value);
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        self.device
            .emit(&[key_event, syn_event])
            .map_err(|e: std::io::Error| OutputError::WriteError(e.to_string()))?;

        if pressed {
            self.pressed.add(button);
        } else {
            self.pressed.remove(button);
        }

        Ok(())
    }

    /// Release every button currently held down.
    ///
    /// Called on shutdown so the game never observes a latched virtual
    /// button after ghostrs exits.
    pub fn release_all(&mut self) -> Result<(), OutputError> {
        for button in self.pressed.get_all() {
            self.write_button_event(button, false)?;
        }
        self.pressed.clear();
        Ok(())
    }
}

impl VirtualJoystick for UinputJoystick {
    fn set_button(&mut self, button: u16, pressed: bool) -> Result<(), OutputError> {
        if !self.advertised.contains(&button) {
            return Err(OutputError::UnsupportedButton(button));
        }
        self.write_button_event(button, pressed)
    }
}
