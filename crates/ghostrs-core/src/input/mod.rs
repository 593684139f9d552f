// Ghostrs Input Layer
// Event model, device detection and filtering logic

mod device;
mod event;
mod filter;

pub use device::{is_joystick, is_virtual_device, short_label, DeviceCapabilities};
pub use event::{
    button_label, is_button_event, is_joystick_button, joystick_button_index, timestamp_micros,
    ButtonEvent, BTN_GAMEPAD_BASE, BTN_JOYSTICK_BASE, BTN_TRIGGER_HAPPY_BASE, EV_KEY,
};
pub use filter::matches_device_filter;
