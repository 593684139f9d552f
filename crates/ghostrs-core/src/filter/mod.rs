// Ghostrs Filter Layer
// Sliding-window ghost input classification

mod ghost;
mod window;

pub use ghost::{
    Decision, Decisions, FilterParams, GhostFilter, DEFAULT_THRESHOLD, DEFAULT_WINDOW_MS,
};
pub use window::PressWindow;
