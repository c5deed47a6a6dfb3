/// Fixed-capacity rolling window of recent samples
pub mod rolling_window;

pub use rolling_window::{RollingWindow, DEFAULT_WINDOW_CAPACITY};
