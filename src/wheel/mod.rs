mod core;

pub use self::core::{WheelMeter, WheelSnapshot, AVG_WINDOW_MAX};
