pub mod clock;
pub mod duration;

pub use clock::ClockTime;
pub use duration::{format_clock, format_worded, parse_to_minutes, Minutes};
