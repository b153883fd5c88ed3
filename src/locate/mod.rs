pub mod start_time;
pub mod worked_time;

pub use start_time::locate_start_time;
pub use worked_time::{locate_worked_time, WorkedTimeTexts};
