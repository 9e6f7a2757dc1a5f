//! Voice activity: per-chunk level classification and end-of-turn debouncing.

pub mod level;
pub mod silence;

pub use level::{AudioLevelMonitor, LevelReading};
pub use silence::{sleep_until_deadline, SilenceTimer};
