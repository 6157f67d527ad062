pub mod log;
pub mod throttle_map;

pub use log::{CycleLog, CycleSample};
