pub mod pilot;
pub mod target;

pub use pilot::{CycleCommand, Pilot};
pub use target::{Target, TargetFix, TargetTracker};
