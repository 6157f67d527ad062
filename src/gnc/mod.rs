pub mod allocation;
pub mod kdtree;
pub mod pid;
pub mod throttle;

pub use allocation::{allocate_with_yaw_sign, prioritize_yaw, AllocatedSpeeds, ControlAllocationMap};
pub use pid::GuidancePid;
pub use throttle::{ThrottleInterpolator, ThrottleSample, ThrottleTable};
