//! Guidance, navigation and control stack for a small twin-thruster
//! autonomous surface vessel.
//!
//! The same per-cycle pipeline (target tracking, dual-axis PID, yaw-priority
//! saturation, control allocation, empirical throttle correction) drives
//! either the built-in 6-DOF dynamics model ([`sim`]) or a real vehicle over
//! an NMEA-like command/telemetry link ([`live`]).

pub mod config;
pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod guidance;
pub mod io;
pub mod live;
pub mod sim;
pub mod vessel;

pub use config::{GuidanceConfig, LiveConfig, PidGains, SimConfig};
pub use error::GncError;
