use std::time::Duration;

use crate::live::nmea::TelemetryFrame;

/// The live-vehicle transport collaborator.
///
/// Implementations own the socket (or serial line, or a test script) and the
/// sentence framing from [`crate::live::nmea`]. All operations report
/// recoverable failure in-band: commands return `false` when they could not
/// be delivered, and a telemetry read returning `None` means "no valid frame
/// within the timeout", never an error. The control loop continues on its
/// last known state in both cases.
pub trait VehicleLink {
    /// Send a manual-control-mode command (surge force, sway force, yaw
    /// torque). The vehicle reverts to drift unless this is refreshed at
    /// least every 3 seconds.
    fn send_command(&mut self, force_x: f64, force_y: f64, torque_z: f64) -> bool;

    /// Send the explicit zero-thrust drift command.
    fn send_drift(&mut self) -> bool;

    /// Wait up to `timeout` for a telemetry burst and return the decoded
    /// frame, or `None` if nothing valid arrived in time.
    fn read_telemetry(&mut self, timeout: Duration) -> Option<TelemetryFrame>;
}
