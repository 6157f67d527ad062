use thiserror::Error;

/// Fatal faults of the guidance, navigation and control stack.
///
/// Recoverable conditions (a garbled telemetry burst, a cycle with no fix)
/// are reported in-band by the transport layer and logged; everything here
/// aborts the run.
#[derive(Debug, Error)]
pub enum GncError {
    /// The rigid-body-plus-added-mass matrix could not be inverted. Only
    /// possible with corrupted vessel parameters.
    #[error("system inertia matrix is singular")]
    SingularMassMatrix,

    /// The thrust allocation matrix B is singular, meaning the configured
    /// thruster geometry cannot produce independent surge and yaw.
    #[error(
        "control allocation matrix is singular (k_pos = {k_pos}, l1 = {l1}, l2 = {l2})"
    )]
    SingularAllocation { k_pos: f64, l1: f64, l2: f64 },

    /// A waypoint mission was configured with no waypoints.
    #[error("waypoint list is empty")]
    EmptyWaypointList,

    /// The interpolator was asked for more neighbours than the calibration
    /// table holds (or zero).
    #[error("invalid neighbour count {k} for a table of {samples} samples")]
    BadNeighborCount { k: usize, samples: usize },

    /// The throttle calibration grid failed to parse.
    #[error("throttle map, line {line}: {reason}")]
    ThrottleMap { line: usize, reason: String },

    /// The simulated state stopped being finite, typically from an
    /// integration step too large for the dynamics.
    #[error("simulation diverged to a non-finite state at t = {t:.3} s")]
    NumericDivergence { t: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
