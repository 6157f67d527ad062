use std::f64::consts::PI;

use nalgebra::{Vector2, Vector6};

// ---------------------------------------------------------------------------
// Vessel state: position/attitude, body velocities, propeller speeds
// ---------------------------------------------------------------------------

/// Full vehicle state at a single point in time.
///
/// Frames follow the SNAME convention: `eta` is position/attitude in the
/// local NED frame (north, east, down, roll, pitch, yaw — radians), `nu` is
/// the body-frame velocity (surge, sway, heave, roll rate, pitch rate, yaw
/// rate), `u_actual` the actual propeller shaft speeds (left, right — rad/s).
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub eta: Vector6<f64>,
    pub nu: Vector6<f64>,
    pub u_actual: Vector2<f64>,
}

impl VehicleState {
    /// State at the NED origin, at rest, propellers stopped.
    pub fn at_rest() -> Self {
        Self {
            eta: Vector6::zeros(),
            nu: Vector6::zeros(),
            u_actual: Vector2::zeros(),
        }
    }

    /// North/east position in the horizontal plane.
    pub fn position_ne(&self) -> Vector2<f64> {
        Vector2::new(self.eta[0], self.eta[1])
    }

    /// Heading wrapped to (-pi, pi], measured from true north, positive east.
    pub fn yaw(&self) -> f64 {
        wrap_pi(self.eta[5])
    }

    /// True when every component of the state is finite. A false result means
    /// the integration has diverged and the run must be aborted.
    pub fn is_finite(&self) -> bool {
        self.eta.iter().all(|x| x.is_finite())
            && self.nu.iter().all(|x| x.is_finite())
            && self.u_actual.iter().all(|x| x.is_finite())
    }
}

/// Wrap an angle to (-pi, pi].
///
/// The half-open convention matters for bearings: a setpoint of pi against a
/// measurement of -pi is the same heading, so the error must come out near 0.
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_handles_full_turns() {
        assert!((wrap_pi(2.0 * PI) - 0.0).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(-2.5 * PI) + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn wrap_is_half_open_at_pi() {
        // (-pi, pi]: both boundaries map to +pi, never -pi
        assert_eq!(wrap_pi(PI), PI);
        assert_eq!(wrap_pi(-PI), PI);
    }

    #[test]
    fn opposite_wraps_cancel() {
        // setpoint pi, measured -pi is the same heading
        let error = wrap_pi(PI - (-PI));
        assert!(error.abs() < 1e-12, "error should be ~0, got {error}");
    }

    #[test]
    fn finite_check_catches_nan() {
        let mut s = VehicleState::at_rest();
        assert!(s.is_finite());
        s.nu[5] = f64::NAN;
        assert!(!s.is_finite());
    }
}
