use nalgebra::{Matrix2, Vector2};

use crate::error::GncError;

// ---------------------------------------------------------------------------
// Nonlinear control allocation
// ---------------------------------------------------------------------------

/// Maps a commanded surge force / yaw torque pair to per-thruster angular
/// velocities.
///
/// Thrust is quadratic in shaft speed (T = k * n * |n|), so a linear solve
/// through B^-1 yields n*|n| per thruster, not n; the signed square root
/// undoes the quadratic law exactly for the idealized single-quadrant
/// thruster curve. The empirical correction on top of this lives in
/// [`crate::gnc::throttle::ThrottleInterpolator`].
#[derive(Debug, Clone)]
pub struct ControlAllocationMap {
    b: Matrix2<f64>,
    b_inv: Matrix2<f64>,
    max_surge_force: f64,
    max_yaw_torque: f64,
}

impl ControlAllocationMap {
    /// Build B = k_pos * [[1, 1], [-l1, -l2]] and its inverse. A singular B
    /// (coincident lever arms) is a fatal configuration error.
    pub fn new(
        k_pos: f64,
        l1: f64,
        l2: f64,
        max_surge_force: f64,
        max_yaw_torque: f64,
    ) -> Result<Self, GncError> {
        let b = k_pos * Matrix2::new(1.0, 1.0, -l1, -l2);
        let b_inv = b
            .try_inverse()
            .ok_or(GncError::SingularAllocation { k_pos, l1, l2 })?;
        Ok(Self {
            b,
            b_inv,
            max_surge_force,
            max_yaw_torque,
        })
    }

    /// Pure mapping (force_x, torque_n) -> (n_left, n_right) in rad/s.
    /// Inputs are saturated to the configured magnitudes first;
    /// allocate(0, 0) is exactly (0, 0).
    pub fn allocate(&self, force_x: f64, torque_n: f64) -> (f64, f64) {
        let tau = Vector2::new(
            force_x.clamp(-self.max_surge_force, self.max_surge_force),
            torque_n.clamp(-self.max_yaw_torque, self.max_yaw_torque),
        );
        let u = self.b_inv * tau;
        (signed_sqrt(u[0]), signed_sqrt(u[1]))
    }

    /// Evaluate the idealized quadratic thrust law for a speed pair: the
    /// force/torque that `allocate`'s output would reproduce.
    pub fn forces_for(&self, n_left: f64, n_right: f64) -> (f64, f64) {
        let u = Vector2::new(n_left * n_left.abs(), n_right * n_right.abs());
        let tau = self.b * u;
        (tau[0], tau[1])
    }
}

/// n = sign(u) * sqrt(|u|), with 0 mapping to exactly 0.
fn signed_sqrt(u: f64) -> f64 {
    if u == 0.0 {
        0.0
    } else {
        u.signum() * u.abs().sqrt()
    }
}

// ---------------------------------------------------------------------------
// Shared command-pipeline helpers
// ---------------------------------------------------------------------------

/// Yaw-priority saturation: the yaw command is clamped to the total force
/// budget and surge gets whatever authority remains, so yaw is never starved
/// by large surge commands.
pub fn prioritize_yaw(force_x: f64, torque_n: f64, max_force: f64) -> (f64, f64) {
    let tau_n = torque_n.clamp(-max_force, max_force);
    let remaining = max_force - tau_n.abs();
    (force_x.clamp(-remaining, remaining), tau_n)
}

/// Allocation result carrying the negative-yaw bookkeeping the actuation
/// stage needs.
#[derive(Debug, Clone, Copy)]
pub struct AllocatedSpeeds {
    pub n1: f64,
    pub n2: f64,
    pub yaw_was_negative: bool,
}

/// Allocate with the negative-yaw workaround: for torque_n < 0 the solve uses
/// the magnitude and the resulting thruster pair is swapped back, and the
/// interpolated torque is later negated by the caller. This compensates for
/// an asymmetry in the thruster calibration data under negative yaw commands
/// and is kept exactly as calibrated — do not "fix" it against the ideal
/// model.
pub fn allocate_with_yaw_sign(
    map: &ControlAllocationMap,
    force_x: f64,
    torque_n: f64,
) -> AllocatedSpeeds {
    if torque_n < 0.0 {
        let (n1, n2) = map.allocate(force_x, -torque_n);
        AllocatedSpeeds {
            n1: n2,
            n2: n1,
            yaw_was_negative: true,
        }
    } else {
        let (n1, n2) = map.allocate(force_x, torque_n);
        AllocatedSpeeds {
            n1,
            n2,
            yaw_was_negative: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vessel::OtterParams;

    fn map() -> ControlAllocationMap {
        let p = OtterParams::new().unwrap();
        ControlAllocationMap::new(p.k_pos, p.l1, p.l2, 200.0, 115.0).unwrap()
    }

    #[test]
    fn zero_command_is_exactly_zero() {
        let (n1, n2) = map().allocate(0.0, 0.0);
        assert_eq!(n1, 0.0);
        assert_eq!(n2, 0.0);
    }

    #[test]
    fn allocation_round_trips_through_thrust_law() {
        let m = map();
        for &(fx, tn) in &[
            (50.0, 0.0),
            (120.0, 40.0),
            (-80.0, -60.0),
            (0.0, 115.0),
            (199.0, -115.0),
        ] {
            let (n1, n2) = m.allocate(fx, tn);
            let (fx2, tn2) = m.forces_for(n1, n2);
            assert!(
                (fx - fx2).abs() < 1e-9 && (tn - tn2).abs() < 1e-9,
                "round trip failed for ({fx}, {tn}): got ({fx2}, {tn2})"
            );
        }
    }

    #[test]
    fn inputs_saturate_symmetrically() {
        let m = map();
        let (a, _) = m.allocate(1e6, 0.0);
        let (b, _) = m.allocate(200.0, 0.0);
        assert!((a - b).abs() < 1e-12, "positive surge must clamp at the max");
        let (c, _) = m.allocate(-1e6, 0.0);
        let (d, _) = m.allocate(-200.0, 0.0);
        assert!((c - d).abs() < 1e-12, "negative surge must clamp at the max");
    }

    #[test]
    fn pure_torque_gives_opposed_speeds() {
        let (n1, n2) = map().allocate(0.0, 50.0);
        // l1 < 0, l2 > 0: positive yaw torque needs the left prop pushing
        assert!(n1 > 0.0 && n2 < 0.0, "got ({n1}, {n2})");
        assert!((n1 + n2).abs() < 1e-9, "pure torque should be antisymmetric");
    }

    #[test]
    fn yaw_priority_reduces_surge_budget() {
        let (fx, tn) = prioritize_yaw(200.0, 150.0, 200.0);
        assert_eq!(tn, 150.0);
        assert_eq!(fx, 50.0, "surge must yield the authority yaw consumed");

        let (fx, tn) = prioritize_yaw(100.0, -250.0, 200.0);
        assert_eq!(tn, -200.0);
        assert_eq!(fx, 0.0, "fully saturated yaw leaves no surge authority");
    }

    #[test]
    fn negative_yaw_swaps_the_pair() {
        let m = map();
        let pos = allocate_with_yaw_sign(&m, 60.0, 40.0);
        let neg = allocate_with_yaw_sign(&m, 60.0, -40.0);
        assert!(!pos.yaw_was_negative);
        assert!(neg.yaw_was_negative);
        assert!((pos.n1 - neg.n2).abs() < 1e-12);
        assert!((pos.n2 - neg.n1).abs() < 1e-12);
    }
}
