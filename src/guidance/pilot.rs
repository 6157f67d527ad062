use nalgebra::Vector2;

use crate::config::GuidanceConfig;
use crate::error::GncError;
use crate::gnc::allocation::{allocate_with_yaw_sign, prioritize_yaw, ControlAllocationMap};
use crate::gnc::pid::GuidancePid;
use crate::gnc::throttle::ThrottleInterpolator;
use crate::guidance::target::{Target, TargetFix, TargetTracker};
use crate::vessel::OtterParams;

// ---------------------------------------------------------------------------
// Guidance pipeline
// ---------------------------------------------------------------------------

/// Everything one control cycle commands, from the line-of-sight fix down to
/// thruster speeds and the calibrated force estimate for those speeds.
#[derive(Debug, Clone, Copy)]
pub struct CycleCommand {
    pub fix: TargetFix,
    /// Controller outputs after yaw-priority saturation.
    pub tau_x: f64,
    pub tau_n: f64,
    /// Allocated shaft speeds (rad/s).
    pub n1: f64,
    pub n2: f64,
    /// Calibration-table estimate of the force/torque those speeds really
    /// produce. This is what gets sent to a live vehicle.
    pub force_x_est: f64,
    pub torque_n_est: f64,
}

/// The full guidance chain shared by the simulated and live loops: target
/// tracking, the two-axis PID, yaw-priority saturation, control allocation
/// and the empirical throttle correction.
pub struct Pilot {
    tracker: TargetTracker,
    surge_pid: GuidancePid,
    yaw_pid: GuidancePid,
    allocation: ControlAllocationMap,
    interpolator: ThrottleInterpolator,
    config: GuidanceConfig,
}

impl Pilot {
    pub fn new(
        params: &OtterParams,
        target: Target,
        interpolator: ThrottleInterpolator,
        config: GuidanceConfig,
    ) -> Result<Self, GncError> {
        let allocation = ControlAllocationMap::new(
            params.k_pos,
            params.l1,
            params.l2,
            config.max_surge_force,
            config.max_yaw_torque,
        )?;
        let g = &config;
        let tracker = TargetTracker::new(target, g.capture_radius)?;
        Ok(Self {
            tracker,
            surge_pid: GuidancePid::new(
                g.surge_gains.kp,
                g.surge_gains.ki,
                g.surge_gains.kd,
                g.surge_integrator,
            ),
            yaw_pid: GuidancePid::new(
                g.yaw_gains.kp,
                g.yaw_gains.ki,
                g.yaw_gains.kd,
                g.yaw_integrator,
            ),
            allocation,
            interpolator,
            config,
        })
    }

    pub fn tracker(&self) -> &TargetTracker {
        &self.tracker
    }

    /// Run one guidance cycle: advance the target by `dt`, compute the fix
    /// from `position`/`yaw`, and turn it into actuator commands. `now` is
    /// the controller clock the PIDs difference against.
    pub fn cycle(&mut self, position: Vector2<f64>, yaw: f64, now: f64, dt: f64) -> CycleCommand {
        let fix = self.tracker.advance(position, dt);
        let radius = self.tracker.capture_radius();

        let tau_x = self
            .surge_pid
            .surge_force(radius, fix.distance, fix.bearing, yaw, now);
        let mut tau_n = self
            .yaw_pid
            .yaw_torque(fix.bearing, yaw, radius, fix.distance, now);

        // Inside the radius the bearing is meaningless noise; stop steering
        // unless explicitly told to keep facing the target
        if fix.distance < radius && !self.config.always_face_target {
            tau_n = 0.0;
        }

        let (tau_x, tau_n) = prioritize_yaw(tau_x, tau_n, self.config.max_force);
        let speeds = allocate_with_yaw_sign(&self.allocation, tau_x, tau_n);

        let (force_x_est, mut torque_n_est) =
            self.interpolator.estimate_forces(speeds.n1, speeds.n2);
        if speeds.yaw_was_negative {
            torque_n_est = -torque_n_est;
        }

        CycleCommand {
            fix,
            tau_x,
            tau_n,
            n1: speeds.n1,
            n2: speeds.n2,
            force_x_est,
            torque_n_est,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc::throttle::{ThrottleSample, ThrottleTable};

    fn interpolator() -> ThrottleInterpolator {
        let table = ThrottleTable::new(vec![
            ThrottleSample { speed_left: 0.0, speed_right: 0.0, force_x: 0.0, torque_n: 0.0 },
            ThrottleSample { speed_left: 40.0, speed_right: 40.0, force_x: 35.0, torque_n: 0.0 },
            ThrottleSample { speed_left: 40.0, speed_right: -40.0, force_x: 0.0, torque_n: 14.0 },
            ThrottleSample { speed_left: 80.0, speed_right: 80.0, force_x: 140.0, torque_n: 0.0 },
            ThrottleSample { speed_left: 80.0, speed_right: 40.0, force_x: 88.0, torque_n: 22.0 },
        ]);
        ThrottleInterpolator::new(table, 3).unwrap()
    }

    fn pilot(target: Target) -> Pilot {
        let params = OtterParams::new().unwrap();
        Pilot::new(&params, target, interpolator(), GuidanceConfig::default()).unwrap()
    }

    #[test]
    fn distant_target_ahead_commands_forward_thrust() {
        let mut p = pilot(Target::waypoints(vec![(100.0, 0.0)]));
        let cmd = p.cycle(Vector2::zeros(), 0.0, 0.0, 0.02);
        assert!(cmd.tau_x > 0.0, "target ahead needs positive surge");
        assert!(cmd.tau_n.abs() < 1e-9, "no heading error, no torque");
        assert!(cmd.n1 > 0.0 && cmd.n2 > 0.0);
    }

    #[test]
    fn steering_stops_inside_capture_radius() {
        let mut p = pilot(Target::waypoints(vec![(3.0, 1.0)]));
        let cmd = p.cycle(Vector2::zeros(), 0.0, 0.0, 0.02);
        assert!(cmd.fix.distance < 5.0);
        assert_eq!(cmd.tau_n, 0.0);
    }

    #[test]
    fn yaw_has_priority_over_surge() {
        // Target dead east: ~90 degrees of heading error saturates yaw
        let mut p = pilot(Target::waypoints(vec![(0.0, 1000.0)]));
        let cmd = p.cycle(Vector2::zeros(), 0.0, 0.0, 0.02);
        assert!(cmd.tau_n > 0.0);
        assert!(
            cmd.tau_x.abs() + cmd.tau_n.abs() <= 200.0 + 1e-9,
            "combined command exceeded the force budget: {} + {}",
            cmd.tau_x,
            cmd.tau_n
        );
    }

    #[test]
    fn negative_yaw_negates_the_estimated_torque() {
        // Target dead west: heading error -pi/2
        let mut p = pilot(Target::waypoints(vec![(0.0, -1000.0)]));
        let cmd = p.cycle(Vector2::zeros(), 0.0, 0.0, 0.02);
        assert!(cmd.tau_n < 0.0);
        assert!(
            cmd.torque_n_est <= 0.0,
            "estimate must carry the command sign, got {}",
            cmd.torque_n_est
        );
    }
}
