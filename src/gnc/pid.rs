use std::f64::consts::FRAC_PI_2;

use crate::dynamics::wrap_pi;

/// Distance margin beyond the capture radius inside which the yaw integral
/// is reset, preventing heading hunting once the vessel is near the target.
pub const YAW_RESET_MARGIN: f64 = 2.0;

// ---------------------------------------------------------------------------
// Guidance PID (one axis)
// ---------------------------------------------------------------------------

/// Stateful error-to-command controller with anti-windup and the
/// mode-dependent error shaping the guidance loop needs. Two independent
/// instances drive the surge and yaw axes.
///
/// Timestamps must be monotonically increasing; a non-positive elapsed time
/// (first call, or a clock anomaly) disables the integral and derivative
/// contributions for that cycle.
#[derive(Debug, Clone)]
pub struct GuidancePid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    integral: f64,
    prev_error: f64,
    prev_time: Option<f64>,
    /// Integrator clamp bounds [lo, hi].
    limits: (f64, f64),
}

impl GuidancePid {
    pub fn new(kp: f64, ki: f64, kd: f64, integrator_limits: (f64, f64)) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: 0.0,
            prev_time: None,
            limits: integrator_limits,
        }
    }

    /// Surge-axis controller: drives distance-to-target toward the capture
    /// radius.
    ///
    /// When the target lies behind the vessel (|yaw error| > pi/2) the error
    /// sign is inverted, permitting reverse thrust to re-approach. Inside the
    /// capture radius both the error and the integral are forced to zero on
    /// the same cycle, killing windup and command chatter at the target.
    pub fn surge_force(
        &mut self,
        capture_radius: f64,
        distance_to_target: f64,
        yaw_setpoint: f64,
        yaw_measured: f64,
        now: f64,
    ) -> f64 {
        let dt = self.elapsed(now);

        let mut error = distance_to_target - capture_radius;
        let yaw_error = wrap_pi(yaw_setpoint - yaw_measured);
        if yaw_error.abs() > FRAC_PI_2 {
            error = -error;
        }

        if distance_to_target - capture_radius < 0.0 {
            error = 0.0;
            self.integral = 0.0;
        } else if dt > 0.0 {
            self.integral += error * dt;
        }
        self.integral = self.integral.clamp(self.limits.0, self.limits.1);

        let derivative = if dt > 0.0 { (error - self.prev_error) / dt } else { 0.0 };
        self.prev_error = error;

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    /// Yaw-axis controller: drives the heading toward the line-of-sight
    /// bearing. The error is wrapped to (-pi, pi] so the vessel always turns
    /// the short way round.
    pub fn yaw_torque(
        &mut self,
        yaw_setpoint: f64,
        yaw_measured: f64,
        capture_radius: f64,
        distance_to_target: f64,
        now: f64,
    ) -> f64 {
        let dt = self.elapsed(now);

        let error = wrap_pi(yaw_setpoint - yaw_measured);

        // Near the target the integral is reset to stop yaw hunting. The
        // reset precedes this cycle's accumulation, so one step of error
        // survives the reset while within the margin.
        if distance_to_target - (capture_radius + YAW_RESET_MARGIN) < 0.0 {
            self.integral = 0.0;
        }
        if dt > 0.0 {
            self.integral += error * dt;
        }
        self.integral = self.integral.clamp(self.limits.0, self.limits.1);

        let derivative = if dt > 0.0 { (error - self.prev_error) / dt } else { 0.0 };
        self.prev_error = error;

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    /// Current integral accumulator (diagnostics and tests).
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_time = None;
    }

    /// Elapsed time since the previous call, clamped at zero so a clock
    /// anomaly can never produce a negative dt.
    fn elapsed(&mut self, now: f64) -> f64 {
        let dt = match self.prev_time {
            Some(prev) => (now - prev).max(0.0),
            None => 0.0,
        };
        self.prev_time = Some(now);
        dt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn surge_is_proportional_on_first_call() {
        let mut pid = GuidancePid::new(2.0, 0.0, 0.0, (0.0, 5.0));
        let out = pid.surge_force(5.0, 105.0, 0.0, 0.0, 0.0);
        assert!((out - 200.0).abs() < 1e-9, "Kp * (d - r) expected, got {out}");
    }

    #[test]
    fn surge_reverses_when_target_is_behind() {
        let mut pid = GuidancePid::new(1.0, 0.0, 0.0, (0.0, 5.0));
        // Target dead astern: yaw error ~ pi
        let out = pid.surge_force(5.0, 50.0, PI, 0.0, 0.0);
        assert!(out < 0.0, "reverse thrust expected, got {out}");
    }

    #[test]
    fn surge_zeroes_error_and_integral_inside_radius() {
        let mut pid = GuidancePid::new(1.0, 1.0, 0.0, (0.0, 5.0));
        pid.surge_force(5.0, 50.0, 0.0, 0.0, 0.0);
        pid.surge_force(5.0, 50.0, 0.0, 0.0, 1.0);
        assert!(pid.integral() > 0.0, "integral should have accumulated");
        // Same cycle the vessel enters the radius, both must be exactly zero
        let out = pid.surge_force(5.0, 3.0, 0.0, 0.0, 2.0);
        assert_eq!(pid.integral(), 0.0);
        // kd = 0, so a zero error and zero integral give zero output
        assert_eq!(out, 0.0);
    }

    #[test]
    fn integral_respects_clamp_bounds() {
        let mut pid = GuidancePid::new(0.0, 1.0, 0.0, (0.0, 5.0));
        // Pathological step input held for a long time
        for i in 0..1000 {
            pid.surge_force(5.0, 1000.0, 0.0, 0.0, i as f64);
            assert!(pid.integral() <= 5.0, "integral exceeded clamp");
            assert!(pid.integral() >= 0.0);
        }
    }

    #[test]
    fn yaw_error_wraps_the_short_way() {
        let mut pid = GuidancePid::new(1.0, 0.0, 0.0, (-30.0, 30.0));
        // setpoint pi, measured -pi: same heading, error ~0 not ~2pi
        let out = pid.yaw_torque(PI, -PI, 5.0, 100.0, 0.0);
        assert!(out.abs() < 1e-9, "expected ~0, got {out}");
    }

    #[test]
    fn yaw_integral_resets_near_target() {
        let mut pid = GuidancePid::new(0.0, 1.0, 0.0, (-30.0, 30.0));
        pid.yaw_torque(1.0, 0.0, 5.0, 100.0, 0.0);
        pid.yaw_torque(1.0, 0.0, 5.0, 100.0, 1.0);
        pid.yaw_torque(1.0, 0.0, 5.0, 100.0, 2.0);
        assert!((pid.integral() - 2.0).abs() < 1e-12, "far away, windup accumulates");
        // Within capture radius + margin the reset runs first, then the
        // cycle accumulates, leaving exactly one error * dt step
        pid.yaw_torque(1.0, 0.0, 5.0, 6.5, 3.0);
        assert!(
            (pid.integral() - 1.0).abs() < 1e-12,
            "expected the reset to drop the history, got {}",
            pid.integral()
        );
    }

    #[test]
    fn clock_anomaly_is_treated_as_zero_elapsed() {
        let mut pid = GuidancePid::new(1.0, 1.0, 1.0, (0.0, 5.0));
        pid.surge_force(5.0, 50.0, 0.0, 0.0, 10.0);
        // Time going backwards must not explode the derivative or integral
        let out = pid.surge_force(5.0, 50.0, 0.0, 0.0, 9.0);
        assert!(out.is_finite());
        assert!((out - (45.0 + pid.integral())).abs() < 1e-9);
    }
}
