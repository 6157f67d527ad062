// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------
//
// Everything tunable is collected here, constructed once at startup and
// passed into the control loop by reference. None of it mutates after that.

/// PID gains for one guidance axis.
#[derive(Debug, Clone, Copy)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Guidance and actuation tuning shared by the simulated and live loops.
#[derive(Debug, Clone)]
pub struct GuidanceConfig {
    pub surge_gains: PidGains,
    pub yaw_gains: PidGains,
    /// Integrator clamp bounds [lo, hi] per axis.
    pub surge_integrator: (f64, f64),
    pub yaw_integrator: (f64, f64),
    /// Distance below which a target counts as reached (m).
    pub capture_radius: f64,
    /// Total force budget for the yaw-priority saturation (N).
    pub max_force: f64,
    /// Allocator saturation magnitudes.
    pub max_surge_force: f64,
    pub max_yaw_torque: f64,
    /// Neighbour count for the throttle-map interpolation.
    pub neighbors: usize,
    /// Keep steering at the target centre even inside the capture radius.
    /// Causes instability right at the target, so off by default.
    pub always_face_target: bool,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            surge_gains: PidGains { kp: 8.0, ki: 2.0, kd: 5.0 },
            // The yaw axis works in radians; kp ~ 60 gives full torque
            // authority around 40 degrees of heading error
            yaw_gains: PidGains { kp: 60.0, ki: 0.0, kd: 0.0 },
            surge_integrator: (0.0, 5.0),
            yaw_integrator: (-30.0, 30.0),
            capture_radius: 5.0,
            max_force: 200.0,
            max_surge_force: 200.0,
            max_yaw_torque: 115.0,
            neighbors: 3,
            always_face_target: false,
        }
    }
}

/// Simulated-mode settings.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of control cycles to run.
    pub cycles: u64,
    /// Integration/control step (s). Values far above ~0.02 risk divergence
    /// of the explicit Euler integration.
    pub dt: f64,
    /// Stop early once the final waypoint is captured.
    pub stop_at_final_waypoint: bool,
    /// Ocean current speed (m/s) and direction (rad).
    pub current_speed: f64,
    pub current_direction: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cycles: 100_000,
            dt: 0.02,
            stop_at_final_waypoint: false,
            current_speed: 0.0,
            current_direction: 0.0,
        }
    }
}

/// Live-mode settings.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Control cycle period (s).
    pub cycle_period: f64,
    /// Bounded telemetry read timeout (s); no frame inside it just means
    /// "no update this cycle".
    pub telemetry_timeout: f64,
    /// Send the two spaced low-force wake-up commands before tracking starts.
    pub startup_nudge: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            cycle_period: 0.1,
            telemetry_timeout: 0.1,
            startup_nudge: true,
        }
    }
}
