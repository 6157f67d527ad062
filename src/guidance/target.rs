use nalgebra::Vector2;

use crate::error::GncError;

// ---------------------------------------------------------------------------
// Target geometry
// ---------------------------------------------------------------------------

/// The active target definition. All positions are north/east metres in the
/// local NED frame.
#[derive(Debug, Clone)]
pub enum Target {
    /// Ordered waypoint sequence. The index only ever advances and stops at
    /// the last waypoint.
    Waypoints { list: Vec<Vector2<f64>>, index: usize },
    /// A point advancing by `velocity * dt` every cycle. `schedule` optionally
    /// overrides the velocity from a given cycle count onward (scripted test
    /// trajectories); entries must be sorted by cycle.
    MovingPoint {
        position: Vector2<f64>,
        velocity: Vector2<f64>,
        schedule: Vec<(u64, Vector2<f64>)>,
    },
    /// A point running a circle at constant angular rate.
    Circle {
        center: Vector2<f64>,
        radius: f64,
        angular_rate: f64,
        phase: f64,
    },
}

impl Target {
    pub fn waypoints(points: Vec<(f64, f64)>) -> Self {
        Target::Waypoints {
            list: points.into_iter().map(|(n, e)| Vector2::new(n, e)).collect(),
            index: 0,
        }
    }

    pub fn moving_point(position: (f64, f64), velocity: (f64, f64)) -> Self {
        Target::MovingPoint {
            position: Vector2::new(position.0, position.1),
            velocity: Vector2::new(velocity.0, velocity.1),
            schedule: Vec::new(),
        }
    }

    pub fn circle(center: (f64, f64), radius: f64, angular_rate: f64) -> Self {
        Target::Circle {
            center: Vector2::new(center.0, center.1),
            radius,
            angular_rate,
            phase: 0.0,
        }
    }
}

/// Per-cycle line-of-sight output.
#[derive(Debug, Clone, Copy)]
pub struct TargetFix {
    /// Bearing from true north, positive toward east, (-pi, pi].
    pub bearing: f64,
    /// Horizontal distance to the target (m).
    pub distance: f64,
    /// The target position the fix was computed against.
    pub target: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// Target tracker
// ---------------------------------------------------------------------------

/// Owns the active target and produces the line-of-sight bearing and distance
/// each cycle.
#[derive(Debug, Clone)]
pub struct TargetTracker {
    target: Target,
    capture_radius: f64,
    cycle: u64,
    elapsed: f64,
}

impl TargetTracker {
    /// An empty waypoint list is a configuration fault caught here, so
    /// `advance` never has to index into nothing.
    pub fn new(target: Target, capture_radius: f64) -> Result<Self, GncError> {
        if matches!(&target, Target::Waypoints { list, .. } if list.is_empty()) {
            return Err(GncError::EmptyWaypointList);
        }
        Ok(Self {
            target,
            capture_radius,
            cycle: 0,
            elapsed: 0.0,
        })
    }

    pub fn capture_radius(&self) -> f64 {
        self.capture_radius
    }

    /// Current waypoint index, if the target is a waypoint list.
    pub fn waypoint_index(&self) -> Option<usize> {
        match &self.target {
            Target::Waypoints { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// True once a waypoint list has no further waypoint to advance to.
    pub fn on_final_waypoint(&self) -> bool {
        match &self.target {
            Target::Waypoints { list, index } => index + 1 >= list.len(),
            _ => false,
        }
    }

    /// Advance the target one control cycle and compute the line-of-sight
    /// fix from `position`.
    pub fn advance(&mut self, position: Vector2<f64>, dt: f64) -> TargetFix {
        self.cycle += 1;
        self.elapsed += dt;

        match &mut self.target {
            Target::Waypoints { list, index } => {
                let mut fix = line_of_sight(position, list[*index]);
                // Capture: advance and recompute against the new waypoint in
                // the same cycle; drains stacked waypoints too
                while fix.distance < self.capture_radius && *index + 1 < list.len() {
                    *index += 1;
                    fix = line_of_sight(position, list[*index]);
                }
                fix
            }
            Target::MovingPoint {
                position: target,
                velocity,
                schedule,
            } => {
                let mut v = *velocity;
                for (cycle, scheduled) in schedule.iter() {
                    if self.cycle >= *cycle {
                        v = *scheduled;
                    }
                }
                *target += v * dt;
                let fix = line_of_sight(position, *target);
                if fix.distance <= self.capture_radius {
                    // Freeze at zero inside the radius: no command chatter
                    TargetFix {
                        bearing: 0.0,
                        distance: 0.0,
                        target: *target,
                    }
                } else {
                    fix
                }
            }
            Target::Circle {
                center,
                radius,
                angular_rate,
                phase,
            } => {
                let theta = *phase + *angular_rate * self.elapsed;
                let target = *center + Vector2::new(*radius * theta.cos(), *radius * theta.sin());
                line_of_sight(position, target)
            }
        }
    }
}

/// Bearing/distance from `from` to `to`. Coincident points give (0, 0).
fn line_of_sight(from: Vector2<f64>, to: Vector2<f64>) -> TargetFix {
    let north_error = to[0] - from[0];
    let east_error = to[1] - from[1];
    let distance = (north_error * north_error + east_error * east_error).sqrt();
    let bearing = if distance == 0.0 {
        0.0
    } else {
        east_error.atan2(north_error)
    };
    TargetFix {
        bearing,
        distance,
        target: to,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
