use std::io::{self, Write};
use std::path::Path;

use nalgebra::{Vector2, Vector6};

// ---------------------------------------------------------------------------
// Per-cycle log record
// ---------------------------------------------------------------------------

/// One control cycle's worth of log data. Appended once per cycle, ordered by
/// time, and published as the live-display snapshot.
#[derive(Debug, Clone)]
pub struct CycleSample {
    pub t: f64,
    pub eta: Vector6<f64>,
    pub nu: Vector6<f64>,
    pub bearing: f64,
    pub distance: f64,
    pub target: Vector2<f64>,
    /// Commanded surge force / yaw torque out of the guidance controllers.
    pub tau_x: f64,
    pub tau_n: f64,
    /// Commanded thruster shaft speeds (rad/s).
    pub n1: f64,
    pub n2: f64,
    /// Actual thruster shaft speeds (rad/s), lagging the command.
    pub u_actual: Vector2<f64>,
}

/// Append-only collection of cycle samples.
#[derive(Debug, Clone, Default)]
pub struct CycleLog {
    samples: Vec<CycleSample>,
}

impl CycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: CycleSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[CycleSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Write the log as semicolon-separated CSV. Semicolons avoid colliding
    /// with decimal points in locales that render them as commas.
    ///
    /// Columns: t; eta (6); nu (6); bearing; distance; target N/E; tau_X;
    /// tau_N; commanded n1/n2; actual n1/n2.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "t;north;east;down;roll;pitch;yaw;\
             surge;sway;heave;roll_rate;pitch_rate;yaw_rate;\
             bearing;distance;target_north;target_east;tau_x;tau_n;\
             n1;n2;n1_actual;n2_actual"
        )?;

        for s in &self.samples {
            writeln!(
                writer,
                "{:.3};{:.4};{:.4};{:.4};{:.6};{:.6};{:.6};\
                 {:.4};{:.4};{:.4};{:.6};{:.6};{:.6};\
                 {:.6};{:.4};{:.4};{:.4};{:.3};{:.3};{:.3};{:.3};{:.3};{:.3}",
                s.t,
                s.eta[0], s.eta[1], s.eta[2], s.eta[3], s.eta[4], s.eta[5],
                s.nu[0], s.nu[1], s.nu[2], s.nu[3], s.nu[4], s.nu[5],
                s.bearing, s.distance, s.target[0], s.target[1],
                s.tau_x, s.tau_n, s.n1, s.n2, s.u_actual[0], s.u_actual[1],
            )?;
        }

        Ok(())
    }

    /// Flush the log to a CSV file at the given path.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_csv(&mut file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
