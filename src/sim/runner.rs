use nalgebra::Vector2;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::dynamics::{VehicleDynamicsModel, VehicleState};
use crate::error::GncError;
use crate::guidance::Pilot;
use crate::io::{CycleLog, CycleSample};

// ---------------------------------------------------------------------------
// Simulated control loop
// ---------------------------------------------------------------------------

/// Outcome of a finished simulation run.
#[derive(Debug)]
pub struct SimulationReport {
    pub log: CycleLog,
    pub final_state: VehicleState,
    pub cycles_run: u64,
    /// True when the run stopped because the final waypoint was captured.
    pub captured_final: bool,
}

/// Closed-loop mission simulation: the guidance pipeline commands the
/// 6-DOF dynamics model at a fixed step, one cycle per integration step.
pub struct SimulationRunner {
    model: VehicleDynamicsModel,
    pilot: Pilot,
    config: SimConfig,
    state: VehicleState,
}

impl SimulationRunner {
    pub fn new(model: VehicleDynamicsModel, pilot: Pilot, config: SimConfig) -> Self {
        Self {
            model,
            pilot,
            config,
            state: VehicleState::at_rest(),
        }
    }

    /// Override the initial state before running.
    pub fn with_state(mut self, state: VehicleState) -> Self {
        self.state = state;
        self
    }

    /// Run to completion. Every cycle the state is checked for finiteness
    /// first; a diverged integration aborts the run with the offending time
    /// rather than logging garbage.
    pub fn run(mut self) -> Result<SimulationReport, GncError> {
        let dt = self.config.dt;
        let mut log = CycleLog::new();
        let mut captured_final = false;
        let mut cycles_run = 0;

        info!(cycles = self.config.cycles, dt, "starting simulation run");

        for cycle in 0..self.config.cycles {
            let t = cycle as f64 * dt;

            if !self.state.is_finite() {
                return Err(GncError::NumericDivergence { t });
            }

            let cmd = self
                .pilot
                .cycle(self.state.position_ne(), self.state.yaw(), t, dt);

            log.push(CycleSample {
                t,
                eta: self.state.eta,
                nu: self.state.nu,
                bearing: cmd.fix.bearing,
                distance: cmd.fix.distance,
                target: cmd.fix.target,
                tau_x: cmd.tau_x,
                tau_n: cmd.tau_n,
                n1: cmd.n1,
                n2: cmd.n2,
                u_actual: self.state.u_actual,
            });

            let u_command = Vector2::new(cmd.n1, cmd.n2);
            let (eta, nu, u_actual) = self.model.step(
                &self.state.eta,
                &self.state.nu,
                &self.state.u_actual,
                &u_command,
                dt,
            );
            self.state = VehicleState { eta, nu, u_actual };
            cycles_run = cycle + 1;

            if self.config.stop_at_final_waypoint
                && self.pilot.tracker().on_final_waypoint()
                && cmd.fix.distance < self.pilot.tracker().capture_radius()
            {
                debug!(t, "final waypoint captured");
                captured_final = true;
                break;
            }
        }

        info!(
            cycles_run,
            captured_final,
            north = self.state.eta[0],
            east = self.state.eta[1],
            "simulation finished"
        );

        Ok(SimulationReport {
            log,
            final_state: self.state,
            cycles_run,
            captured_final,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
