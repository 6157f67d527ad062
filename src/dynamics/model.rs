use nalgebra::{Matrix6, Vector2, Vector3, Vector6};

use crate::dynamics::kinematics::{attitude_euler, cross_flow_drag, m2c, rzyx, smtrx};
use crate::vessel::OtterParams;

// ---------------------------------------------------------------------------
// 6-DOF nonlinear vessel dynamics
// ---------------------------------------------------------------------------

/// Integrates the coupled nonlinear equations of motion of the twin-thruster
/// vessel with explicit (forward) Euler. Used only when no live vehicle is
/// attached.
///
/// Stability is the caller's responsibility via choice of `dt`: steps far
/// above ~0.02 s risk divergence, which the control loop detects through the
/// per-cycle finite-value check rather than silently correcting.
#[derive(Debug, Clone)]
pub struct VehicleDynamicsModel {
    params: OtterParams,
    /// Ocean current speed (m/s) and direction (rad, NED).
    current_speed: f64,
    current_direction: f64,
}

impl VehicleDynamicsModel {
    pub fn new(params: OtterParams, current_speed: f64, current_direction: f64) -> Self {
        Self {
            params,
            current_speed,
            current_direction,
        }
    }

    pub fn params(&self) -> &OtterParams {
        &self.params
    }

    /// Advance the vessel one step of `dt` seconds.
    ///
    /// Forces and moments:
    ///   1. Propeller thrust (quadratic law, sign-dependent bollard
    ///      coefficient, speed saturation) with lever-arm yaw moment
    ///   2. Rigid-body + added-mass Coriolis/centripetal terms
    ///   3. Linear damping plus nonlinear yaw damping correction
    ///   4. Cross-flow drag (strip theory)
    ///   5. Hydrostatic restoring from current attitude
    ///   6. Payload gravity expressed in the body frame
    ///
    /// Propeller speeds follow a first-order lag toward `u_command`.
    pub fn step(
        &self,
        eta: &Vector6<f64>,
        nu: &Vector6<f64>,
        u_actual: &Vector2<f64>,
        u_command: &Vector2<f64>,
        dt: f64,
    ) -> (Vector6<f64>, Vector6<f64>, Vector2<f64>) {
        let p = &self.params;

        // Ocean current in the body-fixed frame
        let u_c = self.current_speed * (self.current_direction - eta[5]).cos();
        let v_c = self.current_speed * (self.current_direction - eta[5]).sin();
        let nu_c = Vector6::new(u_c, v_c, 0.0, 0.0, 0.0, 0.0);
        let dnu_c = Vector6::new(nu[5] * v_c, -nu[5] * u_c, 0.0, 0.0, 0.0, 0.0);
        let nu_r = nu - nu_c; // velocity relative to the water

        // Rigid-body Coriolis about the CG, transformed to the body origin
        let nu2 = nu.fixed_rows::<3>(3).into_owned();
        let mut crb_cg = Matrix6::zeros();
        crb_cg
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(p.m_total * smtrx(&nu2)));
        crb_cg
            .fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(-smtrx(&(p.ig * nu2))));
        let crb = p.h_rg.transpose() * crb_cg * p.h_rg;

        // Added-mass Coriolis; the Munk moment in yaw is neglected (would
        // otherwise have to be balanced by extra nonlinear damping)
        let mut ca = m2c(&p.ma, &nu_r);
        ca[(5, 0)] = 0.0;
        ca[(5, 1)] = 0.0;
        ca[(0, 5)] = 0.0;
        ca[(1, 5)] = 0.0;
        let c = crb + ca;

        // Payload force and moment expressed in BODY
        let r = rzyx(eta[3], eta[4], eta[5]);
        let f_payload = r.transpose() * Vector3::new(0.0, 0.0, p.mp * p.gravity);
        let m_payload = p.s_rp * f_payload;
        let g_0 = Vector6::new(
            f_payload[0], f_payload[1], f_payload[2], m_payload[0], m_payload[1], m_payload[2],
        );

        // Propeller thrust with speed saturation and sign-dependent bollard
        let mut n = *u_actual;
        let mut thrust = Vector2::zeros();
        for i in 0..2 {
            n[i] = n[i].clamp(p.n_min, p.n_max);
            let k = if n[i] > 0.0 { p.k_pos } else { p.k_neg };
            thrust[i] = k * n[i] * n[i].abs();
        }

        let tau = Vector6::new(
            thrust[0] + thrust[1],
            0.0,
            0.0,
            0.0,
            0.0,
            -p.l1 * thrust[0] - p.l2 * thrust[1],
        );

        // Linear damping plus the nonlinear yaw damping correction
        let mut tau_damp = -(p.d * nu_r);
        tau_damp[5] -= 10.0 * p.d[(5, 5)] * nu_r[5].abs() * nu_r[5];

        let tau_crossflow = cross_flow_drag(p.length, p.b_pont, p.draft, &nu_r);

        let sum_tau = tau + tau_damp + tau_crossflow - c * nu_r - p.g_mat * eta + g_0;

        // nu_dot = M^-1 * (sum of forces); propellers lag their command
        let nu_dot = dnu_c + p.m_inv * sum_tau;
        let n_dot = (u_command - n) / p.t_n;

        // Forward Euler [k+1]
        let nu_next = nu + dt * nu_dot;
        let n_next = n + dt * n_dot;
        let eta_next = attitude_euler(eta, &nu_next, dt);

        (eta_next, nu_next, n_next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
