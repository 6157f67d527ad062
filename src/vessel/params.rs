use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};

use crate::dynamics::kinematics::{hmtrx, smtrx};
use crate::error::GncError;

// ---------------------------------------------------------------------------
// Otter USV physical parameters
// ---------------------------------------------------------------------------

/// Immutable physical constants of the vessel, computed once from hull
/// geometry and mass properties. The rigid-body + added-mass matrix `m` is
/// inverted at construction; a singular result is a fatal configuration
/// error, never a runtime condition.
#[derive(Debug, Clone)]
pub struct OtterParams {
    /// Combined system inertia matrix (rigid body + added mass).
    pub m: Matrix6<f64>,
    /// Precomputed inverse of `m`.
    pub m_inv: Matrix6<f64>,
    /// Hydrodynamic added mass.
    pub ma: Matrix6<f64>,
    /// Linear damping. Nonlinear yaw damping is added on top by the model.
    pub d: Matrix6<f64>,
    /// Hydrostatic restoring matrix.
    pub g_mat: Matrix6<f64>,
    /// CG-to-origin system transform.
    pub h_rg: Matrix6<f64>,
    /// Inertia dyadic about the CG, payload included.
    pub ig: Matrix3<f64>,
    /// Skew matrix of the payload position.
    pub s_rp: Matrix3<f64>,

    /// Total mass, hull + payload (kg).
    pub m_total: f64,
    /// Payload mass (kg).
    pub mp: f64,

    /// Lever arm, left propeller (m).
    pub l1: f64,
    /// Lever arm, right propeller (m).
    pub l2: f64,
    /// Positive bollard-pull coefficient, one propeller.
    pub k_pos: f64,
    /// Negative (reverse) bollard-pull coefficient, one propeller.
    pub k_neg: f64,
    /// Propeller speed saturation bounds (rad/s).
    pub n_min: f64,
    pub n_max: f64,
    /// Propeller first-order time constant (s).
    pub t_n: f64,

    /// Hull length (m).
    pub length: f64,
    /// Beam of one pontoon (m).
    pub b_pont: f64,
    /// Draft (m).
    pub draft: f64,
    /// Acceleration of gravity (m/s^2).
    pub gravity: f64,
}

impl OtterParams {
    /// Build the parameter set for the Otter USV with its standard 25 kg
    /// payload (Fossen 2021 parameterization).
    pub fn new() -> Result<Self, GncError> {
        let gravity = 9.81;
        let rho = 1026.0; // density of water (kg/m^3)

        let t_n = 1.0; // propeller time constant (s)
        let length = 2.0;
        let beam = 1.08;

        // Mass properties: hull + payload, CG corrected for the payload
        let m_hull = 55.0;
        let mp = 25.0;
        let m_total = m_hull + mp;
        let rp = Vector3::new(0.05, 0.0, -0.35); // payload location
        let rg_hull = Vector3::new(0.2, 0.0, -0.2);
        let rg = (m_hull * rg_hull + mp * rp) / m_total;

        let s_rg = smtrx(&rg);
        let h_rg = hmtrx(&rg);
        let s_rp = smtrx(&rp);

        // Radii of gyration
        let r44 = 0.4 * beam;
        let r55 = 0.25 * length;
        let r66 = 0.25 * length;
        let t_yaw = 1.0; // yaw time constant (s)
        let u_max = 6.0 * 0.5144; // 6 knots max forward speed

        // One pontoon
        let b_pont = 0.25;
        let y_pont = 0.395;
        let cw_pont = 0.75;
        let cb_pont = 0.4;

        // Volume displacement, draft, inertia dyadic
        let nabla = m_total / rho;
        let draft = nabla / (2.0 * cb_pont * b_pont * length);
        let ig_cg = m_hull * Matrix3::from_diagonal(&Vector3::new(r44 * r44, r55 * r55, r66 * r66));
        let ig = ig_cg - m_hull * s_rg * s_rg - mp * s_rp * s_rp;

        // Propeller data: lever arms and bollard-pull coefficients
        let l1 = -y_pont;
        let l2 = y_pont;
        let k_pos: f64 = 0.02216 / 2.0;
        let k_neg: f64 = 0.01289 / 2.0;
        let n_max = ((0.5 * 24.4 * gravity) / k_pos).sqrt();
        let n_min = -((0.5 * 13.6 * gravity) / k_neg).sqrt();

        // Rigid-body mass matrix about the CG, transformed to the body origin
        let mut mrb_cg = Matrix6::zeros();
        mrb_cg
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(m_total * Matrix3::identity()));
        mrb_cg.fixed_view_mut::<3, 3>(3, 3).copy_from(&ig);
        let mrb = h_rg.transpose() * mrb_cg * h_rg;

        // Hydrodynamic added mass derivatives
        let xudot = -0.1 * m_hull;
        let yvdot = -1.5 * m_hull;
        let zwdot = -1.0 * m_hull;
        let kpdot = -0.2 * ig[(0, 0)];
        let mqdot = -0.8 * ig[(1, 1)];
        let nrdot = -1.7 * ig[(2, 2)];
        let ma = -Matrix6::from_diagonal(&Vector6::new(xudot, yvdot, zwdot, kpdot, mqdot, nrdot));

        let m = mrb + ma;
        let m_inv = m.try_inverse().ok_or(GncError::SingularMassMatrix)?;

        // Hydrostatics: metacentric heights and spring stiffness
        let aw_pont = cw_pont * length * b_pont;
        let i_t = 2.0 * (1.0 / 12.0) * length * b_pont.powi(3)
            * (6.0 * cw_pont.powi(3) / ((1.0 + cw_pont) * (1.0 + 2.0 * cw_pont)))
            + 2.0 * aw_pont * y_pont * y_pont;
        let i_l = 0.8 * 2.0 * (1.0 / 12.0) * b_pont * length.powi(3);
        let kb = (1.0 / 3.0) * (5.0 * draft / 2.0 - 0.5 * nabla / (length * b_pont));
        let bm_t = i_t / nabla;
        let bm_l = i_l / nabla;
        let km_t = kb + bm_t;
        let km_l = kb + bm_l;
        let kg = draft - rg[2];
        let gm_t = km_t - kg;
        let gm_l = km_l - kg;

        let g33 = rho * gravity * (2.0 * aw_pont);
        let g44 = rho * gravity * nabla * gm_t;
        let g55 = rho * gravity * nabla * gm_l;
        let g_cf = Matrix6::from_diagonal(&Vector6::new(0.0, 0.0, g33, g44, g55, 0.0));
        let lcf = -0.2;
        let h_cf = hmtrx(&Vector3::new(lcf, 0.0, 0.0));
        let g_mat = h_cf.transpose() * g_cf * h_cf;

        // Natural frequencies in heave, roll, pitch
        let w3 = (g33 / m[(2, 2)]).sqrt();
        let w4 = (g44 / m[(3, 3)]).sqrt();
        let w5 = (g55 / m[(4, 4)]).sqrt();

        // Linear damping derivatives
        let xu = -24.4 * gravity / u_max; // from max speed
        let yv = 0.0;
        let zw = -2.0 * 0.3 * w3 * m[(2, 2)]; // relative damping ratios
        let kp = -2.0 * 0.2 * w4 * m[(3, 3)];
        let mq = -2.0 * 0.4 * w5 * m[(4, 4)];
        let nr = -m[(5, 5)] / t_yaw; // from the yaw time constant
        let d = -Matrix6::from_diagonal(&Vector6::new(xu, yv, zw, kp, mq, nr));

        Ok(Self {
            m,
            m_inv,
            ma,
            d,
            g_mat,
            h_rg,
            ig,
            s_rp,
            m_total,
            mp,
            l1,
            l2,
            k_pos,
            k_neg,
            n_min,
            n_max,
            t_n,
            length,
            b_pont,
            draft,
            gravity,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
