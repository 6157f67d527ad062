use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};

// ---------------------------------------------------------------------------
// Marine-craft kinematic and hydrodynamic helper matrices (Fossen 2021)
// ---------------------------------------------------------------------------

/// Skew-symmetric cross-product matrix: smtrx(a) * b == a x b.
pub fn smtrx(a: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -a.z, a.y, //
        a.z, 0.0, -a.x, //
        -a.y, a.x, 0.0,
    )
}

/// 6x6 system transformation from the centre of gravity to the body origin:
/// H(r) = [I3, S(r)^T; 0, I3].
pub fn hmtrx(r: &Vector3<f64>) -> Matrix6<f64> {
    let mut h = Matrix6::identity();
    h.fixed_view_mut::<3, 3>(0, 3).copy_from(&smtrx(r).transpose());
    h
}

/// Euler-angle rotation matrix (zyx convention), body frame to NED.
pub fn rzyx(phi: f64, theta: f64, psi: f64) -> Matrix3<f64> {
    let (sphi, cphi) = phi.sin_cos();
    let (sth, cth) = theta.sin_cos();
    let (spsi, cpsi) = psi.sin_cos();

    Matrix3::new(
        cpsi * cth,
        -spsi * cphi + cpsi * sth * sphi,
        spsi * sphi + cpsi * cphi * sth,
        spsi * cth,
        cpsi * cphi + sphi * sth * spsi,
        -cpsi * sphi + sth * spsi * cphi,
        -sth,
        cth * sphi,
        cth * cphi,
    )
}

/// Attitude transformation matrix relating body angular rates to Euler angle
/// rates. Singular at theta = +-pi/2; surface vessels never get there.
pub fn tzyx(phi: f64, theta: f64) -> Matrix3<f64> {
    let (sphi, cphi) = phi.sin_cos();
    let cth = theta.cos();
    let tth = theta.tan();

    Matrix3::new(
        1.0,
        sphi * tth,
        cphi * tth,
        0.0,
        cphi,
        -sphi,
        0.0,
        sphi / cth,
        cphi / cth,
    )
}

/// Coriolis-centripetal matrix from a (symmetrized) 6x6 mass matrix and a
/// velocity vector, C(nu) such that C*nu captures the rotational coupling.
pub fn m2c(m: &Matrix6<f64>, nu: &Vector6<f64>) -> Matrix6<f64> {
    let msym = 0.5 * (m + m.transpose());

    let m11 = msym.fixed_view::<3, 3>(0, 0).into_owned();
    let m12 = msym.fixed_view::<3, 3>(0, 3).into_owned();
    let m21 = msym.fixed_view::<3, 3>(3, 0).into_owned();
    let m22 = msym.fixed_view::<3, 3>(3, 3).into_owned();

    let nu1 = nu.fixed_rows::<3>(0).into_owned();
    let nu2 = nu.fixed_rows::<3>(3).into_owned();

    let dt_dnu1 = m11 * nu1 + m12 * nu2;
    let dt_dnu2 = m21 * nu1 + m22 * nu2;

    let s1 = smtrx(&dt_dnu1);
    let s2 = smtrx(&dt_dnu2);

    let mut c = Matrix6::zeros();
    c.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-s1));
    c.fixed_view_mut::<3, 3>(3, 0).copy_from(&(-s1));
    c.fixed_view_mut::<3, 3>(3, 3).copy_from(&(-s2));
    c
}

/// Hoerner's 2-D cross-flow drag coefficient as a function of beam/draft
/// ratio, tabulated from experimental data.
pub fn hoerner(beam: f64, draft: f64) -> f64 {
    const RATIO: [f64; 22] = [
        0.0109, 0.1766, 0.3530, 0.4519, 0.4728, 0.4929, 0.4933, 0.5585, 0.6464, 0.8336, 0.9880,
        1.3081, 1.6392, 1.8600, 2.3129, 2.9554, 3.4750, 3.7113, 4.2515, 4.7656, 5.1348, 5.2157,
    ];
    const CY_2D: [f64; 22] = [
        1.9661, 1.9657, 1.8976, 1.7872, 1.5837, 1.2786, 1.2108, 1.0836, 0.9986, 0.8796, 0.8284,
        0.7599, 0.6914, 0.6571, 0.6307, 0.5962, 0.5868, 0.5859, 0.5599, 0.5593, 0.5682, 0.5579,
    ];

    interp(beam / (2.0 * draft), &RATIO, &CY_2D)
}

/// Piecewise-linear table lookup, clamped at both ends.
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }
    for i in 1..xs.len() {
        if x <= xs[i] {
            let frac = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
            return ys[i - 1] + frac * (ys[i] - ys[i - 1]);
        }
    }
    ys[ys.len() - 1]
}

/// Cross-flow drag force/moment from strip theory: integrates the quadratic
/// sway drag along the hull. Returns a 6-DOF generalized force (sway force
/// and yaw moment populated).
pub fn cross_flow_drag(length: f64, beam_pontoon: f64, draft: f64, nu_r: &Vector6<f64>) -> Vector6<f64> {
    const RHO: f64 = 1026.0; // water density (kg/m^3)
    const STRIPS: usize = 20;

    let cd_2d = hoerner(beam_pontoon, draft);
    let dx = length / STRIPS as f64;
    let v_r = nu_r[1];
    let r = nu_r[5];

    let mut y_h = 0.0;
    let mut n_h = 0.0;
    let mut x_l = -length / 2.0;

    for _ in 0..=STRIPS {
        let u_cf = (v_r + x_l * r).abs() * (v_r + x_l * r);
        y_h -= 0.5 * RHO * draft * cd_2d * u_cf * dx;
        n_h -= 0.5 * RHO * draft * cd_2d * x_l * u_cf * dx;
        x_l += dx;
    }

    Vector6::new(0.0, y_h, 0.0, 0.0, 0.0, n_h)
}

/// Forward-Euler attitude/position kinematics: integrates eta one step using
/// the body-rate to inertial-rate transform built from the current attitude.
pub fn attitude_euler(eta: &Vector6<f64>, nu: &Vector6<f64>, dt: f64) -> Vector6<f64> {
    let p_dot = rzyx(eta[3], eta[4], eta[5]) * nu.fixed_rows::<3>(0).into_owned();
    let v_dot = tzyx(eta[3], eta[4]) * nu.fixed_rows::<3>(3).into_owned();

    let mut next = *eta;
    for i in 0..3 {
        next[i] += dt * p_dot[i];
        next[i + 3] += dt * v_dot[i];
    }
    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn smtrx_is_cross_product() {
        let a = Vector3::new(1.0, -2.0, 3.0);
        let b = Vector3::new(0.5, 4.0, -1.0);
        let cross = a.cross(&b);
        let via_matrix = smtrx(&a) * b;
        assert_relative_eq!(cross, via_matrix, epsilon = 1e-12);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let r = rzyx(0.3, -0.2, 1.1);
        let should_be_identity = r * r.transpose();
        assert_relative_eq!(should_be_identity, Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn coriolis_does_no_work() {
        // For symmetric M, nu' * C(nu) * nu == 0: Coriolis forces never add energy
        let m = Matrix6::from_diagonal(&Vector6::new(80.0, 120.0, 100.0, 10.0, 15.0, 20.0));
        let nu = Vector6::new(1.2, -0.4, 0.1, 0.05, -0.02, 0.3);
        let power = nu.dot(&(m2c(&m, &nu) * nu));
        assert!(power.abs() < 1e-9, "Coriolis power should vanish, got {power}");
    }

    #[test]
    fn hoerner_clamps_outside_table() {
        assert_relative_eq!(hoerner(0.0001, 1.0), 1.9661, epsilon = 1e-6);
        assert_relative_eq!(hoerner(100.0, 1.0), 0.5579, epsilon = 1e-6);
    }

    #[test]
    fn crossflow_opposes_sway() {
        let mut nu_r = Vector6::zeros();
        nu_r[1] = 1.0; // positive sway
        let tau = cross_flow_drag(2.0, 0.25, 0.2, &nu_r);
        assert!(tau[1] < 0.0, "drag must oppose sway velocity");
    }

    #[test]
    fn attitude_euler_advances_north_when_surging() {
        let eta = Vector6::zeros();
        let mut nu = Vector6::zeros();
        nu[0] = 2.0; // pure surge, zero heading -> due north
        let next = attitude_euler(&eta, &nu, 0.1);
        assert_relative_eq!(next[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(next[1], 0.0, epsilon = 1e-12);
    }
}
