use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Geodetic to local NED
// ---------------------------------------------------------------------------

// WGS-84 ellipsoid
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Geodetic coordinates (degrees, metres) to earth-centred earth-fixed.
fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, height: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let e2 = FLATTENING * (2.0 - FLATTENING);

    // Prime-vertical radius of curvature
    let n = SEMI_MAJOR_AXIS / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();

    Vector3::new(
        (n + height) * lat.cos() * lon.cos(),
        (n + height) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + height) * lat.sin(),
    )
}

/// Express a geodetic fix in the local north-east-down frame anchored at the
/// observer origin: difference the two ECEF positions and rotate the offset
/// into the origin's tangent plane.
pub fn geodetic_to_ned(
    lat_deg: f64,
    lon_deg: f64,
    height: f64,
    origin_lat_deg: f64,
    origin_lon_deg: f64,
    origin_height: f64,
) -> Vector3<f64> {
    let delta = geodetic_to_ecef(lat_deg, lon_deg, height)
        - geodetic_to_ecef(origin_lat_deg, origin_lon_deg, origin_height);

    let lat0 = origin_lat_deg.to_radians();
    let lon0 = origin_lon_deg.to_radians();
    let (sin_lat, cos_lat) = lat0.sin_cos();
    let (sin_lon, cos_lon) = lon0.sin_cos();

    Vector3::new(
        -sin_lat * cos_lon * delta[0] - sin_lat * sin_lon * delta[1] + cos_lat * delta[2],
        -sin_lon * delta[0] + cos_lon * delta[1],
        -(cos_lat * cos_lon * delta[0] + cos_lat * sin_lon * delta[1] + sin_lat * delta[2]),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TRONDHEIM: (f64, f64) = (63.4384, 10.3576);

    #[test]
    fn zero_offset_maps_to_origin() {
        let ned = geodetic_to_ned(TRONDHEIM.0, TRONDHEIM.1, 0.0, TRONDHEIM.0, TRONDHEIM.1, 0.0);
        assert!(ned.norm() < 1e-9, "expected origin, got {ned}");
    }

    #[test]
    fn northward_degree_is_about_111_km() {
        let ned = geodetic_to_ned(
            TRONDHEIM.0 + 0.001,
            TRONDHEIM.1,
            0.0,
            TRONDHEIM.0,
            TRONDHEIM.1,
            0.0,
        );
        // A millidegree of latitude is ~111.4 m at this latitude
        assert!(ned[0] > 110.0 && ned[0] < 112.5, "north = {}", ned[0]);
        assert!(ned[1].abs() < 0.1, "east should be ~0, got {}", ned[1]);
    }

    #[test]
    fn eastward_offset_shrinks_with_latitude() {
        let at_63 = geodetic_to_ned(63.0, 10.001, 0.0, 63.0, 10.0, 0.0);
        let at_0 = geodetic_to_ned(0.0, 10.001, 0.0, 0.0, 10.0, 0.0);
        assert!(at_63[1] > 0.0);
        // cos(63 deg) ~ 0.454
        let ratio = at_63[1] / at_0[1];
        assert!((ratio - 63.0_f64.to_radians().cos()).abs() < 0.01, "ratio = {ratio}");
    }
}
