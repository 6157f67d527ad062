use crate::error::GncError;
use crate::gnc::kdtree::KdTree2;

/// Default neighbour count for the inverse-distance interpolation.
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Regularizes the inverse-distance weights so a query that coincides with a
/// stored sample never divides by zero.
const EPSILON: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Empirical thruster calibration table
// ---------------------------------------------------------------------------

/// One calibration measurement: a commanded shaft-speed pair and the surge
/// force / yaw torque the vessel actually produced.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleSample {
    /// Left/right shaft speeds (rad/s).
    pub speed_left: f64,
    pub speed_right: f64,
    /// Observed surge force (N) and yaw torque (N m).
    pub force_x: f64,
    pub torque_n: f64,
}

/// The full calibration dataset, loaded once at startup and read-only after.
#[derive(Debug, Clone)]
pub struct ThrottleTable {
    samples: Vec<ThrottleSample>,
}

impl ThrottleTable {
    pub fn new(samples: Vec<ThrottleSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[ThrottleSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// k-NN inverse-distance interpolation
// ---------------------------------------------------------------------------

/// Corrects the idealized square-root allocation law against measured
/// thruster behaviour, which deviates from the quadratic model especially
/// near zero and in reverse.
///
/// Two spatial indexes are kept: one over speed space (estimating the forces
/// a speed pair will really produce) and one over force space (the converse,
/// estimating the speed pair that produces desired forces — the mapping used
/// to drive real actuators).
#[derive(Debug, Clone)]
pub struct ThrottleInterpolator {
    table: ThrottleTable,
    speed_index: KdTree2,
    force_index: KdTree2,
    k: usize,
}

impl ThrottleInterpolator {
    /// `k` is validated here: asking for more neighbours than samples is a
    /// configuration fault that must abort startup.
    pub fn new(table: ThrottleTable, k: usize) -> Result<Self, GncError> {
        if k == 0 || k > table.len() {
            return Err(GncError::BadNeighborCount {
                k,
                samples: table.len(),
            });
        }
        let speed_points: Vec<([f64; 2], usize)> = table
            .samples()
            .iter()
            .enumerate()
            .map(|(i, s)| ([s.speed_left, s.speed_right], i))
            .collect();
        let force_points: Vec<([f64; 2], usize)> = table
            .samples()
            .iter()
            .enumerate()
            .map(|(i, s)| ([s.force_x, s.torque_n], i))
            .collect();
        Ok(Self {
            speed_index: KdTree2::build(&speed_points),
            force_index: KdTree2::build(&force_points),
            table,
            k,
        })
    }

    pub fn neighbors(&self) -> usize {
        self.k
    }

    /// Estimated (surge force, yaw torque) for a shaft-speed pair, from the
    /// k nearest calibration samples weighted by inverse distance.
    pub fn estimate_forces(&self, speed_left: f64, speed_right: f64) -> (f64, f64) {
        let hits = self.speed_index.nearest([speed_left, speed_right], self.k);
        self.weighted(&hits, |s| (s.force_x, s.torque_n))
    }

    /// Converse mapping: the shaft-speed pair expected to realize a desired
    /// (surge force, yaw torque).
    pub fn estimate_speeds(&self, force_x: f64, torque_n: f64) -> (f64, f64) {
        let hits = self.force_index.nearest([force_x, torque_n], self.k);
        self.weighted(&hits, |s| (s.speed_left, s.speed_right))
    }

    fn weighted<F>(&self, hits: &[crate::gnc::kdtree::Neighbor], value: F) -> (f64, f64)
    where
        F: Fn(&ThrottleSample) -> (f64, f64),
    {
        let mut total = 0.0;
        let mut a = 0.0;
        let mut b = 0.0;
        for hit in hits {
            let w = 1.0 / (hit.distance + EPSILON);
            let (va, vb) = value(&self.table.samples()[hit.payload]);
            total += w;
            a += w * va;
            b += w * vb;
        }
        (a / total, b / total)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ThrottleTable {
        // Coarse corner of a real-looking calibration grid
        ThrottleTable::new(vec![
            ThrottleSample { speed_left: 0.0, speed_right: 0.0, force_x: 0.0, torque_n: 0.0 },
            ThrottleSample { speed_left: 30.0, speed_right: 30.0, force_x: 20.0, torque_n: 0.0 },
            ThrottleSample { speed_left: 30.0, speed_right: -30.0, force_x: 0.0, torque_n: 8.0 },
            ThrottleSample { speed_left: 60.0, speed_right: 60.0, force_x: 78.0, torque_n: 0.0 },
            ThrottleSample { speed_left: 60.0, speed_right: 30.0, force_x: 49.0, torque_n: 11.0 },
        ])
    }

    #[test]
    fn oversized_k_is_a_configuration_fault() {
        let err = ThrottleInterpolator::new(table(), 6).unwrap_err();
        assert!(matches!(err, GncError::BadNeighborCount { k: 6, samples: 5 }));
        assert!(ThrottleInterpolator::new(table(), 0).is_err());
    }

    #[test]
    fn exact_sample_with_k1_returns_stored_forces() {
        let interp = ThrottleInterpolator::new(table(), 1).unwrap();
        let (fx, tn) = interp.estimate_forces(60.0, 30.0);
        // Epsilon regularization aside, an exact hit is the stored pair
        assert!((fx - 49.0).abs() < 1e-9, "got {fx}");
        assert!((tn - 11.0).abs() < 1e-9, "got {tn}");
    }

    #[test]
    fn interpolation_blends_neighbours() {
        let interp = ThrottleInterpolator::new(table(), DEFAULT_NEIGHBORS).unwrap();
        let (fx, _) = interp.estimate_forces(45.0, 45.0);
        // Between the (30,30) and (60,60) samples
        assert!(fx > 20.0 && fx < 78.0, "blend out of range: {fx}");
    }

    #[test]
    fn converse_query_recovers_speed_pair() {
        let interp = ThrottleInterpolator::new(table(), 1).unwrap();
        let (nl, nr) = interp.estimate_speeds(78.0, 0.0);
        assert!((nl - 60.0).abs() < 1e-9);
        assert!((nr - 60.0).abs() < 1e-9);
    }
}
