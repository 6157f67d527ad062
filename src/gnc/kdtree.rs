// ---------------------------------------------------------------------------
// Static 2-D k-d tree for calibration-sample lookup
// ---------------------------------------------------------------------------
//
// The throttle map holds a few hundred samples at most, built once at startup
// and queried read-only, so a compact median-split tree over owned nodes is
// all the spatial index this needs.

#[derive(Debug, Clone)]
struct Node {
    point: [f64; 2],
    /// Index into the caller's sample storage.
    payload: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct KdTree2 {
    nodes: Vec<Node>,
    root: Option<usize>,
}

/// One k-nearest-neighbour hit: Euclidean distance and the sample's payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f64,
    pub payload: usize,
}

impl KdTree2 {
    /// Build from (point, payload) pairs by recursive median split.
    pub fn build(points: &[([f64; 2], usize)]) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        let mut items: Vec<([f64; 2], usize)> = points.to_vec();
        tree.root = tree.build_recursive(&mut items, 0);
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn build_recursive(&mut self, items: &mut [([f64; 2], usize)], depth: usize) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let axis = depth % 2;
        items.sort_by(|a, b| a.0[axis].total_cmp(&b.0[axis]));
        let mid = items.len() / 2;

        let idx = self.nodes.len();
        self.nodes.push(Node {
            point: items[mid].0,
            payload: items[mid].1,
            axis,
            left: None,
            right: None,
        });

        let (lo, rest) = items.split_at_mut(mid);
        let hi = &mut rest[1..];
        let left = self.build_recursive(lo, depth + 1);
        let right = self.build_recursive(hi, depth + 1);
        self.nodes[idx].left = left;
        self.nodes[idx].right = right;
        Some(idx)
    }

    /// The k nearest samples to `query`, ascending by distance. Returns fewer
    /// than k only when the tree holds fewer than k points.
    pub fn nearest(&self, query: [f64; 2], k: usize) -> Vec<Neighbor> {
        let mut best: Vec<Neighbor> = Vec::with_capacity(k + 1);
        if k > 0 {
            self.search(self.root, query, k, &mut best);
        }
        best
    }

    fn search(&self, node: Option<usize>, query: [f64; 2], k: usize, best: &mut Vec<Neighbor>) {
        let Some(idx) = node else { return };
        let n = &self.nodes[idx];

        let dx = n.point[0] - query[0];
        let dy = n.point[1] - query[1];
        let dist = (dx * dx + dy * dy).sqrt();
        insert_sorted(best, Neighbor { distance: dist, payload: n.payload }, k);

        let delta = query[n.axis] - n.point[n.axis];
        let (near, far) = if delta < 0.0 {
            (n.left, n.right)
        } else {
            (n.right, n.left)
        };

        self.search(near, query, k, best);

        // The far side can only matter if the splitting plane is closer than
        // the current worst hit (or the candidate list is not full yet)
        let worst = best.last().map(|b| b.distance).unwrap_or(f64::INFINITY);
        if best.len() < k || delta.abs() < worst {
            self.search(far, query, k, best);
        }
    }
}

fn insert_sorted(best: &mut Vec<Neighbor>, hit: Neighbor, k: usize) {
    let pos = best
        .iter()
        .position(|b| hit.distance < b.distance)
        .unwrap_or(best.len());
    best.insert(pos, hit);
    if best.len() > k {
        best.pop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_tree() -> (KdTree2, Vec<[f64; 2]>) {
        let mut pts = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                pts.push([i as f64, j as f64]);
            }
        }
        let indexed: Vec<([f64; 2], usize)> =
            pts.iter().enumerate().map(|(i, p)| (*p, i)).collect();
        (KdTree2::build(&indexed), pts)
    }

    fn brute_force(pts: &[[f64; 2]], q: [f64; 2], k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..pts.len()).collect();
        order.sort_by(|&a, &b| {
            let da = (pts[a][0] - q[0]).hypot(pts[a][1] - q[1]);
            let db = (pts[b][0] - q[0]).hypot(pts[b][1] - q[1]);
            da.total_cmp(&db)
        });
        order.truncate(k);
        order
    }

    #[test]
    fn exact_hit_has_zero_distance() {
        let (tree, _) = grid_tree();
        let hits = tree.nearest([3.0, 7.0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn matches_brute_force_distances() {
        let (tree, pts) = grid_tree();
        for q in [[0.2, 0.3], [4.5, 4.5], [9.9, 0.1], [-3.0, 12.0]] {
            let hits = tree.nearest(q, 3);
            let expect = brute_force(&pts, q, 3);
            assert_eq!(hits.len(), 3);
            for (h, e) in hits.iter().zip(expect.iter()) {
                let de = (pts[*e][0] - q[0]).hypot(pts[*e][1] - q[1]);
                assert!(
                    (h.distance - de).abs() < 1e-12,
                    "kd distance {} vs brute {de} at {q:?}",
                    h.distance
                );
            }
        }
    }

    #[test]
    fn results_are_sorted_ascending() {
        let (tree, _) = grid_tree();
        let hits = tree.nearest([5.3, 2.8], 5);
        for w in hits.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
    }

    #[test]
    fn small_tree_returns_what_it_has() {
        let tree = KdTree2::build(&[([1.0, 1.0], 0)]);
        let hits = tree.nearest([0.0, 0.0], 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload, 0);
    }
}
