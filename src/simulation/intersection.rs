use nalgebra::DMatrix;

use super::string_loop::{StringLoop, Vec3};
use crate::config::{INTERSECTION_THRESHOLD, MIN_LOOP_POINTS};

/// Full pairwise squared-distance matrix of a point cycle
pub fn squared_distances(points: &[Vec3]) -> DMatrix<f64> {
    let n = points.len();
    let mut dists = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (points[i] - points[j]).norm_squared();
            dists[(i, j)] = d;
            dists[(j, i)] = d;
        }
    }
    dists
}

/// Closest self-crossing `(i, j)` with `i < j` whose split keeps both arcs viable.
///
/// A pair qualifies when the points are within `INTERSECTION_THRESHOLD` and
/// at least `MIN_LOOP_POINTS` indices apart going either way round the
/// cycle. Ties resolve to the lexicographically lowest pair.
pub fn find_self_intersection(points: &[Vec3]) -> Option<(usize, usize)> {
    let n = points.len();
    if n < 2 * MIN_LOOP_POINTS {
        return None;
    }

    let dists = squared_distances(points);
    let threshold_sq = INTERSECTION_THRESHOLD * INTERSECTION_THRESHOLD;

    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..n {
        // j - i >= MIN and n - (j - i) >= MIN
        let first = i + MIN_LOOP_POINTS;
        let last = (i + n - MIN_LOOP_POINTS).min(n - 1);
        for j in first..=last {
            let d = dists[(i, j)];
            if d >= threshold_sq {
                continue;
            }
            match best {
                Some((_, _, best_d)) if d >= best_d => {}
                _ => best = Some((i, j, d)),
            }
        }
    }

    best.map(|(i, j, _)| (i, j))
}

/// Points and velocities of one arc cut out of a loop
#[derive(Clone, Debug)]
pub struct LoopArc {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

impl LoopArc {
    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }
}

/// Cut a loop at `i < j` into `[i..=j]` and `[j..n) ++ [0..=i]`.
///
/// Both arcs keep the crossing points, so each closes on itself by wrap.
pub fn split_arcs(lp: &StringLoop, i: usize, j: usize) -> (LoopArc, LoopArc) {
    debug_assert!(i < j && j < lp.len());

    let first = LoopArc {
        positions: lp.positions[i..=j].to_vec(),
        velocities: lp.velocities[i..=j].to_vec(),
    };

    let second = LoopArc {
        positions: lp.positions[j..]
            .iter()
            .chain(&lp.positions[..=i])
            .copied()
            .collect(),
        velocities: lp.velocities[j..]
            .iter()
            .chain(&lp.velocities[..=i])
            .copied()
            .collect(),
    };

    (first, second)
}
