//! Arc-length reparameterization of closed loops.
//!
//! After a split the daughters inherit whatever spacing the parent had
//! around the cut, which can be badly non-uniform. The wave-equation
//! scaling assumes evenly spaced points, so every daughter is rebuilt on a
//! uniform arc-length grid before it is integrated again.

use super::string_loop::{StringLoop, Vec3};
use crate::config::{MAX_RESAMPLED_POINTS, MIN_LOOP_POINTS, TARGET_POINT_DENSITY};

/// Point count for a loop of the given length at the target density
pub fn target_point_count(arc_length: f64) -> usize {
    let by_density = if arc_length.is_finite() && arc_length > 0.0 {
        (arc_length / TARGET_POINT_DENSITY) as usize
    } else {
        0
    };
    by_density.clamp(MIN_LOOP_POINTS, MAX_RESAMPLED_POINTS)
}

/// Resample to the density-derived point count
pub fn resample_loop(lp: &StringLoop) -> StringLoop {
    resample_to(lp, target_point_count(lp.arc_length()))
}

/// Rebuild `lp` with `target` points evenly spaced in arc length.
///
/// Positions use a periodic cubic Hermite curve with Catmull-Rom tangents
/// over the normalized arc-length parameter; velocities are linearly
/// interpolated on the same parameter. Loops already at `target` points,
/// and degenerate loops with no length, come back unchanged.
pub fn resample_to(lp: &StringLoop, target: usize) -> StringLoop {
    let n = lp.len();
    if target == n || n < 2 || target == 0 {
        return lp.clone();
    }

    let lengths: Vec<f64> = (0..n)
        .map(|k| (lp.positions[(k + 1) % n] - lp.positions[k]).norm())
        .collect();
    let total: f64 = lengths.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return lp.clone();
    }

    // knots[k]: normalized arc length at point k; knots[n] closes the loop at 1
    let mut knots = Vec::with_capacity(n + 1);
    let mut acc = 0.0;
    knots.push(0.0);
    for len in &lengths {
        acc += len;
        knots.push(acc / total);
    }
    knots[n] = 1.0;

    // Knot value for any integer index, unrolled across periods
    let knot = |k: isize| -> f64 {
        let period = n as isize;
        knots[k.rem_euclid(period) as usize] + k.div_euclid(period) as f64
    };

    let tangent = |k: usize| -> Vec3 {
        let span = knot(k as isize + 1) - knot(k as isize - 1);
        if span > 0.0 {
            (lp.positions[(k + 1) % n] - lp.positions[(k + n - 1) % n]) / span
        } else {
            Vec3::zeros()
        }
    };

    let mut positions = Vec::with_capacity(target);
    let mut velocities = Vec::with_capacity(target);

    for m in 0..target {
        let t = m as f64 / target as f64;
        let k = knots[1..].partition_point(|&u| u <= t).min(n - 1);
        let next = (k + 1) % n;

        let h = knots[k + 1] - knots[k];
        let s = if h > 0.0 { (t - knots[k]) / h } else { 0.0 };

        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        positions.push(
            h00 * lp.positions[k]
                + h10 * h * tangent(k)
                + h01 * lp.positions[next]
                + h11 * h * tangent(next),
        );
        velocities.push(lp.velocities[k].lerp(&lp.velocities[next], s));
    }

    StringLoop::from_parts(positions, velocities, lp.color_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn circle_from_angles(angles: &[f64], radius: f64) -> StringLoop {
        let positions: Vec<Vec3> = angles
            .iter()
            .map(|t| Vec3::new(radius * t.cos(), radius * t.sin(), 0.0))
            .collect();
        let velocities = vec![Vec3::new(0.0, 0.0, 1.5); angles.len()];
        StringLoop::new(positions, velocities, 3).unwrap()
    }

    fn uniform_circle(n: usize, radius: f64) -> StringLoop {
        let angles: Vec<f64> = (0..n).map(|k| 2.0 * PI * k as f64 / n as f64).collect();
        circle_from_angles(&angles, radius)
    }

    #[test]
    fn test_target_point_count_bounds() {
        assert_eq!(target_point_count(0.0), MIN_LOOP_POINTS);
        assert_eq!(target_point_count(1.0), MIN_LOOP_POINTS);
        assert_eq!(target_point_count(30.2), 60);
        assert_eq!(target_point_count(1.0e6), MAX_RESAMPLED_POINTS);
        assert_eq!(target_point_count(f64::NAN), MIN_LOOP_POINTS);
    }

    #[test]
    fn test_resample_at_target_density_is_unchanged() {
        // Chord of 0.501 puts 60 points right at the target density
        let n = 60;
        let radius = 0.501 / (2.0 * (PI / n as f64).sin());
        let lp = uniform_circle(n, radius);
        assert_eq!(target_point_count(lp.arc_length()), n);

        let out = resample_loop(&lp);
        assert_eq!(out.len(), n);
        assert!((out.arc_length() - lp.arc_length()).abs() < 1e-9);
        assert_eq!(out.color_id, lp.color_id);
    }

    #[test]
    fn test_upsampling_stays_on_curve() {
        let lp = uniform_circle(40, 4.0);
        let out = resample_to(&lp, 120);
        assert_eq!(out.len(), 120);
        assert_eq!(out.velocities.len(), 120);
        for p in &out.positions {
            assert!((p.norm() - 4.0).abs() < 0.01, "point off circle: {}", p.norm());
        }
        let exact = 2.0 * PI * 4.0;
        assert!((out.arc_length() - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_uniform_spacing_after_resample() {
        // Bunched sampling: points crowd together on one side
        let n = 80;
        let angles: Vec<f64> = (0..n)
            .map(|k| {
                let u = k as f64 / n as f64;
                2.0 * PI * (u + 0.05 * (2.0 * PI * u).sin())
            })
            .collect();
        let lp = circle_from_angles(&angles, 5.0);
        let out = resample_to(&lp, 50);

        let m = out.len();
        let spacing: Vec<f64> = (0..m)
            .map(|k| (out.positions[(k + 1) % m] - out.positions[k]).norm())
            .collect();
        let max = spacing.iter().cloned().fold(f64::MIN, f64::max);
        let min = spacing.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max / min < 1.15, "spacing ratio {}", max / min);
    }

    #[test]
    fn test_constant_velocity_preserved() {
        let lp = uniform_circle(30, 2.0);
        let out = resample_to(&lp, 45);
        for v in &out.velocities {
            assert!((v - Vec3::new(0.0, 0.0, 1.5)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_loop_unchanged() {
        let lp = StringLoop::new(vec![Vec3::zeros(); 25], vec![Vec3::zeros(); 25], 0).unwrap();
        let out = resample_to(&lp, 40);
        assert_eq!(out, lp);
    }
}
