use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::config::INITIAL_LOOP_RADIUS;
use crate::error::EngineError;

pub type Vec3 = Vector3<f64>;

/// One closed discretized string.
///
/// Points form a cycle: the last point connects back to the first.
/// `positions` and `velocities` always have the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct StringLoop {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) velocities: Vec<Vec3>,
    /// Identity tag, never reused within a run
    pub(crate) color_id: u32,
}

impl StringLoop {
    /// Build a loop from parallel point and velocity lists
    pub fn new(
        positions: Vec<Vec3>,
        velocities: Vec<Vec3>,
        color_id: u32,
    ) -> Result<Self, EngineError> {
        if positions.len() != velocities.len() {
            return Err(EngineError::InvalidConfig(format!(
                "loop has {} positions but {} velocities",
                positions.len(),
                velocities.len()
            )));
        }
        Ok(Self::from_parts(positions, velocities, color_id))
    }

    /// Unchecked constructor for lists built in lockstep
    pub(crate) fn from_parts(positions: Vec<Vec3>, velocities: Vec<Vec3>, color_id: u32) -> Self {
        debug_assert_eq!(positions.len(), velocities.len());
        Self {
            positions,
            velocities,
            color_id,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn color_id(&self) -> u32 {
        self.color_id
    }

    /// Perturbed circle with traveling-wave velocities.
    ///
    /// The mode-2 out-of-plane and radial terms fold the loop into a
    /// figure-8, and the velocity field is phase shifted from the shape so
    /// the lobes sweep through each other instead of standing still.
    pub fn perturbed_circle(num_points: usize, color_id: u32) -> Self {
        let mut positions = Vec::with_capacity(num_points);
        let mut velocities = Vec::with_capacity(num_points);

        for k in 0..num_points {
            let theta = 2.0 * PI * k as f64 / num_points as f64;
            let radius = INITIAL_LOOP_RADIUS + 1.5 * (2.0 * theta).cos();

            positions.push(Vec3::new(
                radius * theta.cos(),
                radius * theta.sin(),
                3.0 * (2.0 * theta).sin() + 1.5 * (3.0 * theta).cos(),
            ));
            velocities.push(Vec3::new(
                (3.0 * theta).sin(),
                (3.0 * theta).cos(),
                4.0 * (2.0 * theta).cos(),
            ));
        }

        Self::from_parts(positions, velocities, color_id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Wave-equation acceleration: periodic Laplacian scaled by `coupling · (n/2π)²`.
    ///
    /// The `(n/2π)²` factor keeps the wave speed independent of how many
    /// points the loop currently has.
    pub fn acceleration(&self, coupling: f64) -> Vec<Vec3> {
        let n = self.len();
        let scale = coupling * (n as f64 / (2.0 * PI)).powi(2);

        (0..n)
            .map(|i| {
                let prev = self.positions[(i + n - 1) % n];
                let next = self.positions[(i + 1) % n];
                (next - 2.0 * self.positions[i] + prev) * scale
            })
            .collect()
    }

    /// Velocity-Verlet step: half-kick, drift, recompute, half-kick
    pub fn integrate(&mut self, dt: f64, coupling: f64) {
        if self.is_empty() {
            return;
        }

        let acc = self.acceleration(coupling);
        for (v, a) in self.velocities.iter_mut().zip(&acc) {
            *v += 0.5 * dt * a;
        }

        for (x, v) in self.positions.iter_mut().zip(&self.velocities) {
            *x += dt * v;
        }

        let acc_new = self.acceleration(coupling);
        for (v, a) in self.velocities.iter_mut().zip(&acc_new) {
            *v += 0.5 * dt * a;
        }
    }

    /// ½ · (2π/n) · Σ‖v‖²
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mass_per_point = 2.0 * PI / self.len() as f64;
        0.5 * mass_per_point * self.velocities.iter().map(|v| v.norm_squared()).sum::<f64>()
    }

    /// ½ · coupling · Σ‖Δx‖² · (n/2π)
    pub fn potential_energy(&self, coupling: f64) -> f64 {
        let n = self.len();
        if n == 0 {
            return 0.0;
        }
        let stretch: f64 = self.segments().map(|d| d.norm_squared()).sum();
        0.5 * coupling * stretch * (n as f64 / (2.0 * PI))
    }

    pub fn energy(&self, coupling: f64) -> f64 {
        self.kinetic_energy() + self.potential_energy(coupling)
    }

    /// Total length of the closed polyline
    pub fn arc_length(&self) -> f64 {
        self.segments().map(|d| d.norm()).sum()
    }

    /// Edge vectors `x[i+1] - x[i]`, including the closing edge
    fn segments(&self) -> impl Iterator<Item = Vec3> + '_ {
        let n = self.len();
        (0..n).map(move |i| self.positions[(i + 1) % n] - self.positions[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(n: usize, radius: f64) -> StringLoop {
        let positions = (0..n)
            .map(|k| {
                let t = 2.0 * PI * k as f64 / n as f64;
                Vec3::new(radius * t.cos(), radius * t.sin(), 0.0)
            })
            .collect();
        StringLoop::new(positions, vec![Vec3::zeros(); n], 0).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let result = StringLoop::new(vec![Vec3::zeros(); 30], vec![Vec3::zeros(); 29], 0);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_accessors_expose_loop() {
        let lp = circle(30, 2.0);
        assert_eq!(lp.positions().len(), lp.velocities().len());
        assert_eq!(lp.positions()[0], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(lp.color_id(), 0);
    }

    #[test]
    fn test_perturbed_circle_shape() {
        let lp = StringLoop::perturbed_circle(100, 7);
        assert_eq!(lp.positions.len(), 100);
        assert_eq!(lp.velocities.len(), 100);
        assert_eq!(lp.color_id, 7);
        assert!(lp.energy(1.0) > 0.0);
    }

    #[test]
    fn test_laplacian_points_inward_on_circle() {
        let lp = circle(40, 3.0);
        let acc = lp.acceleration(1.0);
        for (x, a) in lp.positions.iter().zip(&acc) {
            // Curvature pulls every point toward the center
            assert!(x.dot(a) < 0.0);
        }
    }

    #[test]
    fn test_acceleration_scale_invariant_under_refinement() {
        // For a smooth circle the continuum limit is a = -x, whatever n is
        for n in [50, 100, 200] {
            let lp = circle(n, 2.0);
            let acc = lp.acceleration(1.0);
            let expected = -lp.positions[0];
            assert!(
                (acc[0] - expected).norm() < 0.01,
                "n={} gave {:?}, expected {:?}",
                n,
                acc[0],
                expected
            );
        }
    }

    #[test]
    fn test_loop_at_rest_has_only_potential_energy() {
        let lp = circle(30, 1.0);
        assert_eq!(lp.kinetic_energy(), 0.0);
        assert!(lp.potential_energy(1.0) > 0.0);
    }

    #[test]
    fn test_arc_length_of_circle() {
        let lp = circle(400, 2.0);
        let expected = 2.0 * PI * 2.0;
        assert!((lp.arc_length() - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_integrate_conserves_energy_short_run() {
        let mut lp = StringLoop::perturbed_circle(60, 0);
        let e0 = lp.energy(1.0);
        for _ in 0..200 {
            lp.integrate(0.005, 1.0);
        }
        let e1 = lp.energy(1.0);
        assert!((e1 - e0).abs() / e0 < 0.01, "drift {} -> {}", e0, e1);
    }
}
