//! Bosonic BFSS matrix model (D0-branes).
//!
//! Three Hermitian N×N matrices evolve under
//! `H = Tr(½Pᵢ² − ¼·g·[Xᵢ,Xⱼ]² + ½·m·Xᵢ²)`
//! with velocity-Verlet integration, multiplicative damping and an
//! element-wise clamp against blow-up from the cubic force.

use std::f64::consts::PI;

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::state::MatrixState;
use crate::backend::{CpuBackend, HostMatrix, MatrixBackend};
use crate::config::{
    SimulationConfig, AFTERBURN_DAMPING, AFTERBURN_DECAY_RATE, AFTERBURN_WINDOW, BASE_DAMPING,
    INITIAL_MATRIX_SCALE, INITIAL_VELOCITY_SCALE, MATRIX_MASS, MAX_EIGEN_ITERATIONS,
    MAX_MATRIX_VALUE, MAX_PERTURB_STRENGTH,
};
use crate::engine::{Perturbable, PhysicsEngine};
use crate::error::{check_time_step, EngineError};

/// Engine-owned matrices, resident wherever the backend keeps them
struct MatrixFields<A> {
    positions: [A; 3],
    velocities: [A; 3],
}

pub struct MatrixEngine<B: MatrixBackend = CpuBackend> {
    backend: B,
    config: Option<SimulationConfig>,
    size: usize,
    fields: Option<MatrixFields<B::Array>>,
    damping: f64,
    /// Time left in the post-perturbation afterburn
    afterburn_remaining: f64,
    rng: StdRng,
}

impl<B: MatrixBackend> MatrixEngine<B> {
    /// Build an engine on an explicitly chosen backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: None,
            size: 0,
            fields: None,
            damping: BASE_DAMPING,
            afterburn_remaining: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Matrix size N in use (0 before `initialize`)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// `Fᵢ = g·Σ_{j≠i}[Xⱼ,[Xᵢ,Xⱼ]] − m·Xᵢ`
    ///
    /// Only the three brackets `[X₀,X₁]`, `[X₀,X₂]`, `[X₁,X₂]` are formed;
    /// the swapped ones are their negatives.
    fn forces(&self, x: &[B::Array; 3], coupling: f64) -> [B::Array; 3] {
        let b = &self.backend;

        let c01 = b.commutator(&x[0], &x[1]);
        let c02 = b.commutator(&x[0], &x[2]);
        let c12 = b.commutator(&x[1], &x[2]);

        let brackets = [
            // [X₁,[X₀,X₁]] + [X₂,[X₀,X₂]]
            b.lin_comb(1.0, &b.commutator(&x[1], &c01), 1.0, &b.commutator(&x[2], &c02)),
            // [X₀,[X₁,X₀]] + [X₂,[X₁,X₂]]
            b.lin_comb(-1.0, &b.commutator(&x[0], &c01), 1.0, &b.commutator(&x[2], &c12)),
            // [X₀,[X₂,X₀]] + [X₁,[X₂,X₁]]
            b.lin_comb(-1.0, &b.commutator(&x[0], &c02), -1.0, &b.commutator(&x[1], &c12)),
        ];

        std::array::from_fn(|i| b.lin_comb(coupling, &brackets[i], -MATRIX_MASS, &x[i]))
    }

    /// Advance the afterburn schedule and pick this step's damping
    fn update_damping(&mut self, dt: f64) {
        if self.afterburn_remaining <= 0.0 {
            self.damping = BASE_DAMPING;
            return;
        }

        self.afterburn_remaining = (self.afterburn_remaining - dt).max(0.0);
        let elapsed = AFTERBURN_WINDOW - self.afterburn_remaining;

        // Exponential relaxation, shifted so it lands on baseline at the window end
        let tail = (-AFTERBURN_DECAY_RATE * AFTERBURN_WINDOW).exp();
        let weight = ((-AFTERBURN_DECAY_RATE * elapsed).exp() - tail) / (1.0 - tail);
        self.damping = BASE_DAMPING + (AFTERBURN_DAMPING - BASE_DAMPING) * weight.max(0.0);
    }
}

impl Default for MatrixEngine<CpuBackend> {
    fn default() -> Self {
        Self::new(CpuBackend)
    }
}

impl<B: MatrixBackend> PhysicsEngine for MatrixEngine<B> {
    type State = MatrixState;

    fn initialize(&mut self, config: &SimulationConfig) -> Result<(), EngineError> {
        config.validate()?;

        let size = config.resolution.min(self.backend.max_matrix_size());
        if size < config.resolution {
            log::warn!(
                "Matrix size {} capped to {} on {} backend",
                config.resolution,
                size,
                self.backend.name()
            );
        }

        self.rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pairs: [(B::Array, B::Array); 3] = std::array::from_fn(|_| {
            let x = random_hermitian(&mut self.rng, size, INITIAL_MATRIX_SCALE);
            let v = random_hermitian(&mut self.rng, size, INITIAL_VELOCITY_SCALE);
            (self.backend.upload(&x), self.backend.upload(&v))
        });
        let [(x0, v0), (x1, v1), (x2, v2)] = pairs;

        self.fields = Some(MatrixFields {
            positions: [x0, x1, x2],
            velocities: [v0, v1, v2],
        });
        self.size = size;
        self.damping = BASE_DAMPING;
        self.afterburn_remaining = 0.0;
        self.config = Some(*config);

        log::info!(
            "Matrix model initialized with N={} on {} backend",
            size,
            self.backend.name()
        );
        Ok(())
    }

    fn step(&mut self, dt: f64) -> Result<(), EngineError> {
        check_time_step(dt)?;

        let Some(config) = self.config else {
            return Ok(());
        };
        let Some(fields) = self.fields.take() else {
            return Ok(());
        };

        self.update_damping(dt);
        let keep = 1.0 - self.damping;
        let coupling = config.coupling_constant;
        let b = &self.backend;

        // Half-kick, then damp
        let forces = self.forces(&fields.positions, coupling);
        let velocities: [B::Array; 3] = std::array::from_fn(|i| {
            b.lin_comb(keep, &fields.velocities[i], 0.5 * dt * keep, &forces[i])
        });

        // Drift, clamp
        let positions: [B::Array; 3] = std::array::from_fn(|i| {
            let drifted = b.lin_comb(1.0, &fields.positions[i], dt, &velocities[i]);
            b.hermitize(&b.clamp(&drifted, MAX_MATRIX_VALUE))
        });

        // Second half-kick at the new positions
        let forces = self.forces(&positions, coupling);
        let velocities: [B::Array; 3] = std::array::from_fn(|i| {
            let kicked = b.lin_comb(keep, &velocities[i], 0.5 * dt * keep, &forces[i]);
            b.hermitize(&kicked)
        });

        self.fields = Some(MatrixFields {
            positions,
            velocities,
        });
        Ok(())
    }

    fn get_state(&self) -> Result<MatrixState, EngineError> {
        let config = self.config.as_ref().ok_or(EngineError::NotInitialized)?;
        let fields = self.fields.as_ref().ok_or(EngineError::NotInitialized)?;

        // The only device-to-host transfer
        let [x0, x1, x2] = &fields.positions;
        let matrices = [
            self.backend.download(x0)?,
            self.backend.download(x1)?,
            self.backend.download(x2)?,
        ];
        let [v0, v1, v2] = &fields.velocities;
        let velocities = [
            self.backend.download(v0)?,
            self.backend.download(v1)?,
            self.backend.download(v2)?,
        ];

        Ok(MatrixState {
            positions: brane_positions(&matrices),
            connection_strengths: Some(connection_strengths(&matrices)),
            energy: hamiltonian(&matrices, &velocities, config.coupling_constant),
            damping: self.damping,
            backend: self.backend.name(),
            matrices,
        })
    }

    fn as_perturbable(&mut self) -> Option<&mut dyn Perturbable> {
        Some(self)
    }
}

impl<B: MatrixBackend> Perturbable for MatrixEngine<B> {
    /// Random Hermitian velocity kick plus an afterburn of extra damping
    fn perturb(&mut self, strength: f64) -> Result<(), EngineError> {
        if !strength.is_finite() || strength.abs() > MAX_PERTURB_STRENGTH {
            return Err(EngineError::InvalidConfig(format!(
                "perturbation strength must lie within ±{}, got {}",
                MAX_PERTURB_STRENGTH, strength
            )));
        }

        let Some(fields) = self.fields.as_mut() else {
            return Ok(());
        };

        for v in fields.velocities.iter_mut() {
            let kick = random_hermitian(&mut self.rng, self.size, strength);
            let kick = self.backend.upload(&kick);
            *v = self.backend.lin_comb(1.0, v, 1.0, &kick);
        }

        self.afterburn_remaining = AFTERBURN_WINDOW;
        self.damping = AFTERBURN_DAMPING;
        log::debug!("Matrix model perturbed with strength {}", strength);
        Ok(())
    }
}

/// Standard normal sample (Box-Muller)
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-12);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// `(A + Aᴴ)·scale` for a complex Gaussian `A`
fn random_hermitian(rng: &mut StdRng, n: usize, scale: f64) -> HostMatrix {
    let a = HostMatrix::from_fn(n, n, |_, _| Complex64::new(gaussian(rng), gaussian(rng)));
    (&a + a.adjoint()) * Complex64::new(scale, 0.0)
}

/// Real eigenvalues of a Hermitian matrix, or its diagonal if the solver gives up
pub fn hermitian_eigenvalues(m: &HostMatrix) -> Vec<f64> {
    let finite = m.iter().all(|z| z.re.is_finite() && z.im.is_finite());
    if finite {
        if let Some(eigen) = SymmetricEigen::try_new(m.clone(), f64::EPSILON, MAX_EIGEN_ITERATIONS) {
            if eigen.eigenvalues.iter().all(|v| v.is_finite()) {
                return eigen.eigenvalues.iter().copied().collect();
            }
        }
    }

    log::debug!("Eigen decomposition failed, using diagonal approximation");
    m.diagonal().iter().map(|z| z.re).collect()
}

/// Sorted eigenvalues of X₀, X₁, X₂ stacked into one triple per brane.
///
/// Each sequence is sorted on its own, so row k pairs the k-th smallest
/// eigenvalue of every matrix. Nothing ties those together physically, and
/// rows can swap partners when eigenvalues cross between frames.
pub fn brane_positions(matrices: &[HostMatrix; 3]) -> Vec<[f64; 3]> {
    let sorted: [Vec<f64>; 3] = std::array::from_fn(|i| {
        let mut values = hermitian_eigenvalues(&matrices[i]);
        values.sort_by(|a, b| a.total_cmp(b));
        values
    });

    (0..sorted[0].len())
        .map(|k| [sorted[0][k], sorted[1][k], sorted[2][k]])
        .collect()
}

/// `Σₖ|Xₖ[i,j]|²` with zero diagonal, scaled so the strongest link is 1
pub fn connection_strengths(matrices: &[HostMatrix; 3]) -> DMatrix<f64> {
    let n = matrices[0].nrows();
    let raw = |i: usize, j: usize| -> f64 { matrices.iter().map(|m| m[(i, j)].norm_sqr()).sum() };

    let mut strengths = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            0.0
        } else {
            0.5 * (raw(i, j) + raw(j, i))
        }
    });

    let max = strengths.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        strengths /= max;
    }
    strengths
}

/// Commutator potential plus confining mass term
fn potential(x: &[HostMatrix; 3], coupling: f64) -> f64 {
    let mass_term: f64 = x.iter().map(|m| 0.5 * MATRIX_MASS * m.norm_squared()).sum();

    let commutator_term: f64 = [(0, 1), (0, 2), (1, 2)]
        .iter()
        .map(|&(i, j)| {
            let c = &x[i] * &x[j] - &x[j] * &x[i];
            0.5 * coupling * c.norm_squared()
        })
        .sum();

    mass_term + commutator_term
}

fn hamiltonian(x: &[HostMatrix; 3], v: &[HostMatrix; 3], coupling: f64) -> f64 {
    let kinetic: f64 = v.iter().map(|m| 0.5 * m.norm_squared()).sum();
    kinetic + potential(x, coupling)
}
