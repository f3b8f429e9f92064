use crate::error::EngineError;

// ============================================
// String Loop Parameters
// ============================================

/// Minimum points per loop (shorter daughters are annihilated)
pub const MIN_LOOP_POINTS: usize = 20;

/// Maximum number of simultaneous loops
pub const MAX_LOOPS: usize = 8;

/// Distance below which two non-adjacent points count as a self-crossing
pub const INTERSECTION_THRESHOLD: f64 = 0.8;

/// Target spacing between neighbouring points after resampling
pub const TARGET_POINT_DENSITY: f64 = 0.5;

/// Upper bound on points per resampled loop (cost control)
pub const MAX_RESAMPLED_POINTS: usize = 150;

/// Radius of the initial loop
pub const INITIAL_LOOP_RADIUS: f64 = 5.0;

// ============================================
// Matrix Model Parameters
// ============================================

/// Confining mass term in the force law
pub const MATRIX_MASS: f64 = 1.0;

/// Baseline damping applied at every half-kick
pub const BASE_DAMPING: f64 = 0.01;

/// Damping right after a perturbation
pub const AFTERBURN_DAMPING: f64 = 0.15;

/// Time units over which the afterburn relaxes back to baseline
pub const AFTERBURN_WINDOW: f64 = 2.0;

/// Exponential decay rate of the afterburn (e-folds per time unit)
pub const AFTERBURN_DECAY_RATE: f64 = 2.5;

/// Element-wise clamp on matrix entries (real and imaginary parts)
pub const MAX_MATRIX_VALUE: f64 = 50.0;

/// Scale of the initial Hermitian position matrices
pub const INITIAL_MATRIX_SCALE: f64 = 0.1;

/// Scale of the initial (thermal) Hermitian velocity matrices
pub const INITIAL_VELOCITY_SCALE: f64 = 0.01;

/// Default perturbation strength for drivers that do not choose one
pub const DEFAULT_PERTURB_STRENGTH: f64 = 5.0;

/// Largest accepted perturbation strength; keeps the energy sum finite
pub const MAX_PERTURB_STRENGTH: f64 = 1.0e6;

/// Largest N the CPU reference backend runs in real time
pub const CPU_MAX_MATRIX_SIZE: usize = 32;

/// Largest N the GPU backend runs in real time
pub const GPU_MAX_MATRIX_SIZE: usize = 128;

/// Iteration cap for the Hermitian eigensolver before falling back to the diagonal
pub const MAX_EIGEN_ITERATIONS: usize = 1000;

/// Compute shader workgroup size (per axis)
pub const WORKGROUP_SIZE: u32 = 16;

/// Per-session simulation configuration.
///
/// Immutable once handed to an engine: engines copy it on `initialize`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Frame time step used by drivers
    pub time_step: f64,
    /// Initial loop point count, or matrix size N
    pub resolution: usize,
    /// String tension or Yang-Mills coupling
    pub coupling_constant: f64,
    /// Allow loops to split at self-intersections
    pub splitting_enabled: bool,
    /// Chance that a detected crossing actually splits the loop
    pub splitting_probability: f64,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            resolution: 100,
            coupling_constant: 1.0,
            splitting_enabled: true,
            splitting_probability: 0.3,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_coupling(mut self, coupling_constant: f64) -> Self {
        self.coupling_constant = coupling_constant;
        self
    }

    pub fn with_splitting(mut self, enabled: bool, probability: f64) -> Self {
        self.splitting_enabled = enabled;
        self.splitting_probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject values no engine can run with
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "time_step must be > 0, got {}",
                self.time_step
            )));
        }

        if self.resolution == 0 {
            return Err(EngineError::InvalidConfig(
                "resolution must be > 0".to_string(),
            ));
        }

        if !(self.coupling_constant.is_finite() && self.coupling_constant > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "coupling_constant must be > 0, got {}",
                self.coupling_constant
            )));
        }

        if !(0.0..=1.0).contains(&self.splitting_probability) {
            return Err(EngineError::InvalidConfig(format!(
                "splitting_probability must lie in [0, 1], got {}",
                self.splitting_probability
            )));
        }

        Ok(())
    }
}
