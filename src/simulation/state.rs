use nalgebra::DMatrix;

use super::string_loop::StringLoop;
use crate::backend::HostMatrix;

/// Snapshot of the string simulation.
///
/// Owns copies of every loop, so callers may keep or mutate it freely.
#[derive(Clone, Debug)]
pub struct StringState {
    /// Kinetic plus potential energy summed over all loops
    pub energy: f64,
    pub loops: Vec<StringLoop>,
    pub num_loops: usize,
    /// Splits committed since `initialize`
    pub total_splits: u64,
}

impl StringState {
    /// First loop (the original one until it splits)
    pub fn primary(&self) -> Option<&StringLoop> {
        self.loops.first()
    }

    /// Points across all loops
    pub fn total_points(&self) -> usize {
        self.loops.iter().map(StringLoop::len).sum()
    }
}

/// Snapshot of the matrix model, always host-resident.
#[derive(Clone, Debug)]
pub struct MatrixState {
    /// Deep copies of X₀, X₁, X₂
    pub matrices: [HostMatrix; 3],
    /// One sorted eigenvalue triple per brane (N rows)
    pub positions: Vec<[f64; 3]>,
    /// Symmetric, zero-diagonal, normalized to [0, 1]
    pub connection_strengths: Option<DMatrix<f64>>,
    /// Hamiltonian: kinetic + mass term + commutator potential
    pub energy: f64,
    /// Damping in effect for the next step
    pub damping: f64,
    pub backend: &'static str,
}

impl MatrixState {
    /// Matrix size N
    pub fn size(&self) -> usize {
        self.matrices[0].nrows()
    }
}
