//! Numeric-array abstraction for the matrix model.
//!
//! The matrix engine expresses its whole hot path (force evaluation,
//! Verlet kicks, clamping, re-Hermitization) against [`MatrixBackend`], so the same
//! algorithm runs on the CPU reference implementation or on a
//! device-resident backend. Only [`MatrixBackend::download`] brings data
//! back to the host, and the engine calls it from `get_state` alone.

mod cpu;

pub use cpu::CpuBackend;

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::EngineError;

/// Host-resident complex square matrix
pub type HostMatrix = DMatrix<Complex64>;

pub trait MatrixBackend {
    /// Backend-owned storage for one N×N complex matrix
    type Array;

    /// Short name for logs and snapshots
    fn name(&self) -> &'static str;

    /// Largest N this backend can step in real time
    fn max_matrix_size(&self) -> usize;

    /// Host to backend copy
    fn upload(&self, host: &HostMatrix) -> Self::Array;

    /// Backend to host copy (blocking on device backends)
    fn download(&self, array: &Self::Array) -> Result<HostMatrix, EngineError>;

    /// Matrix product `a · b`
    fn matmul(&self, a: &Self::Array, b: &Self::Array) -> Self::Array;

    /// Element-wise `alpha·a + beta·b`
    fn lin_comb(&self, alpha: f64, a: &Self::Array, beta: f64, b: &Self::Array) -> Self::Array;

    /// Clamp real and imaginary parts to `[-limit, limit]`
    fn clamp(&self, a: &Self::Array, limit: f64) -> Self::Array;

    /// Hermitian part `(a + aᴴ) / 2`
    fn hermitize(&self, a: &Self::Array) -> Self::Array;

    /// Lie bracket `[a, b] = ab - ba`
    fn commutator(&self, a: &Self::Array, b: &Self::Array) -> Self::Array {
        let ab = self.matmul(a, b);
        let ba = self.matmul(b, a);
        self.lin_comb(1.0, &ab, -1.0, &ba)
    }
}
