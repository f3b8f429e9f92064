use num_complex::Complex64;

use super::{HostMatrix, MatrixBackend};
use crate::config::CPU_MAX_MATRIX_SIZE;
use crate::error::EngineError;

/// Reference backend: dense nalgebra matrices in host memory
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl MatrixBackend for CpuBackend {
    type Array = HostMatrix;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn max_matrix_size(&self) -> usize {
        CPU_MAX_MATRIX_SIZE
    }

    fn upload(&self, host: &HostMatrix) -> HostMatrix {
        host.clone()
    }

    fn download(&self, array: &HostMatrix) -> Result<HostMatrix, EngineError> {
        Ok(array.clone())
    }

    fn matmul(&self, a: &HostMatrix, b: &HostMatrix) -> HostMatrix {
        a * b
    }

    fn lin_comb(&self, alpha: f64, a: &HostMatrix, beta: f64, b: &HostMatrix) -> HostMatrix {
        a.zip_map(b, |x, y| x * alpha + y * beta)
    }

    fn clamp(&self, a: &HostMatrix, limit: f64) -> HostMatrix {
        a.map(|z| Complex64::new(z.re.clamp(-limit, limit), z.im.clamp(-limit, limit)))
    }

    fn hermitize(&self, a: &HostMatrix) -> HostMatrix {
        (a + a.adjoint()) * Complex64::new(0.5, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize, offset: f64) -> HostMatrix {
        HostMatrix::from_fn(n, n, |i, j| {
            Complex64::new((i as f64 + offset).sin() + j as f64 * 0.3, (j as f64 - offset).cos())
        })
    }

    fn hermitian(n: usize, offset: f64) -> HostMatrix {
        let a = sample(n, offset);
        (&a + a.adjoint()) * Complex64::new(0.5, 0.0)
    }

    #[test]
    fn test_commutator_antisymmetric() {
        let backend = CpuBackend;
        let a = sample(4, 0.0);
        let b = sample(4, 1.7);

        let ab = backend.commutator(&a, &b);
        let ba = backend.commutator(&b, &a);
        let sum = backend.lin_comb(1.0, &ab, 1.0, &ba);
        assert!(sum.norm() < 1e-12, "[a,b] + [b,a] should vanish, got {}", sum.norm());
    }

    #[test]
    fn test_commutator_of_hermitian_is_anti_hermitian() {
        let backend = CpuBackend;
        let c = backend.commutator(&hermitian(5, 0.2), &hermitian(5, 2.1));
        let residual = &c + c.adjoint();
        assert!(residual.norm() < 1e-12);
        // Traceless as well
        assert!(c.trace().norm() < 1e-12);
    }

    #[test]
    fn test_lin_comb() {
        let backend = CpuBackend;
        let a = sample(3, 0.5);
        let b = sample(3, -0.5);
        let out = backend.lin_comb(2.0, &a, -0.5, &b);
        for i in 0..3 {
            for j in 0..3 {
                let expected = a[(i, j)] * 2.0 - b[(i, j)] * 0.5;
                assert!((out[(i, j)] - expected).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_clamp_parts_independently() {
        let backend = CpuBackend;
        let mut a = HostMatrix::zeros(2, 2);
        a[(0, 1)] = Complex64::new(120.0, -80.0);
        a[(1, 0)] = Complex64::new(120.0, 80.0);
        a[(1, 1)] = Complex64::new(-3.0, 0.0);

        let clamped = backend.clamp(&a, 50.0);
        assert_eq!(clamped[(0, 1)], Complex64::new(50.0, -50.0));
        assert_eq!(clamped[(1, 0)], Complex64::new(50.0, 50.0));
        assert_eq!(clamped[(1, 1)], Complex64::new(-3.0, 0.0));
        // Hermitian input stays Hermitian
        assert_eq!(clamped[(0, 1)], clamped[(1, 0)].conj());
    }

    #[test]
    fn test_hermitize_is_exact() {
        let backend = CpuBackend;
        let h = backend.hermitize(&sample(6, 0.9));
        assert_eq!(h, h.adjoint());
        for k in 0..6 {
            assert_eq!(h[(k, k)].im, 0.0);
        }
        // Already Hermitian input is a fixed point
        let again = backend.hermitize(&h);
        assert!((&again - &h).norm() < 1e-15);
    }
}
