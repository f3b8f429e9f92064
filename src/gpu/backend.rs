use wgpu::{Buffer, BufferUsages};

use super::buffers::{GpuMatrix, OpParams};
use super::compute::{Kernel, MatrixKernels};
use super::context::GpuContext;
use crate::backend::{HostMatrix, MatrixBackend};
use crate::config::GPU_MAX_MATRIX_SIZE;
use crate::error::EngineError;

/// wgpu compute backend.
///
/// Matrices stay in device memory between steps; arithmetic runs in f32.
pub struct GpuBackend {
    context: GpuContext,
    kernels: MatrixKernels,
    params_buffer: Buffer,
}

impl GpuBackend {
    /// Fails with `BackendUnavailable` when no adapter or device can be opened
    pub fn new() -> Result<Self, EngineError> {
        let context = GpuContext::new()?;
        let kernels = MatrixKernels::new(&context.device);

        let params_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("op-params-buffer"),
            size: std::mem::size_of::<OpParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            context,
            kernels,
            params_buffer,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_name
    }

    /// Run one kernel into a fresh destination and submit it
    fn run(&self, kernel: Kernel, lhs: &GpuMatrix, rhs: &GpuMatrix, params: OpParams) -> GpuMatrix {
        let device = &self.context.device;
        let queue = &self.context.queue;
        let dst = GpuMatrix::empty(device, lhs.n);

        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("matrix-op-encoder"),
        });
        self.kernels
            .dispatch(device, &mut encoder, kernel, (lhs, rhs), &dst, &self.params_buffer);
        queue.submit(std::iter::once(encoder.finish()));

        dst
    }
}

impl MatrixBackend for GpuBackend {
    type Array = GpuMatrix;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn max_matrix_size(&self) -> usize {
        GPU_MAX_MATRIX_SIZE
    }

    fn upload(&self, host: &HostMatrix) -> GpuMatrix {
        GpuMatrix::upload(&self.context.device, &self.context.queue, host)
    }

    fn download(&self, array: &GpuMatrix) -> Result<HostMatrix, EngineError> {
        array.download(&self.context.device, &self.context.queue)
    }

    fn matmul(&self, a: &GpuMatrix, b: &GpuMatrix) -> GpuMatrix {
        self.run(Kernel::Matmul, a, b, OpParams::new(a.n))
    }

    fn lin_comb(&self, alpha: f64, a: &GpuMatrix, beta: f64, b: &GpuMatrix) -> GpuMatrix {
        let params = OpParams {
            alpha: alpha as f32,
            beta: beta as f32,
            ..OpParams::new(a.n)
        };
        self.run(Kernel::LinComb, a, b, params)
    }

    fn clamp(&self, a: &GpuMatrix, limit: f64) -> GpuMatrix {
        let params = OpParams {
            limit: limit as f32,
            ..OpParams::new(a.n)
        };
        self.run(Kernel::Clamp, a, a, params)
    }

    fn hermitize(&self, a: &GpuMatrix) -> GpuMatrix {
        self.run(Kernel::Hermitize, a, a, OpParams::new(a.n))
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;
    use crate::backend::CpuBackend;
    use crate::config::SimulationConfig;
    use crate::engine::PhysicsEngine;
    use crate::simulation::MatrixEngine;

    /// None on machines without a usable adapter; those tests become no-ops
    fn backend() -> Option<GpuBackend> {
        match GpuBackend::new() {
            Ok(backend) => Some(backend),
            Err(e) => {
                eprintln!("skipping GPU test: {}", e);
                None
            }
        }
    }

    fn sample(n: usize, offset: f64) -> HostMatrix {
        HostMatrix::from_fn(n, n, |i, j| {
            Complex64::new((i as f64 * 0.7 + offset).sin(), (j as f64 - offset).cos() * 0.5)
        })
    }

    fn max_diff(a: &HostMatrix, b: &HostMatrix) -> f64 {
        (a - b).iter().map(|z| z.norm()).fold(0.0, f64::max)
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_gpu_matmul_matches_cpu() {
        let Some(gpu) = backend() else { return };
        // Not a multiple of the workgroup size
        let a = sample(19, 0.3);
        let b = sample(19, 1.1);

        let expected = CpuBackend.matmul(&a, &b);
        let product = gpu
            .download(&gpu.matmul(&gpu.upload(&a), &gpu.upload(&b)))
            .unwrap();
        assert!(max_diff(&product, &expected) < 1e-4);
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_gpu_elementwise_ops_match_cpu() {
        let Some(gpu) = backend() else { return };
        let a = sample(7, 0.0) * Complex64::new(80.0, 0.0);
        let b = sample(7, 2.0);
        let (ga, gb) = (gpu.upload(&a), gpu.upload(&b));

        let comb = gpu.download(&gpu.lin_comb(0.5, &ga, -2.0, &gb)).unwrap();
        assert!(max_diff(&comb, &CpuBackend.lin_comb(0.5, &a, -2.0, &b)) < 1e-4);

        let clamped = gpu.download(&gpu.clamp(&ga, 50.0)).unwrap();
        assert!(max_diff(&clamped, &CpuBackend.clamp(&a, 50.0)) < 1e-4);

        let herm = gpu.download(&gpu.hermitize(&ga)).unwrap();
        assert!(max_diff(&herm, &CpuBackend.hermitize(&a)) < 1e-3);
        assert_eq!(herm, herm.adjoint());
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_gpu_engine_steps() {
        let Some(gpu) = backend() else { return };
        let mut engine = MatrixEngine::new(gpu);
        engine
            .initialize(&SimulationConfig::default().with_resolution(16).with_seed(3))
            .unwrap();
        for _ in 0..10 {
            engine.step(0.01).unwrap();
        }

        let state = engine.get_state().unwrap();
        assert_eq!(state.backend, "gpu");
        assert_eq!(state.size(), 16);
        assert!(state.energy.is_finite());
        assert_eq!(state.positions.len(), 16);
    }
}
