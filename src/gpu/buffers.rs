use std::sync::mpsc;

use num_complex::Complex64;
use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::backend::HostMatrix;
use crate::error::EngineError;

/// Per-dispatch parameters (16 bytes, matches `OpParams` in matrix.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OpParams {
    pub n: u32,
    pub alpha: f32,
    pub beta: f32,
    pub limit: f32,
}

impl OpParams {
    pub fn new(n: usize) -> Self {
        Self {
            n: n as u32,
            alpha: 0.0,
            beta: 0.0,
            limit: 0.0,
        }
    }
}

/// N×N complex matrix in device memory.
///
/// Row-major `vec2<f32>` elements, `(re, im)`.
pub struct GpuMatrix {
    pub buffer: Buffer,
    pub n: usize,
}

impl GpuMatrix {
    fn byte_size(n: usize) -> u64 {
        (n * n * std::mem::size_of::<[f32; 2]>()) as u64
    }

    /// Uninitialized device matrix, used as a kernel destination
    pub fn empty(device: &Device, n: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("matrix-buffer"),
            size: Self::byte_size(n),
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, n }
    }

    /// Copy a host matrix to the device, narrowing to f32
    pub fn upload(device: &Device, queue: &Queue, host: &HostMatrix) -> Self {
        let n = host.nrows();
        let matrix = Self::empty(device, n);
        queue.write_buffer(&matrix.buffer, 0, bytemuck::cast_slice(&pack(host)));
        matrix
    }

    /// Blocking copy back to the host
    pub fn download(&self, device: &Device, queue: &Queue) -> Result<HostMatrix, EngineError> {
        let size = Self::byte_size(self.n);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("matrix-readback-buffer"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback-encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;

        let host = {
            let data = slice.get_mapped_range();
            unpack(bytemuck::cast_slice(&data[..]), self.n)
        };
        staging.unmap();
        Ok(host)
    }
}

/// Row-major `[re, im]` pairs
fn pack(host: &HostMatrix) -> Vec<[f32; 2]> {
    let n = host.nrows();
    (0..n * n)
        .map(|k| {
            let z = host[(k / n, k % n)];
            [z.re as f32, z.im as f32]
        })
        .collect()
}

fn unpack(data: &[[f32; 2]], n: usize) -> HostMatrix {
    HostMatrix::from_fn(n, n, |i, j| {
        let [re, im] = data[i * n + j];
        Complex64::new(re as f64, im as f64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_params_layout() {
        assert_eq!(std::mem::size_of::<OpParams>(), 16);
    }

    #[test]
    fn test_pack_is_row_major() {
        let host = HostMatrix::from_fn(2, 2, |i, j| Complex64::new(i as f64, j as f64 + 0.5));
        let packed = pack(&host);
        assert_eq!(packed, vec![[0.0, 0.5], [0.0, 1.5], [1.0, 0.5], [1.0, 1.5]]);
        assert_eq!(unpack(&packed, 2), host);
    }
}
