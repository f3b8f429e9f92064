use wgpu::{BindGroupLayout, ComputePipeline, Device};

use super::buffers::GpuMatrix;
use crate::config::WORKGROUP_SIZE;

/// Element-wise and product kernels from matrix.wgsl
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    Matmul,
    LinComb,
    Clamp,
    Hermitize,
}

impl Kernel {
    const ALL: [Kernel; 4] = [Kernel::Matmul, Kernel::LinComb, Kernel::Clamp, Kernel::Hermitize];

    fn entry_point(self) -> &'static str {
        match self {
            Kernel::Matmul => "matmul",
            Kernel::LinComb => "lin_comb",
            Kernel::Clamp => "clamp_parts",
            Kernel::Hermitize => "hermitize",
        }
    }
}

/// One compute pipeline per kernel, sharing a single bind group layout
pub struct MatrixKernels {
    pipelines: [ComputePipeline; 4],
    bind_group_layout: BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl MatrixKernels {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("matrix-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/matrix.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("matrix-bind-group-layout"),
            entries: &[
                // Left operand
                storage_entry(0, true),
                // Right operand (unary kernels bind the left one again)
                storage_entry(1, true),
                // Destination
                storage_entry(2, false),
                // Op parameters (uniform)
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("matrix-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Kernel::ALL.map(|kernel| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.entry_point()),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(kernel.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        });

        Self {
            pipelines,
            bind_group_layout,
        }
    }

    /// Record one kernel dispatch covering an N×N destination
    pub fn dispatch(
        &self,
        device: &Device,
        encoder: &mut wgpu::CommandEncoder,
        kernel: Kernel,
        operands: (&GpuMatrix, &GpuMatrix),
        dst: &GpuMatrix,
        params_buffer: &wgpu::Buffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("matrix-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: operands.0.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: operands.1.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dst.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let groups = (dst.n as u32).div_ceil(WORKGROUP_SIZE);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("matrix-compute-pass"),
            timestamp_writes: None,
        });

        pass.set_pipeline(&self.pipelines[kernel as usize]);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups, groups, 1);
    }
}
