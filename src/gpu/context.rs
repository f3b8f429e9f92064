use wgpu::{Device, Instance, Queue};

use crate::error::EngineError;

/// Headless GPU context: device and queue for compute only
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter_name: String,
}

impl GpuContext {
    /// Pick an adapter and open a device, blocking until both are ready
    pub fn new() -> Result<Self, EngineError> {
        pollster::block_on(Self::request())
    }

    async fn request() -> Result<Self, EngineError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| EngineError::BackendUnavailable("no suitable GPU adapter".into()))?;

        let adapter_name = adapter.get_info().name;
        log::info!("Using GPU: {}", adapter_name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("stringverse-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter_name,
        })
    }
}
