//! Headless wgpu compute backend for the matrix model

mod backend;
mod buffers;
mod compute;
mod context;

pub use backend::GpuBackend;
pub use buffers::{GpuMatrix, OpParams};
pub use context::GpuContext;
