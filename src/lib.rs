//! Interactive-physics engines for relativistic strings and the BFSS
//! matrix model, behind one `PhysicsEngine` interface.

pub mod app;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod simulation;

pub use backend::{CpuBackend, HostMatrix, MatrixBackend};
pub use config::SimulationConfig;
pub use engine::{Perturbable, PhysicsEngine};
pub use error::EngineError;
pub use simulation::{MatrixEngine, MatrixState, StringEngine, StringState};
