use crate::config::SimulationConfig;
use crate::error::EngineError;

/// Contract shared by every simulation module.
///
/// A driver calls `initialize` once per session, then `step` once per frame
/// and `get_state` whenever it needs something to draw. Snapshots returned
/// by `get_state` are owned copies, never views into engine buffers.
pub trait PhysicsEngine {
    /// Snapshot type handed to collaborators
    type State;

    /// Reset the engine for a new session
    fn initialize(&mut self, config: &SimulationConfig) -> Result<(), EngineError>;

    /// Advance by `dt`; a no-op before `initialize`
    fn step(&mut self, dt: f64) -> Result<(), EngineError>;

    /// Copy out the current state; `NotInitialized` before `initialize`
    fn get_state(&self) -> Result<Self::State, EngineError>;

    /// Capability probe for engines that accept external kicks
    fn as_perturbable(&mut self) -> Option<&mut dyn Perturbable> {
        None
    }
}

/// Optional capability: inject energy into a running simulation.
pub trait Perturbable {
    fn perturb(&mut self, strength: f64) -> Result<(), EngineError>;
}
