use thiserror::Error;

/// Errors surfaced by the simulation engines.
///
/// Numerical trouble (blow-up, eigensolver non-convergence) is recovered
/// locally and never shows up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("physics engine not initialized")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("compute backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Check a per-frame time step
pub(crate) fn check_time_step(dt: f64) -> Result<(), EngineError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidTimeStep(dt))
    }
}
