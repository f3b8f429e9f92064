use std::time::Instant;

use crate::config::{SimulationConfig, DEFAULT_PERTURB_STRENGTH};
use crate::engine::PhysicsEngine;
use crate::error::EngineError;
use crate::simulation::{MatrixState, StringState};

/// What the driver logs about a snapshot
pub trait FrameReport {
    fn energy(&self) -> f64;
    fn describe(&self) -> String;
}

impl FrameReport for StringState {
    fn energy(&self) -> f64 {
        self.energy
    }

    fn describe(&self) -> String {
        format!(
            "{} loops, {} points, {} splits",
            self.num_loops,
            self.total_points(),
            self.total_splits
        )
    }
}

impl FrameReport for MatrixState {
    fn energy(&self) -> f64 {
        self.energy
    }

    fn describe(&self) -> String {
        format!("N={} on {}, damping {:.3}", self.size(), self.backend, self.damping)
    }
}

/// Outcome of one headless run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u32,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Whether the engine accepted the scheduled kick
    pub perturbed: bool,
}

/// Headless frame loop: initialize, step once per frame, report
pub struct App {
    config: SimulationConfig,
    frames: u32,
    /// Frame at which to kick engines that support it
    perturb_at: Option<u32>,
}

impl App {
    pub fn new(config: SimulationConfig, frames: u32) -> Self {
        Self {
            config,
            frames,
            perturb_at: None,
        }
    }

    pub fn with_perturbation(mut self, frame: u32) -> Self {
        self.perturb_at = Some(frame);
        self
    }

    pub fn run<E>(&self, label: &str, engine: &mut E) -> Result<RunSummary, EngineError>
    where
        E: PhysicsEngine,
        E::State: FrameReport,
    {
        engine.initialize(&self.config)?;
        let initial = engine.get_state()?;
        log::info!("[{}] start: {} (E = {:.4})", label, initial.describe(), initial.energy());

        let mut rate = StepRateCounter::new();
        let mut perturbed = false;

        for frame in 0..self.frames {
            if self.perturb_at == Some(frame) {
                match engine.as_perturbable() {
                    Some(target) => {
                        target.perturb(DEFAULT_PERTURB_STRENGTH)?;
                        perturbed = true;
                        log::info!("[{}] perturbed at frame {}", label, frame);
                    }
                    None => log::info!("[{}] engine does not accept perturbations", label),
                }
            }

            engine.step(self.config.time_step)?;

            if let Some(steps_per_second) = rate.tick() {
                log::info!("[{}] {:.0} steps/s", label, steps_per_second);
            }
        }

        let last = engine.get_state()?;
        log::info!(
            "[{}] after {} frames: {} (E = {:.4})",
            label,
            self.frames,
            last.describe(),
            last.energy()
        );

        Ok(RunSummary {
            frames: self.frames,
            initial_energy: initial.energy(),
            final_energy: last.energy(),
            perturbed,
        })
    }
}

/// Steps-per-second counter
struct StepRateCounter {
    last_update: Instant,
    step_count: u32,
}

impl StepRateCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            step_count: 0,
        }
    }

    /// Tick the counter, returns Some(rate) every second
    fn tick(&mut self) -> Option<f64> {
        self.step_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let rate = self.step_count as f64 / elapsed.as_secs_f64();
            self.step_count = 0;
            self.last_update = Instant::now();
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{MatrixEngine, StringEngine};

    fn config() -> SimulationConfig {
        SimulationConfig::default().with_resolution(40).with_seed(11)
    }

    #[test]
    fn test_string_engine_ignores_perturbation() {
        let app = App::new(config(), 20).with_perturbation(5);
        let mut engine = StringEngine::new();

        let summary = app.run("strings", &mut engine).unwrap();
        assert_eq!(summary.frames, 20);
        assert!(!summary.perturbed);
        assert!(summary.final_energy.is_finite());
    }

    #[test]
    fn test_matrix_engine_takes_perturbation() {
        let app = App::new(config().with_resolution(6), 10).with_perturbation(0);
        let mut engine: MatrixEngine = MatrixEngine::default();

        let summary = app.run("matrix", &mut engine).unwrap();
        assert!(summary.perturbed);
        assert!(summary.final_energy > summary.initial_energy);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let app = App::new(config().with_time_step(0.0), 5);
        let mut engine = StringEngine::new();
        assert!(matches!(
            app.run("strings", &mut engine),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rate_counter_waits_a_second() {
        let mut counter = StepRateCounter::new();
        assert_eq!(counter.tick(), None);
        assert_eq!(counter.step_count, 1);
    }
}
