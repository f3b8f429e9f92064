use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::intersection::{find_self_intersection, split_arcs, LoopArc};
use super::resample::resample_loop;
use super::state::StringState;
use super::string_loop::StringLoop;
use crate::config::{SimulationConfig, MAX_LOOPS, MIN_LOOP_POINTS};
use crate::engine::PhysicsEngine;
use crate::error::{check_time_step, EngineError};

/// Multi-loop relativistic string simulator with topology changes.
///
/// Each step integrates every loop, looks for a self-crossing and, if the
/// dice allow, replaces the loop by its resampled daughters. The next
/// generation of loops is built into a fresh list and swapped in at the end
/// of the step.
pub struct StringEngine {
    config: Option<SimulationConfig>,
    loops: Vec<StringLoop>,
    next_color_id: u32,
    total_splits: u64,
    rng: StdRng,
}

impl StringEngine {
    pub fn new() -> Self {
        Self {
            config: None,
            loops: Vec::new(),
            next_color_id: 0,
            total_splits: 0,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn total_splits(&self) -> u64 {
        self.total_splits
    }

    fn allocate_color_id(&mut self) -> u32 {
        let id = self.next_color_id;
        self.next_color_id += 1;
        id
    }

    /// Turn split arcs into loops, dropping any too short to live
    fn daughters(&mut self, arcs: [LoopArc; 2]) -> Vec<StringLoop> {
        let mut survivors = Vec::with_capacity(2);
        for arc in arcs {
            if arc.len() < MIN_LOOP_POINTS {
                continue;
            }
            let color_id = self.allocate_color_id();
            let raw = StringLoop::from_parts(arc.positions, arc.velocities, color_id);
            survivors.push(resample_loop(&raw));
        }
        survivors
    }

    fn total_energy(&self, coupling: f64) -> f64 {
        self.loops.iter().map(|lp| lp.energy(coupling)).sum()
    }
}

impl Default for StringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine for StringEngine {
    type State = StringState;

    fn initialize(&mut self, config: &SimulationConfig) -> Result<(), EngineError> {
        config.validate()?;

        let mut resolution = config.resolution;
        if resolution < MIN_LOOP_POINTS {
            log::warn!(
                "String resolution {} below minimum, using {}",
                resolution,
                MIN_LOOP_POINTS
            );
            resolution = MIN_LOOP_POINTS;
        }

        self.rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.next_color_id = 0;
        self.total_splits = 0;

        let color_id = self.allocate_color_id();
        self.loops = vec![StringLoop::perturbed_circle(resolution, color_id)];
        self.config = Some(*config);

        log::info!(
            "String engine initialized: {} points, coupling {}, splitting {}",
            resolution,
            config.coupling_constant,
            if config.splitting_enabled { "on" } else { "off" }
        );
        Ok(())
    }

    fn step(&mut self, dt: f64) -> Result<(), EngineError> {
        check_time_step(dt)?;

        let Some(config) = self.config else {
            return Ok(());
        };
        if self.loops.is_empty() {
            return Ok(());
        }

        let current = std::mem::take(&mut self.loops);
        let total = current.len();
        let mut next: Vec<StringLoop> = Vec::with_capacity(total + 1);

        for (idx, mut lp) in current.into_iter().enumerate() {
            lp.integrate(dt, config.coupling_constant);

            // Loops already emitted plus loops still to come (this one included)
            let running = next.len() + (total - idx);

            if config.splitting_enabled && running < MAX_LOOPS {
                if let Some((i, j)) = find_self_intersection(&lp.positions) {
                    if self.rng.gen::<f64>() < config.splitting_probability {
                        let (first, second) = split_arcs(&lp, i, j);
                        let survivors = self.daughters([first, second]);

                        if !survivors.is_empty() {
                            self.total_splits += 1;
                            log::debug!(
                                "String split: loop {} at ({}, {}) -> {} daughter(s), {} split(s) total",
                                lp.color_id,
                                i,
                                j,
                                survivors.len(),
                                self.total_splits
                            );
                            next.extend(survivors);
                            continue;
                        }
                    }
                }
            }

            next.push(lp);
        }

        self.loops = next;
        Ok(())
    }

    fn get_state(&self) -> Result<StringState, EngineError> {
        let config = self.config.as_ref().ok_or(EngineError::NotInitialized)?;

        Ok(StringState {
            energy: self.total_energy(config.coupling_constant),
            loops: self.loops.clone(),
            num_loops: self.loops.len(),
            total_splits: self.total_splits,
        })
    }
}
