//! Coordinator: spawns pipes, drives their growth, and retires old segments.

use crate::color::PipeColor;
use crate::config::PipesConfig;
use crate::error::ConfigError;
use crate::lattice::{GridCell, Lattice};
use crate::pipe::{GrowthCtx, Pipe, PipeId, PipeState, StepOutcome};
use crate::schedule::Timer;
use crate::sink::SegmentSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(PipeId),
    /// The random pick was already taken; nothing happened this tick.
    Occupied(GridCell),
    /// Every cell is taken. Only a reset frees space again.
    Full,
}

/// What one [`Field::update`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: Option<PipeId>,
    pub steps: usize,
    pub stopped: usize,
    pub retired: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub pipes: usize,
    pub growing: usize,
    pub stopped: usize,
    pub live_segments: usize,
    pub occupied_cells: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone)]
struct Runner {
    pipe: Pipe,
    growth: Timer,
}

pub struct Field {
    config: PipesConfig,
    lattice: Lattice,
    rng: oorandom::Rand32,
    // Only ever appended to; stopped pipes stay so their segments still retire.
    runners: Vec<Runner>,
    spawn_timer: Timer,
}

impl Field {
    /// The config is used as given; load it through [`PipesConfig::from_toml_str`]
    /// or [`PipesConfig::validate`] it first when it comes from outside.
    pub fn new(config: PipesConfig, seed: u64) -> Self {
        Self {
            lattice: Lattice::new(config.grid_size),
            rng: oorandom::Rand32::new(seed),
            runners: Vec::new(),
            spawn_timer: Timer::immediate(config.spawn_interval),
            config,
        }
    }

    pub fn config(&self) -> &PipesConfig {
        &self.config
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn pipes(&self) -> impl Iterator<Item = &Pipe> {
        self.runners.iter().map(|r| &r.pipe)
    }

    pub fn pipe(&self, id: PipeId) -> Option<&Pipe> {
        self.runners.get(id.0).map(|r| &r.pipe)
    }

    pub fn pipe_count(&self) -> usize {
        self.runners.len()
    }

    /// Runs one frame: spawn timer, due growth steps, then the retirement sweep.
    pub fn update(&mut self, now: f32, sink: &mut dyn SegmentSink) -> FrameReport {
        let mut report = FrameReport::default();

        if self.spawn_timer.is_due(now) {
            match self.spawn_tick(now, sink) {
                SpawnOutcome::Spawned(id) => {
                    report.spawned = Some(id);
                    self.spawn_timer.rearm(now);
                }
                // Timer stays due, so the next frame tries another cell.
                SpawnOutcome::Occupied(_) => {}
                SpawnOutcome::Full => self.spawn_timer.rearm(now),
            }
        }

        let Self {
            config,
            lattice,
            rng,
            runners,
            ..
        } = self;
        let config: &PipesConfig = config;
        let mut ctx = GrowthCtx {
            lattice,
            rng,
            sink: &mut *sink,
            config,
            now,
        };
        for runner in runners.iter_mut().filter(|r| r.pipe.is_growing()) {
            let ticks = runner.growth.poll(now, config.max_steps_per_frame);
            for _ in 0..ticks {
                report.steps += 1;
                match runner.pipe.step(&mut ctx) {
                    StepOutcome::Grew { .. } => {}
                    StepOutcome::BentAndStopped { .. } | StepOutcome::Stopped => {
                        report.stopped += 1;
                        break;
                    }
                    StepOutcome::Idle => break,
                }
            }
        }

        report.retired = self.retire_tick(now, sink);
        report
    }

    /// One spawn attempt at a uniformly random cell.
    pub fn spawn_tick(&mut self, now: f32, sink: &mut dyn SegmentSink) -> SpawnOutcome {
        if self.lattice.is_full() {
            log::debug!("spawn skipped, lattice is full");
            return SpawnOutcome::Full;
        }
        let cell = self.lattice.random_cell(&mut self.rng);
        if !self.lattice.mark_occupied(cell) {
            log::trace!("spawn skipped, {:?} is occupied", cell);
            return SpawnOutcome::Occupied(cell);
        }

        let id = PipeId(self.runners.len());
        let color = PipeColor::random_hsv(&mut self.rng);
        let mut ctx = GrowthCtx {
            lattice: &mut self.lattice,
            rng: &mut self.rng,
            sink,
            config: &self.config,
            now,
        };
        let pipe = Pipe::spawn(id, cell, color, &mut ctx);
        log::info!("spawned pipe {} at {:?}", id.0, cell);

        self.runners.push(Runner {
            pipe,
            // First step runs in the same frame as the spawn.
            growth: Timer::immediate(self.config.build_delay),
        });
        SpawnOutcome::Spawned(id)
    }

    /// Retires expired segments on every pipe, stopped ones included.
    pub fn retire_tick(&mut self, now: f32, sink: &mut dyn SegmentSink) -> usize {
        let lifetime = self.config.pipe_lifetime;
        let retired: usize = self
            .runners
            .iter_mut()
            .map(|r| r.pipe.retire_expired(now, lifetime, &mut *sink))
            .sum();
        if retired > 0 {
            log::trace!("retired {} segments at t={:.2}", retired, now);
        }
        retired
    }

    /// Destroys every segment and starts over with an empty lattice.
    ///
    /// The lattice is rebuilt with the current `grid_size`.
    pub fn reset(&mut self, sink: &mut dyn SegmentSink) {
        for runner in &mut self.runners {
            runner.pipe.clear(sink);
        }
        self.runners.clear();
        self.lattice = Lattice::new(self.config.grid_size);
        self.spawn_timer = Timer::immediate(self.config.spawn_interval);
        log::info!("field reset, grid size {}", self.config.grid_size);
    }

    /// Applies a new config. Timing and visual settings take effect immediately;
    /// a changed `grid_size` only applies on the next [`Field::reset`].
    pub fn reconfigure(&mut self, config: PipesConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.spawn_timer.set_interval(config.spawn_interval);
        for runner in &mut self.runners {
            runner.growth.set_interval(config.build_delay);
        }
        self.config = config;
        Ok(())
    }

    pub fn stats(&self) -> FieldStats {
        let mut stats = FieldStats {
            pipes: self.runners.len(),
            occupied_cells: self.lattice.occupied_count(),
            capacity: self.lattice.capacity(),
            ..FieldStats::default()
        };
        for runner in &self.runners {
            match runner.pipe.state() {
                PipeState::Growing => stats.growing += 1,
                PipeState::Stopped => stats.stopped += 1,
            }
            stats.live_segments += runner.pipe.segment_count();
        }
        stats
    }
}
