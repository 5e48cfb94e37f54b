//! Generation driver
//!
//! Runs one episode per generation: asks the optimizer for a population,
//! ticks a fresh session until it ends (or a stop is requested between
//! ticks), reports every member's fitness back, and keeps the best decision
//! function seen so far for persistence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::brain::DecisionFunction;
use crate::error::{ConfigError, DriverError};
use crate::optimizer::{CandidateId, Optimizer};
use crate::persistence::{self, WinnerRecord};
use crate::settings::{SessionConfig, Settings};
use crate::sim::{EpisodePhase, Session, Shapes, Snapshot, tick};

/// Cooperative stop request, honoured only between ticks
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Read-only hook into a running episode
pub trait Observer {
    /// Whether [`Observer::on_tick`] should be called (snapshots allocate)
    fn wants_snapshots(&self) -> bool {
        true
    }

    /// Called after every tick with the session's new state
    fn on_tick(&mut self, _snapshot: &Snapshot) {}

    /// Called once a generation's fitness has been reported
    fn on_generation(&mut self, _report: &GenerationReport) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn wants_snapshots(&self) -> bool {
        false
    }
}

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEnd {
    Extinct,
    ScoreCapReached,
    /// Stop requested; fitness is whatever had accumulated
    Stopped,
}

/// Outcome of one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub ticks: u64,
    pub score: u32,
    pub end: EpisodeEnd,
    /// Every member's final fitness, ordered by id
    pub fitness: Vec<(CandidateId, f32)>,
}

impl GenerationReport {
    pub fn best(&self) -> Option<(CandidateId, f32)> {
        self.fitness
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn mean_fitness(&self) -> f32 {
        if self.fitness.is_empty() {
            return 0.0;
        }
        self.fitness.iter().map(|&(_, f)| f).sum::<f32>() / self.fitness.len() as f32
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub reports: Vec<GenerationReport>,
    pub winner: Option<WinnerRecord>,
    pub stopped: bool,
}

pub struct GenerationDriver<O: Optimizer> {
    settings: Settings,
    shapes: Shapes,
    optimizer: O,
    /// Next generation to run
    generation: u32,
    stop: StopSignal,
    winner: Option<WinnerRecord>,
}

impl<O: Optimizer> GenerationDriver<O> {
    /// Validates settings up front so no generation starts misconfigured
    pub fn new(settings: Settings, shapes: Shapes, optimizer: O) -> Result<Self, ConfigError> {
        settings.validate()?;
        shapes.validate()?;
        Ok(Self {
            settings,
            shapes,
            optimizer,
            generation: 0,
            stop: StopSignal::new(),
            winner: None,
        })
    }

    /// Handle for requesting a stop from another thread or an observer
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Best decision function seen so far
    pub fn winner(&self) -> Option<&WinnerRecord> {
        self.winner.as_ref()
    }

    fn session_config(&self, generation: u32) -> SessionConfig {
        SessionConfig {
            seed: self.settings.driver.episode_seed(generation),
            ..self.settings.session.clone()
        }
    }

    /// Run one generation's episode and report its fitness.
    pub fn run_generation(&mut self, observer: &mut dyn Observer) -> Result<GenerationReport, ConfigError> {
        let generation = self.generation;
        let population = self.optimizer.propose_population(generation);
        let config = self.session_config(generation);
        let period = self
            .settings
            .driver
            .paced
            .then(|| Duration::from_secs_f64(1.0 / self.settings.driver.ticks_per_second as f64));

        let mut session = Session::new(config, self.shapes.clone(), generation, &population)?;
        let mut stopped = false;
        loop {
            if self.stop.is_stopped() {
                stopped = true;
                break;
            }
            let started = Instant::now();
            let phase = tick(&mut session);
            if observer.wants_snapshots() {
                observer.on_tick(&session.snapshot());
            }
            if !phase.is_running() {
                break;
            }
            if let Some(period) = period {
                std::thread::sleep(period.saturating_sub(started.elapsed()));
            }
        }

        let end = match session.phase {
            _ if stopped => EpisodeEnd::Stopped,
            EpisodePhase::ScoreCapReached => EpisodeEnd::ScoreCapReached,
            _ => EpisodeEnd::Extinct,
        };
        let report = GenerationReport {
            generation,
            ticks: session.time_ticks,
            score: session.score,
            end,
            fitness: session.final_fitness(),
        };

        self.optimizer.report_fitness(generation, &report.fitness);
        if let Some((id, fitness)) = report.best() {
            let improved = self.winner.as_ref().is_none_or(|w| fitness > w.fitness);
            if improved {
                if let Some(candidate) = population.get(id.0) {
                    self.winner = Some(WinnerRecord::new(generation, id, fitness, candidate.export_state()));
                }
            }
        }

        log::info!(
            "Generation {generation}: {:?} after {} ticks, score {}, best {:.1}, mean {:.2}",
            report.end,
            report.ticks,
            report.score,
            report.best().map_or(0.0, |(_, f)| f),
            report.mean_fitness()
        );
        if stopped {
            log::warn!("Stop requested; generation {generation} ended early with partial fitness");
        }

        observer.on_generation(&report);
        self.generation += 1;
        Ok(report)
    }

    /// Run the configured number of generations, then persist the winner.
    pub fn run(&mut self, observer: &mut dyn Observer) -> Result<RunSummary, DriverError> {
        let mut reports = Vec::new();
        let target = self.generation + self.settings.driver.generations;
        while self.generation < target && !self.stop.is_stopped() {
            reports.push(self.run_generation(observer)?);
        }

        if let (Some(path), Some(winner)) = (&self.settings.driver.winner_path, &self.winner) {
            persistence::save_winner(path, winner)?;
        }

        Ok(RunSummary {
            reports,
            winner: self.winner.clone(),
            stopped: self.stop.is_stopped(),
        })
    }
}
