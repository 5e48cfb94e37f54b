//! Session state and construction
//!
//! A session is one generation's episode: the obstacle field, the ground, the
//! population and the score. Everything it needs (config, shapes, seed) is
//! supplied up front and validated before any tick runs.

use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentView};
use super::ground::Ground;
use super::obstacle::{BarrierShapes, Obstacle, ObstacleView};
use super::population::Population;
use super::silhouette::Silhouette;
use crate::brain::DecisionFunction;
use crate::consts::*;
use crate::error::ConfigError;
use crate::optimizer::CandidateId;
use crate::settings::SessionConfig;

/// Current phase of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// Ticks still advance the world
    Running,
    /// Every agent has been removed
    Extinct,
    /// Score went past the configured cap
    ScoreCapReached,
}

impl EpisodePhase {
    #[inline]
    pub fn is_running(self) -> bool {
        self == EpisodePhase::Running
    }
}

/// Collision shapes supplied at construction
#[derive(Debug, Clone)]
pub struct Shapes {
    pub agent: Arc<Silhouette>,
    pub barriers: BarrierShapes,
}

impl Shapes {
    pub fn new(agent: Silhouette, lower_barrier: Silhouette) -> Self {
        Self {
            agent: Arc::new(agent),
            barriers: BarrierShapes::from_lower(lower_barrier),
        }
    }

    /// Rounded agent and rimmed barriers at the standard world sizes
    pub fn standard() -> Self {
        Self::new(
            Silhouette::ellipse(AGENT_WIDTH, AGENT_HEIGHT),
            Silhouette::barrier(
                BARRIER_WIDTH,
                BARRIER_HEIGHT,
                BARRIER_RIM_HEIGHT,
                BARRIER_SHAFT_INSET,
            ),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.is_empty() {
            return Err(ConfigError::EmptySilhouette("agent"));
        }
        if self.barriers.lower.is_empty() || self.barriers.upper.is_empty() {
            return Err(ConfigError::EmptySilhouette("barrier"));
        }
        Ok(())
    }
}

impl Default for Shapes {
    fn default() -> Self {
        Self::standard()
    }
}

/// One episode
pub struct Session<'a, D: ?Sized> {
    pub config: SessionConfig,
    /// Generation this episode scores
    pub generation: u32,
    /// Obstacles cleared
    pub score: u32,
    /// Ticks executed
    pub time_ticks: u64,
    pub phase: EpisodePhase,
    /// Oldest (leftmost) first
    pub obstacles: Vec<Obstacle>,
    pub ground: Ground,
    pub population: Population<'a, D>,
    shapes: Shapes,
    pub(crate) rng: Pcg32,
}

impl<'a, D: DecisionFunction + ?Sized> Session<'a, D> {
    /// Build an episode with one agent per decision function.
    ///
    /// Rejects invalid configuration, empty shapes, an empty population and
    /// malformed decision functions before any tick runs.
    pub fn new(
        config: SessionConfig,
        shapes: Shapes,
        generation: u32,
        brains: impl IntoIterator<Item = &'a D>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        shapes.validate()?;

        let mut population = Population::new();
        for (index, brain) in brains.into_iter().enumerate() {
            brain
                .validate()
                .map_err(|reason| ConfigError::MalformedDecisionFunction { index, reason })?;
            let agent = Agent::new(
                CandidateId(index),
                config.agent_spawn.x,
                config.agent_spawn.y,
                shapes.agent.clone(),
            );
            population.push(agent, brain);
        }
        if population.is_empty() {
            return Err(ConfigError::EmptyPopulation);
        }

        let mut rng = Pcg32::seed_from_u64(config.seed);
        let first = Obstacle::spawn(
            config.obstacle_spawn_x,
            config.gap_center_range,
            config.gap_size,
            shapes.barriers.clone(),
            &mut rng,
        );
        let ground = Ground::new(config.ground_y, config.ground_tile_width);

        log::debug!(
            "Generation {generation}: session with {} agents, seed {}",
            population.len(),
            config.seed
        );

        Ok(Self {
            config,
            generation,
            score: 0,
            time_ticks: 0,
            phase: EpisodePhase::Running,
            obstacles: vec![first],
            ground,
            population,
            shapes,
            rng,
        })
    }
}

impl<D: ?Sized> Session<'_, D> {
    pub fn shapes(&self) -> &Shapes {
        &self.shapes
    }

    /// New obstacle at the spawn position with a random gap
    pub(crate) fn spawn_obstacle(&mut self) -> Obstacle {
        Obstacle::spawn(
            self.config.obstacle_spawn_x,
            self.config.gap_center_range,
            self.config.gap_size,
            self.shapes.barriers.clone(),
            &mut self.rng,
        )
    }

    /// Obstacle at `x` with a fixed gap center, using this session's shapes
    pub fn obstacle_at(&self, x: f32, height: f32) -> Obstacle {
        Obstacle::with_height(x, height, self.config.gap_size, self.shapes.barriers.clone())
    }

    /// Fitness of every member (removed or live), ordered by candidate id
    pub fn final_fitness(&self) -> Vec<(CandidateId, f32)> {
        self.population.final_fitness()
    }

    /// Read-only view for observers
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            tick: self.time_ticks,
            score: self.score,
            phase: self.phase,
            agents: self.population.agents().iter().map(Agent::view).collect(),
            obstacles: self.obstacles.iter().map(Obstacle::view).collect(),
            ground: self.ground,
        }
    }
}

/// Immutable per-tick view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: u32,
    pub tick: u64,
    pub score: u32,
    pub phase: EpisodePhase,
    pub agents: Vec<AgentView>,
    pub obstacles: Vec<ObstacleView>,
    pub ground: Ground,
}
