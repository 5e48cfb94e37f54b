//! Session and driver settings
//!
//! Loaded from a JSON file; missing fields fall back to the world constants.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, PersistenceError};

/// Rules and geometry for one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for obstacle gap heights
    pub seed: u64,
    /// Where every agent starts
    pub agent_spawn: Vec2,
    /// Vertical opening between barriers
    pub gap_size: f32,
    /// Gap center drawn from `[min, max)`
    pub gap_center_range: (i32, i32),
    /// World scroll speed (units/tick)
    pub scroll_velocity: f32,
    /// Where the first and every later obstacle appears
    pub obstacle_spawn_x: f32,
    pub ground_y: f32,
    pub ground_tile_width: f32,
    /// Episode ends once the score exceeds this
    pub score_cap: u32,
    pub survival_reward: f32,
    pub pass_reward: f32,
    pub collision_penalty: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            agent_spawn: Vec2::new(AGENT_SPAWN_X, AGENT_SPAWN_Y),
            gap_size: GAP_SIZE,
            gap_center_range: (GAP_CENTER_MIN, GAP_CENTER_MAX),
            scroll_velocity: SCROLL_VELOCITY,
            obstacle_spawn_x: OBSTACLE_SPAWN_X,
            ground_y: GROUND_Y,
            ground_tile_width: GROUND_TILE_WIDTH,
            score_cap: SCORE_CAP,
            survival_reward: SURVIVAL_REWARD,
            pass_reward: PASS_REWARD,
            collision_penalty: COLLISION_PENALTY,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("agent_spawn.x", self.agent_spawn.x),
            ("agent_spawn.y", self.agent_spawn.y),
            ("obstacle_spawn_x", self.obstacle_spawn_x),
            ("ground_y", self.ground_y),
            ("ground_tile_width", self.ground_tile_width),
            ("survival_reward", self.survival_reward),
            ("pass_reward", self.pass_reward),
            ("collision_penalty", self.collision_penalty),
        ];
        if let Some(&(field, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { field, value });
        }
        if !self.gap_size.is_finite() || self.gap_size <= 0.0 {
            return Err(ConfigError::InvalidGap(self.gap_size));
        }
        if self.score_cap == 0 {
            return Err(ConfigError::InvalidScoreCap);
        }
        let (min, max) = self.gap_center_range;
        if min >= max {
            return Err(ConfigError::EmptyGapRange { min, max });
        }
        if !self.scroll_velocity.is_finite() || self.scroll_velocity <= 0.0 {
            return Err(ConfigError::InvalidScrollVelocity(self.scroll_velocity));
        }
        if self.ground_tile_width <= 0.0 {
            return Err(ConfigError::InvalidTileWidth(self.ground_tile_width));
        }
        Ok(())
    }
}

/// How generations are run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub generations: u32,
    pub population_size: usize,
    /// Episode seeds derive from this and the generation index
    pub base_seed: u64,
    /// Sleep between ticks to run at `ticks_per_second`
    pub paced: bool,
    pub ticks_per_second: u32,
    /// Where the best decision function is written; `None` keeps it in memory
    pub winner_path: Option<PathBuf>,
    /// Perturbation scale for the baseline search
    pub search_scale: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            generations: GENERATIONS,
            population_size: POPULATION_SIZE,
            base_seed: 0,
            paced: false,
            ticks_per_second: TICKS_PER_SECOND,
            winner_path: Some(PathBuf::from(WINNER_FILE)),
            search_scale: 0.2,
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generations == 0 {
            return Err(ConfigError::InvalidGenerations);
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.paced && self.ticks_per_second == 0 {
            return Err(ConfigError::InvalidPacing);
        }
        Ok(())
    }

    /// Seed for the episode of `generation`
    pub fn episode_seed(&self, generation: u32) -> u64 {
        self.base_seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(generation as u64)
    }
}

/// Complete run settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionConfig,
    pub driver: DriverConfig,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let json = std::fs::read(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_slice(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.driver.validate()
    }
}
