//! Gapflight - scoring flying agent populations against a scrolling obstacle field
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, silhouette collisions, session ticking)
//! - `brain`: Decision function contract and reference implementations
//! - `optimizer`: Optimizer contract plus stub and baseline search
//! - `driver`: Generation driver (episodes, fitness reporting, stop signal)
//! - `persistence`: Winner save/load with backup rotation
//! - `settings`: Data-driven session and driver configuration

pub mod brain;
pub mod driver;
pub mod error;
pub mod optimizer;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use brain::{ConstantBrain, DecisionFunction, Observation, Perceptron};
pub use driver::{EpisodeEnd, GenerationDriver, GenerationReport, NullObserver, Observer, RunSummary, StopSignal};
pub use error::{ConfigError, DecisionError, DriverError, PersistenceError};
pub use optimizer::{CandidateId, Optimizer, RandomSearch, StubOptimizer};
pub use settings::{DriverConfig, SessionConfig, Settings};

/// World configuration constants
pub mod consts {
    /// Nominal tick rate when paced for observation
    pub const TICKS_PER_SECOND: u32 = 30;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 500.0;
    pub const WORLD_HEIGHT: f32 = 800.0;

    /// Horizontal scroll speed shared by obstacles and ground (units/tick)
    pub const SCROLL_VELOCITY: f32 = 5.0;

    /// Agent spawn point
    pub const AGENT_SPAWN_X: f32 = 230.0;
    pub const AGENT_SPAWN_Y: f32 = 350.0;
    /// Agent silhouette size (cells)
    pub const AGENT_WIDTH: u32 = 68;
    pub const AGENT_HEIGHT: u32 = 48;

    /// Agent kinematics
    pub const JUMP_VELOCITY: f32 = -10.5;
    pub const GRAVITY_TERM: f32 = 1.5;
    /// Maximum downward displacement per tick
    pub const TERMINAL_DISPLACEMENT: f32 = 16.0;
    /// Extra lift applied to any upward displacement
    pub const ASCENT_BIAS: f32 = -2.0;

    /// Orientation hint (degrees, cosmetic only)
    pub const MAX_TILT: f32 = 25.0;
    pub const TILT_RATE: f32 = 20.0;
    pub const MIN_TILT: f32 = -90.0;
    /// Agent keeps its nose up while within this distance below its jump height
    pub const TILT_HOLD_WINDOW: f32 = 50.0;

    /// Obstacle geometry
    pub const GAP_SIZE: f32 = 200.0;
    pub const GAP_CENTER_MIN: i32 = 50;
    pub const GAP_CENTER_MAX: i32 = 450;
    pub const BARRIER_WIDTH: u32 = 104;
    pub const BARRIER_HEIGHT: u32 = 640;
    /// Rim at the gap end of each barrier (full width); the shaft is inset
    pub const BARRIER_RIM_HEIGHT: u32 = 48;
    pub const BARRIER_SHAFT_INSET: u32 = 4;
    /// Horizontal position of the first obstacle and of every spawned one
    pub const OBSTACLE_SPAWN_X: f32 = 600.0;

    /// Ground band
    pub const GROUND_Y: f32 = 730.0;
    pub const GROUND_TILE_WIDTH: f32 = 672.0;

    /// Scoring
    pub const SURVIVAL_REWARD: f32 = 0.1;
    pub const PASS_REWARD: f32 = 5.0;
    pub const COLLISION_PENALTY: f32 = 1.0;
    /// Decision outputs above this request a jump
    pub const JUMP_THRESHOLD: f32 = 0.5;
    /// Episode ends once the score exceeds this
    pub const SCORE_CAP: u32 = 50;

    /// Driver defaults
    pub const GENERATIONS: u32 = 50;
    pub const POPULATION_SIZE: usize = 50;
    /// Where the winner is written unless configured otherwise
    pub const WINNER_FILE: &str = "winner.json";
}
