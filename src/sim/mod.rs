//! Deterministic simulation module
//!
//! All episode logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one per session)
//! - Stable iteration order (population order, obstacles oldest first)
//! - No rendering or platform dependencies

pub mod agent;
pub mod collision;
pub mod ground;
pub mod obstacle;
pub mod population;
pub mod silhouette;
pub mod state;
pub mod tick;

pub use agent::{Agent, AgentView, displacement};
pub use collision::collides;
pub use ground::Ground;
pub use obstacle::{BarrierShapes, Obstacle, ObstacleView};
pub use population::Population;
pub use silhouette::Silhouette;
pub use state::{EpisodePhase, Session, Shapes, Snapshot};
pub use tick::{sensing_index, tick};
