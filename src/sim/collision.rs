//! Silhouette collision between agents and obstacle pairs
//!
//! Tests occupied cells rather than bounding boxes, so near-misses past a
//! rounded agent or the inset shaft of a barrier do not count.

use glam::IVec2;

use super::agent::Agent;
use super::obstacle::Obstacle;

/// Offsets of the upper and lower barrier relative to the agent's origin
pub fn barrier_offsets(agent: &Agent, obstacle: &Obstacle) -> (IVec2, IVec2) {
    let dx = (obstacle.x - agent.x).round() as i32;
    let agent_y = agent.y.round();
    let upper = IVec2::new(dx, (obstacle.top - agent_y).round() as i32);
    let lower = IVec2::new(dx, (obstacle.bottom - agent_y).round() as i32);
    (upper, lower)
}

/// Whether the agent's silhouette overlaps either barrier
pub fn collides(agent: &Agent, obstacle: &Obstacle) -> bool {
    let (upper, lower) = barrier_offsets(agent, obstacle);
    let shape = agent.silhouette();
    shape.overlaps(obstacle.lower(), lower) || shape.overlaps(obstacle.upper(), upper)
}
