//! Flying agent kinematics
//!
//! Displacement is recomputed from ticks-since-jump every tick rather than
//! accumulated, so an agent's motion is a pure function of its jump history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::silhouette::Silhouette;
use crate::consts::*;
use crate::optimizer::CandidateId;

/// Vertical displacement after `ticks` ticks since a jump with velocity `v0`.
///
/// Downward displacement is capped at [`TERMINAL_DISPLACEMENT`]; any upward
/// displacement gets the extra [`ASCENT_BIAS`].
#[inline]
pub fn displacement(v0: f32, ticks: u32) -> f32 {
    let t = ticks as f32;
    let mut d = v0 * t + GRAVITY_TERM * t * t;
    if d >= TERMINAL_DISPLACEMENT {
        d = TERMINAL_DISPLACEMENT;
    }
    if d < 0.0 {
        d += ASCENT_BIAS;
    }
    d
}

/// A flying agent
#[derive(Debug, Clone)]
pub struct Agent {
    /// Optimizer candidate this agent flies for
    pub candidate: CandidateId,
    /// Horizontal position (fixed during flight)
    pub x: f32,
    /// Vertical position (screen coordinates, grows downward)
    pub y: f32,
    /// Velocity set by the last jump (0 before the first jump)
    pub vel: f32,
    /// Ticks since the last jump or since spawn
    pub tick_count: u32,
    /// Height at the last jump (only feeds the orientation hint)
    pub jump_height: f32,
    /// Orientation hint in degrees (cosmetic only)
    pub tilt: f32,
    /// Displacement applied on the most recent tick
    pub last_displacement: f32,
    silhouette: Arc<Silhouette>,
}

impl Agent {
    pub fn new(candidate: CandidateId, x: f32, y: f32, silhouette: Arc<Silhouette>) -> Self {
        Self {
            candidate,
            x,
            y,
            vel: 0.0,
            tick_count: 0,
            jump_height: y,
            tilt: 0.0,
            last_displacement: 0.0,
            silhouette,
        }
    }

    /// Kick upward and restart the displacement curve
    pub fn jump(&mut self) {
        self.vel = JUMP_VELOCITY;
        self.tick_count = 0;
        self.jump_height = self.y;
    }

    /// Advance one fixed tick, jumping first if requested
    pub fn advance(&mut self, jump_requested: bool) {
        if jump_requested {
            self.jump();
        }

        self.tick_count += 1;
        let d = displacement(self.vel, self.tick_count);
        self.y += d;
        self.last_displacement = d;

        if d < 0.0 || self.y < self.jump_height + TILT_HOLD_WINDOW {
            if self.tilt < MAX_TILT {
                self.tilt = MAX_TILT;
            }
        } else if self.tilt > MIN_TILT {
            self.tilt = (self.tilt - TILT_RATE).max(MIN_TILT);
        }
    }

    #[inline]
    pub fn silhouette(&self) -> &Silhouette {
        &self.silhouette
    }

    /// Lower edge of the occupied box
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.silhouette.height() as f32
    }

    /// Whether the agent has left the world vertically
    pub fn out_of_bounds(&self, ground_y: f32) -> bool {
        let bottom = self.bottom();
        bottom > ground_y || bottom < 0.0
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            candidate: self.candidate,
            x: self.x,
            y: self.y,
            tilt: self.tilt,
        }
    }
}

/// Read-only agent state handed to observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub candidate: CandidateId,
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
}
