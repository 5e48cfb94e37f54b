//! Scrolling ground band
//!
//! Two tiles leapfrog each other to form a continuous floor. Purely a boundary
//! and visual reference; it does not take part in collision.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    /// Ground line (agents below it are out of bounds)
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
    pub tile_width: f32,
}

impl Ground {
    pub fn new(y: f32, tile_width: f32) -> Self {
        Self {
            y,
            x1: 0.0,
            x2: tile_width,
            tile_width,
        }
    }

    pub fn advance(&mut self, velocity: f32) {
        self.x1 -= velocity;
        self.x2 -= velocity;

        if self.x1 + self.tile_width < 0.0 {
            self.x1 = self.x2 + self.tile_width;
        }
        if self.x2 + self.tile_width < 0.0 {
            self.x2 = self.x1 + self.tile_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_tiles_stay_adjacent() {
        let mut ground = Ground::new(GROUND_Y, GROUND_TILE_WIDTH);
        for _ in 0..2000 {
            ground.advance(SCROLL_VELOCITY);
            let gap = (ground.x1 - ground.x2).abs();
            assert_eq!(gap, GROUND_TILE_WIDTH);
            assert!(ground.x1.min(ground.x2) + GROUND_TILE_WIDTH >= 0.0);
        }
    }
}
