//! Obstacle pairs (upper and lower barrier around a gap)

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::silhouette::Silhouette;

/// Barrier shapes shared by every obstacle in a session
#[derive(Debug, Clone)]
pub struct BarrierShapes {
    pub upper: Arc<Silhouette>,
    pub lower: Arc<Silhouette>,
}

impl BarrierShapes {
    /// Upper barrier is the lower one mirrored so both rims face the gap
    pub fn from_lower(lower: Silhouette) -> Self {
        let upper = lower.flipped_vertical();
        Self {
            upper: Arc::new(upper),
            lower: Arc::new(lower),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.upper.width().max(self.lower.width())
    }

    #[inline]
    pub fn barrier_height(&self) -> u32 {
        self.upper.height()
    }
}

/// One obstacle pair
#[derive(Debug, Clone)]
pub struct Obstacle {
    /// Left edge
    pub x: f32,
    /// Gap center height
    pub height: f32,
    /// Top edge of the upper barrier (`height - barrier_height`)
    pub top: f32,
    /// Top edge of the lower barrier (`height + gap`)
    pub bottom: f32,
    /// Set once an agent has flown past
    pub passed: bool,
    shapes: BarrierShapes,
}

impl Obstacle {
    /// Obstacle at `x` with an explicit gap center
    pub fn with_height(x: f32, height: f32, gap: f32, shapes: BarrierShapes) -> Self {
        Self {
            x,
            height,
            top: height - shapes.barrier_height() as f32,
            bottom: height + gap,
            passed: false,
            shapes,
        }
    }

    /// Obstacle at `x` with a gap center drawn uniformly from `[min, max)`
    pub fn spawn<R: Rng>(
        x: f32,
        gap_range: (i32, i32),
        gap: f32,
        shapes: BarrierShapes,
        rng: &mut R,
    ) -> Self {
        let height = rng.random_range(gap_range.0..gap_range.1) as f32;
        Self::with_height(x, height, gap, shapes)
    }

    /// Scroll left by one tick
    #[inline]
    pub fn advance(&mut self, velocity: f32) {
        self.x -= velocity;
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.shapes.width() as f32
    }

    #[inline]
    pub fn right_edge(&self) -> f32 {
        self.x + self.width()
    }

    /// Right edge has scrolled past the left boundary
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.right_edge() < 0.0
    }

    #[inline]
    pub fn upper(&self) -> &Silhouette {
        &self.shapes.upper
    }

    #[inline]
    pub fn lower(&self) -> &Silhouette {
        &self.shapes.lower
    }

    pub fn view(&self) -> ObstacleView {
        ObstacleView {
            x: self.x,
            top: self.top,
            height: self.height,
            bottom: self.bottom,
            passed: self.passed,
        }
    }
}

/// Read-only obstacle state handed to observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub x: f32,
    pub top: f32,
    pub height: f32,
    pub bottom: f32,
    pub passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn shapes() -> BarrierShapes {
        BarrierShapes::from_lower(Silhouette::barrier(
            BARRIER_WIDTH,
            BARRIER_HEIGHT,
            BARRIER_RIM_HEIGHT,
            BARRIER_SHAFT_INSET,
        ))
    }

    #[test]
    fn test_extents_from_height() {
        let o = Obstacle::with_height(600.0, 300.0, GAP_SIZE, shapes());
        assert_eq!(o.top, 300.0 - BARRIER_HEIGHT as f32);
        assert_eq!(o.bottom, 500.0);
        assert!(!o.passed);
    }

    #[test]
    fn test_spawn_height_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let o = Obstacle::spawn(
                OBSTACLE_SPAWN_X,
                (GAP_CENTER_MIN, GAP_CENTER_MAX),
                GAP_SIZE,
                shapes(),
                &mut rng,
            );
            assert!(o.height >= GAP_CENTER_MIN as f32 && o.height < GAP_CENTER_MAX as f32);
            assert_eq!(o.height.fract(), 0.0);
        }
    }

    #[test]
    fn test_off_screen_after_scrolling_past_edge() {
        let mut o = Obstacle::with_height(0.0, 200.0, GAP_SIZE, shapes());
        let mut ticks = 0;
        while !o.is_off_screen() {
            o.advance(SCROLL_VELOCITY);
            ticks += 1;
        }
        // 104 / 5 -> right edge at -1 after 21 ticks
        assert_eq!(ticks, 21);
        assert!(o.right_edge() < 0.0);
    }
}
