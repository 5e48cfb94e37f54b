//! Occupied-cell bitmasks for precise collision
//!
//! A silhouette is the exact shape an entity occupies, independent of how it
//! is drawn. Rows are packed into `u64` words, least significant bit first.

use glam::IVec2;

/// Packed bitmask of occupied cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Silhouette {
    width: u32,
    height: u32,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl Silhouette {
    /// Silhouette with no occupied cells
    pub fn empty(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            words_per_row,
            bits: vec![0; words_per_row * height as usize],
        }
    }

    /// Fully occupied rectangle
    pub fn filled(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// Build a silhouette by sampling `occupied` at every cell
    pub fn from_fn(width: u32, height: u32, occupied: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::empty(width, height);
        for y in 0..height {
            for x in 0..width {
                if occupied(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Parse rows of text where `#` marks an occupied cell
    pub fn from_ascii(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let height = rows.len() as u32;
        let mut mask = Self::empty(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    mask.set(x as u32, y as u32, true);
                }
            }
        }
        mask
    }

    /// Ellipse inscribed in the bounding box (default agent shape)
    pub fn ellipse(width: u32, height: u32) -> Self {
        let rx = width as f32 / 2.0;
        let ry = height as f32 / 2.0;
        Self::from_fn(width, height, |x, y| {
            let dx = (x as f32 + 0.5 - rx) / rx;
            let dy = (y as f32 + 0.5 - ry) / ry;
            dx * dx + dy * dy <= 1.0
        })
    }

    /// Lower barrier shape: full-width rim on top, inset shaft below.
    ///
    /// The upper barrier is this shape flipped vertically.
    pub fn barrier(width: u32, height: u32, rim_height: u32, shaft_inset: u32) -> Self {
        Self::from_fn(width, height, |x, y| {
            y < rim_height || (x >= shaft_inset && x + shaft_inset < width)
        })
    }

    /// Mirror top to bottom
    pub fn flipped_vertical(&self) -> Self {
        let mut flipped = Self::empty(self.width, self.height);
        for y in 0..self.height {
            let src = self.row(y);
            let dst = (self.height - 1 - y) as usize * self.words_per_row;
            flipped.bits[dst..dst + self.words_per_row].copy_from_slice(src);
        }
        flipped
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn row(&self, y: u32) -> &[u64] {
        let start = y as usize * self.words_per_row;
        &self.bits[start..start + self.words_per_row]
    }

    /// Whether the cell is occupied (out-of-range cells are empty)
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let word = self.row(y)[(x / 64) as usize];
        word & (1u64 << (x % 64)) != 0
    }

    pub fn set(&mut self, x: u32, y: u32, occupied: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.words_per_row + (x / 64) as usize;
        let bit = 1u64 << (x % 64);
        if occupied {
            self.bits[idx] |= bit;
        } else {
            self.bits[idx] &= !bit;
        }
    }

    /// Number of occupied cells
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// First cell (in `self` coordinates) where `other`, placed at `offset`
    /// relative to `self`'s origin, overlaps `self`.
    ///
    /// Scan order is row-major, so the result is deterministic.
    pub fn overlap(&self, other: &Silhouette, offset: IVec2) -> Option<IVec2> {
        let x_start = offset.x.max(0);
        let x_end = offset.x.saturating_add(other.width as i32).min(self.width as i32);
        let y_start = offset.y.max(0);
        let y_end = offset.y.saturating_add(other.height as i32).min(self.height as i32);
        if x_start >= x_end || y_start >= y_end {
            return None;
        }

        for y in y_start..y_end {
            let other_y = (y - offset.y) as u32;
            for x in x_start..x_end {
                if self.get(x as u32, y as u32) && other.get((x - offset.x) as u32, other_y) {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Whether `other` placed at `offset` shares any occupied cell with `self`
    #[inline]
    pub fn overlaps(&self, other: &Silhouette, offset: IVec2) -> bool {
        self.overlap(other, offset).is_some()
    }
}
