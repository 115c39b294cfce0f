//! Integer grid coordinates
//!
//! The track lives on a coarse lattice: `sx` is the lateral lane, `sy` the
//! height step and `sz` the forward step. World positions are derived with
//! `world_from_step`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::world_from_step;

/// A block position on the track lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub sx: i32,
    pub sy: i32,
    pub sz: i32,
}

impl GridPos {
    pub const fn new(sx: i32, sy: i32, sz: i32) -> Self {
        Self { sx, sy, sz }
    }

    /// Centre of the block in world space
    #[inline]
    pub fn world(&self) -> Vec3 {
        world_from_step(self.sx, self.sy, self.sz)
    }

    /// Offset from `from` to `self`
    #[inline]
    pub fn offset_from(&self, from: GridPos) -> GridOffset {
        GridOffset {
            dx: self.sx - from.sx,
            dy: self.sy - from.sy,
            dz: self.sz - from.sz,
        }
    }
}

/// Relative step between two lattice positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridOffset {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

impl GridOffset {
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    /// Horizontal world distance covered by this offset
    #[inline]
    pub fn horizontal_distance(&self) -> f32 {
        (self.dx as f32 * BLOCK_SIZE).hypot(self.dz as f32 * BLOCK_SIZE)
    }

    /// World height change of this offset
    #[inline]
    pub fn delta_y(&self) -> f32 {
        self.dy as f32 * HEIGHT_STEP
    }

    /// Offset in world units (for preview rendering)
    #[inline]
    pub fn world(&self) -> Vec3 {
        Vec3::new(
            self.dx as f32 * BLOCK_SIZE,
            self.dy as f32 * HEIGHT_STEP,
            self.dz as f32 * BLOCK_SIZE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from() {
        let a = GridPos::new(1, 0, 4);
        let b = GridPos::new(-1, 1, 7);
        assert_eq!(b.offset_from(a), GridOffset::new(-2, 1, 3));
    }

    #[test]
    fn test_horizontal_distance() {
        let off = GridOffset::new(3, 5, 4);
        assert!((off.horizontal_distance() - 12.0).abs() < 1e-4);
        assert!((off.delta_y() - 5.9).abs() < 1e-4);
    }
}
