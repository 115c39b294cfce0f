//! Voxel Parkour - an endless first-person jumping track
//!
//! Core modules:
//! - `sim`: Deterministic simulation (jump kinematics, track generation, player physics)
//! - `settings`: Runtime tuning with clamped setters
//! - `best`: Best distance record
//! - `persistence`: Key/value storage backends
//! - `web`: Browser bindings (wasm32 only)

pub mod best;
pub mod persistence;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use best::BestDistance;
pub use settings::Tuning;

use glam::Vec3;

/// World configuration constants
pub mod consts {
    /// Largest frame delta the simulation will integrate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Block footprint edge length (metres)
    pub const BLOCK_SIZE: f32 = 2.4;
    pub const BLOCK_HEIGHT: f32 = 1.0;
    /// World height of one vertical grid step
    pub const HEIGHT_STEP: f32 = 1.18;

    /// Player capsule
    pub const PLAYER_HEIGHT: f32 = 1.8;
    pub const PLAYER_RADIUS: f32 = 0.34;
    pub const EYE_OFFSET: f32 = 0.68;

    /// Platforms further behind than this start fading out
    pub const FADE_START_DISTANCE: f32 = 20.0;
    /// Fade-out duration (seconds)
    pub const FADE_DURATION: f32 = 1.3;
    /// Platforms further behind than this are dropped immediately
    pub const DESPAWN_DISTANCE: f32 = 42.0;

    /// Random draws per generation step
    pub const SPARSE_SAMPLE_COUNT: usize = 220;
    /// Trials in the coarse fallback search
    pub const FALLBACK_TRIALS: usize = 48;
    /// Generation steps that use the gentler early-run profile
    pub const EARLY_SPAWN_COUNT: u32 = 8;
    /// Lane placements remembered for the lane penalty
    pub const RECENT_LANE_MEMORY: usize = 10;

    /// Vertical track band, in grid steps
    pub const TRACK_TARGET_Y: i32 = 0;
    pub const TRACK_MIN_Y: i32 = -2;
    pub const TRACK_MAX_Y: i32 = 10;
    /// Lateral lane limit, in grid steps either side of the centre line
    pub const TRACK_HALF_WIDTH: i32 = 11;

    /// Ground/air handling
    pub const GROUND_ACCEL_RESPONSE: f32 = 30.0;
    pub const GROUND_BRAKE_RESPONSE: f32 = 70.0;
    pub const GROUND_FRICTION: f32 = 10.5;
    pub const AIR_STEER_ACCEL: f32 = 2.4;
    /// Horizontal speeds below this snap to rest on the ground
    pub const REST_SPEED_EPSILON: f32 = 0.025;
    pub const SNEAK_SPEED_MULTIPLIER: f32 = 0.38;
    pub const SNEAK_EDGE_MARGIN: f32 = 0.1;

    /// Falling below this height respawns the player
    pub const FALL_FLOOR_Y: f32 = -30.0;
    /// Look pitch limit (radians)
    pub const MAX_PITCH: f32 = 1.35;
}

/// Clamp helper that tolerates NaN by mapping it to `min`
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// World-space centre of the block at a grid position
#[inline]
pub fn world_from_step(sx: i32, sy: i32, sz: i32) -> Vec3 {
    use consts::*;
    Vec3::new(
        sx as f32 * BLOCK_SIZE,
        sy as f32 * HEIGHT_STEP + BLOCK_HEIGHT * 0.5,
        sz as f32 * BLOCK_SIZE,
    )
}

/// Grid step along the track axis for a world z coordinate
#[inline]
pub fn step_from_z(z: f32) -> i32 {
    (z / consts::BLOCK_SIZE).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_from_step() {
        let p = world_from_step(1, 2, -3);
        assert!((p.x - 2.4).abs() < 1e-5);
        assert!((p.y - (2.36 + 0.5)).abs() < 1e-5);
        assert!((p.z + 7.2).abs() < 1e-5);
    }

    #[test]
    fn test_step_from_z_floors_negative() {
        assert_eq!(step_from_z(0.0), 0);
        assert_eq!(step_from_z(2.39), 0);
        assert_eq!(step_from_z(2.4), 1);
        assert_eq!(step_from_z(-0.1), -1);
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp(f32::NAN, 1.0, 2.0), 1.0);
        assert_eq!(clamp(5.0, 1.0, 2.0), 2.0);
    }
}
