//! Player physics
//!
//! First-person capsule integrated once per frame: horizontal motion with
//! separate ground and air handling, gravity and jumping, landing on
//! platform tops, and respawn after a fall.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::track::Platform;
use crate::clamp;
use crate::consts::*;
use crate::settings::Tuning;

/// Landing band above the platform top (current feet)
const LAND_ABOVE_TOLERANCE: f32 = 0.2;
/// Landing band below the platform top (previous feet)
const LAND_BELOW_TOLERANCE: f32 = 0.58;
/// Vertical band for the sneak support test
const SUPPORT_TOLERANCE: f32 = 0.26;
/// Height added to the last safe position on respawn
const RESPAWN_LIFT: f32 = 0.5;
/// Look direction at spawn: facing +Z, down the track
pub const SPAWN_YAW: f32 = std::f32::consts::PI;
pub const SPAWN_PITCH: f32 = -0.03;

/// The player's body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Capsule centre
    pub position: Vec3,
    /// Vertical velocity lives in `y`; x/z are unused
    pub velocity: Vec3,
    /// Horizontal velocity (y always 0)
    pub horizontal_velocity: Vec3,
    pub grounded: bool,
    /// Where the player last stood on a platform
    pub last_safe_position: Vec3,
    /// Look yaw (radians, PI faces +Z)
    pub yaw: f32,
    /// Look pitch (radians, clamped to +-MAX_PITCH)
    pub pitch: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::spawn()
    }
}

impl PlayerState {
    /// Standing on the start platform, facing down the track
    pub fn spawn() -> Self {
        let position = Vec3::new(0.0, BLOCK_HEIGHT + PLAYER_HEIGHT * 0.5 + 0.01, 0.0);
        Self {
            position,
            velocity: Vec3::ZERO,
            horizontal_velocity: Vec3::ZERO,
            grounded: true,
            last_safe_position: position,
            yaw: SPAWN_YAW,
            pitch: SPAWN_PITCH,
        }
    }

    #[inline]
    pub fn feet_y(&self) -> f32 {
        self.position.y - PLAYER_HEIGHT * 0.5
    }

    /// Camera position
    #[inline]
    pub fn eye(&self) -> Vec3 {
        self.position + Vec3::Y * EYE_OFFSET
    }

    /// Turn the view by a yaw/pitch delta (radians)
    pub fn apply_look(&mut self, delta: Vec2) {
        self.yaw -= delta.x;
        self.pitch = clamp(self.pitch - delta.y, -MAX_PITCH, MAX_PITCH);
    }

    /// Horizontal view direction
    pub fn forward_dir(&self) -> Vec3 {
        let dir = Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos());
        if dir.length_squared() > 1e-6 {
            dir.normalize()
        } else {
            Vec3::Z
        }
    }

    /// Horizontal right-hand direction
    pub fn right_dir(&self) -> Vec3 {
        self.forward_dir().cross(Vec3::Y).normalize()
    }

    /// Integrate horizontal motion.
    ///
    /// `axes` is (strafe, forward) in -1..1. Sneaking on the ground slows the
    /// player and refuses to walk off an edge.
    pub fn update_movement(
        &mut self,
        axes: Vec2,
        sneak: bool,
        tuning: &Tuning,
        platforms: &[Platform],
        dt: f32,
    ) {
        let prev_x = self.position.x;
        let prev_z = self.position.z;

        let axes = if axes.length_squared() > 1.0 {
            axes.normalize()
        } else {
            axes
        };
        let mut move_world = self.forward_dir() * axes.y + self.right_dir() * axes.x;
        let has_input = move_world.length_squared() > 1e-6;
        if has_input {
            move_world = move_world.normalize();
        }

        let sneak_active = sneak && self.grounded;
        let target_speed = tuning.move_speed
            * if sneak_active {
                SNEAK_SPEED_MULTIPLIER
            } else {
                1.0
            };
        let desired = if has_input {
            move_world * target_speed
        } else {
            Vec3::ZERO
        };

        if self.grounded {
            let response = if has_input {
                GROUND_ACCEL_RESPONSE
            } else {
                GROUND_BRAKE_RESPONSE
            };
            self.steer_toward(desired, response * dt);

            if !has_input {
                let friction = (1.0 - GROUND_FRICTION * dt).max(0.0);
                self.horizontal_velocity *= friction;
                if self.horizontal_velocity.length() < REST_SPEED_EPSILON {
                    self.horizontal_velocity = Vec3::ZERO;
                }
            }
        } else {
            // Keep most of the jump momentum, allow a little mid-air correction
            self.horizontal_velocity *= tuning.air_retain_per_sec.powf(dt);
            if has_input {
                self.steer_toward(desired, AIR_STEER_ACCEL * dt);
            }
        }

        self.position.x += self.horizontal_velocity.x * dt;
        self.position.z += self.horizontal_velocity.z * dt;

        if sneak_active {
            self.guard_edge(prev_x, prev_z, platforms);
        }
    }

    /// Move horizontal velocity toward `desired` by at most `max_delta`
    fn steer_toward(&mut self, desired: Vec3, max_delta: f32) {
        let delta = Vec3::new(
            desired.x - self.horizontal_velocity.x,
            0.0,
            desired.z - self.horizontal_velocity.z,
        );
        let delta_mag = delta.length();
        if delta_mag > max_delta && delta_mag > 1e-6 {
            self.horizontal_velocity += delta * (max_delta / delta_mag);
        } else {
            self.horizontal_velocity.x = desired.x;
            self.horizontal_velocity.z = desired.z;
        }
    }

    /// Undo a sneaking step that left all support, sliding along whichever
    /// axis is still supported
    fn guard_edge(&mut self, prev_x: f32, prev_z: f32, platforms: &[Platform]) {
        let feet = self.feet_y();
        let (x, z) = (self.position.x, self.position.z);
        if has_support_at(platforms, x, z, feet, SNEAK_EDGE_MARGIN) {
            return;
        }
        if has_support_at(platforms, x, prev_z, feet, SNEAK_EDGE_MARGIN) {
            self.position.z = prev_z;
        } else if has_support_at(platforms, prev_x, z, feet, SNEAK_EDGE_MARGIN) {
            self.position.x = prev_x;
        } else {
            self.position.x = prev_x;
            self.position.z = prev_z;
        }
        self.horizontal_velocity = Vec3::ZERO;
    }

    /// Jump if standing on something. Returns true when the jump happened.
    pub fn try_jump(&mut self, jump_speed: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.velocity.y = jump_speed;
        self.grounded = false;
        true
    }

    /// Apply gravity and integrate vertical position
    pub fn integrate_vertical(&mut self, gravity: f32, dt: f32) {
        self.velocity.y -= gravity * dt;
        self.position.y += self.velocity.y * dt;
    }

    /// Snap onto a platform top crossed this tick. Updates `grounded` and
    /// the last safe position; returns the landed platform's id.
    pub fn resolve_ground(&mut self, prev_feet_y: f32, platforms: &[Platform]) -> Option<u32> {
        let feet = self.feet_y();
        let mut landed = None;

        for platform in platforms.iter().filter(|p| p.is_solid()) {
            let dx = (self.position.x - platform.center.x).abs();
            let dz = (self.position.z - platform.center.z).abs();
            if dx > platform.half_w + PLAYER_RADIUS || dz > platform.half_d + PLAYER_RADIUS {
                continue;
            }
            if feet <= platform.top_y + LAND_ABOVE_TOLERANCE
                && prev_feet_y >= platform.top_y - LAND_BELOW_TOLERANCE
                && self.velocity.y <= 0.0
            {
                self.position.y = platform.top_y + PLAYER_HEIGHT * 0.5;
                self.velocity.y = 0.0;
                self.last_safe_position = self.position;
                landed = Some(platform.id);
                break;
            }
        }

        self.grounded = landed.is_some();
        landed
    }

    /// Respawn at the last safe spot after falling off the world.
    /// Returns true when a respawn happened.
    pub fn recover_fall(&mut self) -> bool {
        if self.position.y > FALL_FLOOR_Y {
            return false;
        }
        self.position = self.last_safe_position + Vec3::Y * RESPAWN_LIFT;
        self.velocity = Vec3::ZERO;
        self.horizontal_velocity = Vec3::ZERO;
        self.grounded = false;
        true
    }

    /// Whole grid steps travelled down the track
    pub fn distance(&self) -> u32 {
        (self.position.z / BLOCK_SIZE).floor().max(0.0) as u32
    }
}

/// Whether a solid platform top supports feet at (x, z), shrunk by `margin`
pub fn has_support_at(platforms: &[Platform], x: f32, z: f32, feet_y: f32, margin: f32) -> bool {
    platforms.iter().filter(|p| p.is_solid()).any(|p| {
        let limit_x = (p.half_w - (PLAYER_RADIUS + margin)).max(0.01);
        let limit_z = (p.half_d - (PLAYER_RADIUS + margin)).max(0.01);
        (x - p.center.x).abs() <= limit_x
            && (z - p.center.z).abs() <= limit_z
            && (feet_y - p.top_y).abs() <= SUPPORT_TOLERANCE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::GridPos;

    const DT: f32 = 1.0 / 120.0;

    fn start_platforms() -> Vec<Platform> {
        vec![
            Platform::new(1, GridPos::new(0, 0, 0), 3.0, 3.0, true),
            Platform::new(2, GridPos::new(0, 0, 2), 1.0, 1.0, true),
        ]
    }

    /// One frame of the vertical part of the tick
    fn settle(player: &mut PlayerState, platforms: &[Platform]) {
        let prev = player.feet_y();
        player.integrate_vertical(30.0, DT);
        player.resolve_ground(prev, platforms);
    }

    #[test]
    fn test_spawn_faces_track() {
        let player = PlayerState::spawn();
        let fwd = player.forward_dir();
        assert!(fwd.z > 0.999);
        assert!((player.right_dir().x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_rests_on_start_platform() {
        let platforms = start_platforms();
        let mut player = PlayerState::spawn();
        settle(&mut player, &platforms);
        assert!(player.grounded);
        assert!((player.feet_y() - 1.0).abs() < 1e-5);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn test_ground_friction_snaps_to_rest() {
        let platforms = start_platforms();
        let tuning = Tuning::default();
        let mut player = PlayerState::spawn();
        player.horizontal_velocity = Vec3::new(0.0, 0.0, 10.0);

        let mut last_speed = player.horizontal_velocity.length();
        let mut stopped = false;
        for _ in 0..120 {
            player.update_movement(Vec2::ZERO, false, &tuning, &platforms, DT);
            settle(&mut player, &platforms);
            assert!(player.grounded);
            let speed = player.horizontal_velocity.length();
            assert!(speed < last_speed || speed == 0.0);
            if speed == 0.0 {
                stopped = true;
                break;
            }
            assert!(speed >= REST_SPEED_EPSILON);
            last_speed = speed;
        }
        assert!(stopped);
        assert_eq!(player.horizontal_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_ground_accel_is_rate_limited() {
        let platforms = start_platforms();
        let tuning = Tuning::default();
        let mut player = PlayerState::spawn();
        player.update_movement(Vec2::new(0.0, 1.0), false, &tuning, &platforms, DT);
        let speed = player.horizontal_velocity.length();
        assert!((speed - GROUND_ACCEL_RESPONSE * DT).abs() < 1e-4);
        assert!(player.horizontal_velocity.z > 0.0);
    }

    #[test]
    fn test_air_keeps_momentum() {
        let tuning = Tuning::default();
        let mut player = PlayerState::spawn();
        player.grounded = false;
        player.horizontal_velocity = Vec3::new(0.0, 0.0, 8.0);
        player.update_movement(Vec2::ZERO, false, &tuning, &[], 0.5);
        let expected = 8.0 * tuning.air_retain_per_sec.powf(0.5);
        assert!((player.horizontal_velocity.z - expected).abs() < 1e-4);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut player = PlayerState::spawn();
        assert!(player.try_jump(11.2));
        assert_eq!(player.velocity.y, 11.2);
        assert!(!player.grounded);
        assert!(!player.try_jump(11.2));
    }

    #[test]
    fn test_jump_lands_back_on_platform() {
        let platforms = start_platforms();
        let mut player = PlayerState::spawn();
        player.try_jump(11.2);
        let mut landed = None;
        for _ in 0..240 {
            let prev = player.feet_y();
            player.integrate_vertical(30.0, DT);
            landed = player.resolve_ground(prev, &platforms);
            if landed.is_some() {
                break;
            }
        }
        assert_eq!(landed, Some(1));
        assert!(player.grounded);
        assert!((player.feet_y() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rising_player_passes_through_top() {
        let platforms = start_platforms();
        let mut player = PlayerState::spawn();
        player.position.y = 1.0 + PLAYER_HEIGHT * 0.5 - 0.1;
        player.grounded = false;
        player.velocity.y = 5.0;
        let prev = player.feet_y();
        assert_eq!(player.resolve_ground(prev, &platforms), None);
        assert!(!player.grounded);
    }

    #[test]
    fn test_fading_platform_is_not_solid() {
        let mut platforms = start_platforms();
        platforms.push(Platform::new(3, GridPos::new(0, 0, 8), 1.0, 1.0, false));
        platforms[2].phase = crate::sim::track::PlatformPhase::Fading { elapsed: 0.2 };

        let mut player = PlayerState::spawn();
        player.position = Vec3::new(0.0, 1.0 + PLAYER_HEIGHT * 0.5 + 0.05, 8.0 * BLOCK_SIZE);
        player.grounded = false;
        settle(&mut player, &platforms);
        assert!(!player.grounded);
    }

    #[test]
    fn test_fall_recovery() {
        let mut player = PlayerState::spawn();
        let safe = Vec3::new(1.0, 3.0, 12.0);
        player.last_safe_position = safe;
        player.position.y = -10.0;
        assert!(!player.recover_fall());

        player.position.y = -30.5;
        player.velocity.y = -40.0;
        player.horizontal_velocity = Vec3::new(1.0, 0.0, 2.0);
        assert!(player.recover_fall());
        assert_eq!(player.position, safe + Vec3::Y * 0.5);
        assert_eq!(player.velocity, Vec3::ZERO);
        assert_eq!(player.horizontal_velocity, Vec3::ZERO);
        assert!(!player.grounded);
    }

    #[test]
    fn test_sneak_stops_at_edge() {
        let platforms = vec![Platform::new(1, GridPos::new(0, 0, 0), 1.0, 1.0, true)];
        let tuning = Tuning::default();
        let mut player = PlayerState::spawn();
        for _ in 0..600 {
            player.update_movement(Vec2::new(0.0, 1.0), true, &tuning, &platforms, DT);
            settle(&mut player, &platforms);
        }
        assert!(player.grounded);
        let limit = 1.2 - (PLAYER_RADIUS + SNEAK_EDGE_MARGIN);
        assert!(player.position.z <= limit + 1e-4);
    }

    #[test]
    fn test_look_clamps_pitch() {
        let mut player = PlayerState::spawn();
        player.apply_look(Vec2::new(0.5, -5.0));
        assert_eq!(player.pitch, MAX_PITCH);
        assert!((player.yaw - (SPAWN_YAW - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_distance() {
        let mut player = PlayerState::spawn();
        assert_eq!(player.distance(), 0);
        player.position.z = 24.1;
        assert_eq!(player.distance(), 10);
        player.position.z = -5.0;
        assert_eq!(player.distance(), 0);
    }
}
