//! Frame tick
//!
//! One call per animation frame: look, move, jump, fall, land, then keep
//! the track window in shape and update the best distance.

use glam::{Vec2, Vec3};

use super::state::{Hint, ParkourEvent, ParkourState};
use super::track::Platform;
use crate::consts::*;

/// Input intent for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Forward/back axis (-1..1)
    pub forward: f32,
    /// Right/left axis (-1..1)
    pub strafe: f32,
    /// Look delta in radians (x = yaw, y = pitch)
    pub look: Vec2,
    /// Jump pressed since the last frame
    pub jump: bool,
    /// Sneak held
    pub sneak: bool,
    /// Restart the run before simulating
    pub restart: bool,
}

/// Camera/body pose handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    pub position: Vec3,
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
}

/// Read-only result of a tick
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pose: PlayerPose,
    pub platforms: &'a [Platform],
    pub distance: u32,
    pub best: u32,
}

/// Advance the run by one frame of `dt` seconds (clamped to `MAX_FRAME_DT`)
pub fn tick<'a>(state: &'a mut ParkourState, input: &TickInput, dt: f32) -> Frame<'a> {
    if input.restart {
        state.restart();
    }

    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };
    state.time_ticks += 1;

    let player = &mut state.player;
    player.apply_look(input.look);
    player.update_movement(
        Vec2::new(input.strafe, input.forward),
        input.sneak,
        &state.tuning,
        state.track.platforms(),
        dt,
    );

    let prev_feet = player.feet_y();
    if input.jump && player.try_jump(state.tuning.jump_speed) {
        state.hint = Hint::Jumping;
        state.events.push(ParkourEvent::Jumped);
    }

    let was_grounded = player.grounded;
    player.integrate_vertical(state.tuning.gravity, dt);
    if let Some(platform) = player.resolve_ground(prev_feet, state.track.platforms()) {
        if !was_grounded {
            state.events.push(ParkourEvent::Landed { platform });
        }
    }

    let z = player.position.z;
    state.track.retire(z, dt);
    state.track.ensure_ahead(
        z,
        &mut state.rng,
        &state.tuning,
        state.observer.as_deref_mut(),
    );

    state.update_best();

    if state.player.recover_fall() {
        log::debug!("Player fell, respawned at {:?}", state.player.position);
        state.hint = Hint::Respawned;
        state.events.push(ParkourEvent::Respawned);
    }

    let player = &state.player;
    Frame {
        pose: PlayerPose {
            position: player.position,
            eye: player.eye(),
            yaw: player.yaw,
            pitch: player.pitch,
            grounded: player.grounded,
        },
        platforms: state.track.platforms(),
        distance: player.distance(),
        best: state.best.best,
    }
}
