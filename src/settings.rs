//! Runtime tuning
//!
//! Every field has a documented range; setters clamp silently and never
//! reject input. Serializable as JSON so a run can be configured from a
//! file or the UI, but never stored between sessions.

use serde::{Deserialize, Serialize};

use crate::clamp;

/// Difficulty and physics tuning exposed to the UI sliders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Gap difficulty (0 - 100)
    pub difficulty: f32,
    /// Minimum gap as a percentage of max reach (0 - 95)
    pub min_separation: f32,
    /// Generation horizon in grid steps (8 - 96)
    pub future_jumps: u32,
    /// Ground run speed (4 - 20 m/s)
    pub move_speed: f32,
    /// Vertical launch speed (4 - 24 m/s)
    pub jump_speed: f32,
    /// Gravity magnitude (8 - 60 m/s²)
    pub gravity: f32,
    /// Fraction of horizontal speed kept per second airborne (0.8 - 0.99999)
    pub air_retain_per_sec: f32,
    /// Jump tightness (0 - 100); higher is a stricter target profile
    pub jump_tightness: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            difficulty: 58.0,
            min_separation: 34.0,
            future_jumps: 28,
            move_speed: 10.2,
            jump_speed: 11.2,
            gravity: 30.0,
            air_retain_per_sec: 0.97,
            jump_tightness: 52.0,
        }
    }
}

impl Tuning {
    pub const MIN_FUTURE_JUMPS: u32 = 8;
    pub const MAX_FUTURE_JUMPS: u32 = 96;

    pub fn set_difficulty(&mut self, value: f32) {
        self.difficulty = clamp(value, 0.0, 100.0);
    }

    pub fn set_min_separation(&mut self, value: f32) {
        self.min_separation = clamp(value, 0.0, 95.0);
    }

    /// Rounded to the nearest whole step
    pub fn set_future_jumps(&mut self, value: f32) {
        let rounded = clamp(
            value.round(),
            Self::MIN_FUTURE_JUMPS as f32,
            Self::MAX_FUTURE_JUMPS as f32,
        );
        self.future_jumps = rounded as u32;
    }

    pub fn set_move_speed(&mut self, value: f32) {
        self.move_speed = clamp(value, 4.0, 20.0);
    }

    pub fn set_jump_speed(&mut self, value: f32) {
        self.jump_speed = clamp(value, 4.0, 24.0);
    }

    pub fn set_gravity(&mut self, value: f32) {
        self.gravity = clamp(value, 8.0, 60.0);
    }

    pub fn set_air_retain_per_sec(&mut self, value: f32) {
        self.air_retain_per_sec = clamp(value, 0.8, 0.99999);
    }

    pub fn set_jump_tightness(&mut self, value: f32) {
        self.jump_tightness = clamp(value, 0.0, 100.0);
    }

    /// Re-apply every setter so values from outside (JSON, sliders) are in range
    pub fn clamped(self) -> Self {
        let mut out = self;
        out.set_difficulty(self.difficulty);
        out.set_min_separation(self.min_separation);
        out.set_future_jumps(self.future_jumps as f32);
        out.set_move_speed(self.move_speed);
        out.set_jump_speed(self.jump_speed);
        out.set_gravity(self.gravity);
        out.set_air_retain_per_sec(self.air_retain_per_sec);
        out.set_jump_tightness(self.jump_tightness);
        out
    }

    /// Difficulty as 0 - 1
    #[inline]
    pub fn difficulty_fraction(&self) -> f32 {
        clamp(self.difficulty / 100.0, 0.0, 1.0)
    }

    /// Tightness as 0 - 1
    #[inline]
    pub fn tightness_fraction(&self) -> f32 {
        clamp(self.jump_tightness / 100.0, 0.0, 1.0)
    }

    /// Largest accepted reach ratio for the current difficulty
    #[inline]
    pub fn max_ratio(&self) -> f32 {
        0.78 + self.difficulty_fraction() * 0.2
    }

    /// User minimum separation as a reach ratio
    #[inline]
    pub fn min_separation_ratio(&self) -> f32 {
        clamp(self.min_separation / 100.0, 0.0, 0.94)
    }
}
