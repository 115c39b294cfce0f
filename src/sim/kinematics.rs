//! Jump kinematics
//!
//! Closed-form projectile reach under constant gravity and exponential
//! horizontal air drag. Built from a `Tuning` on every generation step so
//! slider changes take effect on the next block.

use serde::{Deserialize, Serialize};

use crate::clamp;
use crate::consts::*;
use crate::settings::Tuning;

/// Drag constants below this are treated as drag-free
const DRAG_EPSILON: f32 = 1e-4;

/// Kinematic parameters of a jump
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Vertical launch speed
    pub jump_speed: f32,
    /// Horizontal launch speed assumed for generation
    pub horizontal_speed: f32,
    /// Gravity magnitude (positive)
    pub gravity: f32,
    /// Fraction of horizontal speed kept per airborne second
    pub air_retain_per_sec: f32,
    /// Tightness (0 - 100)
    pub jump_tightness: f32,
}

impl Kinematics {
    /// Kinematics the generator plans with for the given tuning.
    ///
    /// Higher tightness lowers the effective launch profile a little but
    /// never collapses reach.
    pub fn from_tuning(tuning: &Tuning) -> Self {
        let tightness = tuning.tightness_fraction();
        Self {
            jump_speed: tuning.jump_speed,
            horizontal_speed: tuning.move_speed * clamp(1.02 - tightness * 0.32, 0.55, 1.1),
            gravity: tuning.gravity,
            air_retain_per_sec: tuning.air_retain_per_sec,
            jump_tightness: tuning.jump_tightness,
        }
    }

    /// Signed vertical acceleration (negative is down)
    #[inline]
    pub fn gravity_accel(&self) -> f32 {
        -self.gravity
    }

    /// Exponential decay constant of horizontal speed
    #[inline]
    pub fn drag_constant(&self) -> f32 {
        -clamp(self.air_retain_per_sec, 0.7, 0.99999).ln()
    }

    /// Time until the jump arc comes back down to `delta_y` above the launch point.
    ///
    /// Returns `None` when the target height is above the apex.
    pub fn flight_time(&self, delta_y: f32) -> Option<f32> {
        let g = self.gravity_accel();
        let v0 = self.jump_speed;
        if g >= 0.0 {
            return None;
        }
        let discriminant = v0 * v0 + 2.0 * g * delta_y;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let t1 = (-v0 + root) / g;
        let t2 = (-v0 - root) / g;
        [t1, t2]
            .into_iter()
            .filter(|t| *t > 0.0 && t.is_finite())
            .reduce(f32::max)
    }

    /// Horizontal distance covered during the flight to `delta_y`, with drag.
    pub fn max_horizontal_reach(&self, delta_y: f32) -> Option<f32> {
        let t = self.flight_time(delta_y)?;
        let v0 = self.horizontal_speed;
        let k = self.drag_constant();
        let raw = if k < DRAG_EPSILON {
            v0 * t
        } else {
            // 1 - e^(-kt) via exp_m1 to keep precision for small k
            v0 * -(-k * t).exp_m1() / k
        };
        Some(raw.max(0.0))
    }

    /// Extra reach granted for landing on any part of the target block.
    /// Widens as tightness drops.
    pub fn landing_allowance(&self) -> f32 {
        let tightness = clamp(self.jump_tightness / 100.0, 0.0, 1.0);
        BLOCK_SIZE * (0.55 + (1.0 - tightness) * 0.8)
    }

    /// Reach plus landing allowance, the denominator of the reach ratio
    pub fn reach_with_allowance(&self, delta_y: f32) -> Option<f32> {
        self.max_horizontal_reach(delta_y)
            .map(|reach| reach + self.landing_allowance())
    }

    /// Apex height of a standing jump
    pub fn max_jump_height(&self) -> f32 {
        if self.gravity <= 0.001 {
            return 0.0;
        }
        self.jump_speed * self.jump_speed / (2.0 * self.gravity)
    }

    /// Envelope of reachable space drawn by the sampler preview
    pub fn reach_envelope(&self) -> ReachEnvelope {
        let reach = self.reach_with_allowance(0.0).unwrap_or(0.0);
        ReachEnvelope {
            radius: reach.max(5.0),
            peak: (self.max_jump_height() + HEIGHT_STEP * 0.45).max(1.8),
            floor: TRACK_MIN_Y as f32 * HEIGHT_STEP,
        }
    }
}

/// Paraboloid bounding the reachable offsets around a launch block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachEnvelope {
    /// Horizontal radius at the floor
    pub radius: f32,
    /// Apex height above the launch block
    pub peak: f32,
    /// Lowest height considered
    pub floor: f32,
}

impl ReachEnvelope {
    /// Horizontal radius of the envelope at height `y`
    pub fn radius_at(&self, y: f32) -> f32 {
        let peak = self.peak.max(self.floor + 0.4);
        let span = peak - self.floor;
        let normalized = clamp((peak - y) / span, 0.0, 1.0);
        self.radius.max(3.0) * normalized.sqrt()
    }
}

/// Widest same-height gap the generator may produce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxSeparation {
    pub meters: f32,
    pub blocks: f32,
}

/// Same-height reach scaled by the difficulty's max ratio
pub fn max_separation(tuning: &Tuning) -> MaxSeparation {
    let kin = Kinematics::from_tuning(tuning);
    let same_height = kin.reach_with_allowance(0.0).unwrap_or(0.0);
    let meters = same_height * tuning.max_ratio();
    MaxSeparation {
        meters,
        blocks: meters / BLOCK_SIZE,
    }
}
