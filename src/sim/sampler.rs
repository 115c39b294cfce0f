//! Candidate sampler
//!
//! Draws random lattice offsets ahead of the last placed block and keeps
//! the ones whose gap, measured against the jump's reach, lies inside the
//! difficulty band. Fixed draw budget, so cost per step is bounded.

use std::collections::HashSet;

use rand::Rng;

use super::grid::{GridOffset, GridPos};
use super::kinematics::Kinematics;
use crate::clamp;
use crate::consts::*;
use crate::settings::Tuning;

/// Horizontal dead zone around the source block (in blocks)
pub const DEAD_ZONE_BLOCKS: f32 = 1.22;
/// Reaches at or below this are not worth sampling against
const MIN_USEFUL_REACH: f32 = 0.35;
/// Early-run ceiling on the reach ratio
const EARLY_MAX_RATIO: f32 = 0.93;

/// A reachable next-block position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub pos: GridPos,
    pub offset: GridOffset,
    /// Horizontal distance / (reach + landing allowance)
    pub ratio: f32,
}

/// Draw ranges and acceptance band for one generation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleBounds {
    pub early: bool,
    pub min_forward: i32,
    pub max_forward: i32,
    pub max_lateral: i32,
    pub max_up: i32,
    pub max_down: i32,
    /// Probability of nudging a draw one step up
    pub upward_bias: f32,
    /// Pull back toward the target track height
    pub vertical_correction: f32,
    pub min_ratio: f32,
    pub max_ratio: f32,
}

impl SampleBounds {
    pub fn new(tuning: &Tuning, kin: &Kinematics, last: GridPos, early: bool) -> Self {
        let d = tuning.difficulty_fraction();
        let difficulty_max = tuning.max_ratio();
        let same_height = kin.reach_with_allowance(0.0).unwrap_or(0.0);

        let max_steps = ((same_height / BLOCK_SIZE).floor() as i32 + 1).clamp(2, 12);
        let desired_min_forward = if early {
            1
        } else {
            ((1.0 + d * 1.8).round() as i32).max(1)
        };
        let min_forward = desired_min_forward.min(max_steps).max(1);
        let max_forward = min_forward.max(max_steps);
        let max_lateral = if early {
            max_forward.clamp(1, 2)
        } else {
            ((max_forward as f32 * (0.66 + d * 0.24)).floor() as i32).max(1)
        };
        let max_vertical = if early {
            1
        } else {
            ((1.0 + d * 2.0).floor() as i32).max(1)
        };

        let user_min = tuning.min_separation_ratio();
        let min_ratio = clamp(
            if early { user_min * 0.5 } else { user_min },
            0.04,
            difficulty_max - 0.06,
        );
        let max_ratio = if early { EARLY_MAX_RATIO } else { difficulty_max };

        Self {
            early,
            min_forward,
            max_forward,
            max_lateral,
            max_up: max_vertical,
            max_down: max_vertical,
            upward_bias: 0.55 + d * 0.3,
            vertical_correction: clamp((TRACK_TARGET_Y - last.sy) as f32 * 0.12, -0.35, 0.45),
            min_ratio,
            max_ratio,
        }
    }

    /// Whether a reach ratio lies inside the acceptance band
    #[inline]
    pub fn accepts_ratio(&self, ratio: f32) -> bool {
        ratio >= self.min_ratio && ratio <= self.max_ratio
    }
}

/// Result of one sampling pass
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    /// Distinct candidates that passed every check
    pub accepted: Vec<Candidate>,
    /// Every drawn offset, for the preview only
    pub sampled: Vec<GridOffset>,
}

/// Ratio of an offset's gap to the jump's reach, `None` if the height is unreachable
pub fn reach_ratio(kin: &Kinematics, offset: GridOffset) -> Option<f32> {
    let reach = kin.reach_with_allowance(offset.delta_y())?;
    if reach <= MIN_USEFUL_REACH {
        return None;
    }
    Some(offset.horizontal_distance() / reach)
}

/// Clamp a target into the track's lane and height band
pub fn clamp_to_track(pos: GridPos) -> GridPos {
    GridPos {
        sx: pos.sx.clamp(-TRACK_HALF_WIDTH, TRACK_HALF_WIDTH),
        sy: pos.sy.clamp(TRACK_MIN_Y, TRACK_MAX_Y),
        sz: pos.sz,
    }
}

/// Sample candidate positions for the block after `last`
pub fn sample_candidates<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &Tuning,
    kin: &Kinematics,
    last: GridPos,
    early: bool,
) -> SampleSet {
    let bounds = SampleBounds::new(tuning, kin, last, early);
    let dead_zone = BLOCK_SIZE * DEAD_ZONE_BLOCKS;
    let mut set = SampleSet {
        accepted: Vec::new(),
        sampled: Vec::with_capacity(SPARSE_SAMPLE_COUNT),
    };
    let mut seen = HashSet::new();

    for _ in 0..SPARSE_SAMPLE_COUNT {
        let dz = rng.random_range(bounds.min_forward..=bounds.max_forward);
        let dx = rng.random_range(-bounds.max_lateral..=bounds.max_lateral);
        let mut dy = rng.random_range(-bounds.max_down..=bounds.max_up);
        if rng.random::<f32>() < bounds.upward_bias + bounds.vertical_correction {
            dy += 1;
        }
        let dy = dy.clamp(-bounds.max_down, bounds.max_up);

        let target = clamp_to_track(GridPos::new(last.sx + dx, last.sy + dy, last.sz + dz));
        let offset = target.offset_from(last);
        set.sampled.push(offset);

        if target.sy <= TRACK_MIN_Y && offset.dy < 0 {
            continue;
        }
        if target == last {
            continue;
        }
        if offset.horizontal_distance() < dead_zone {
            continue;
        }
        let Some(ratio) = reach_ratio(kin, offset) else {
            continue;
        };
        if !bounds.accepts_ratio(ratio) {
            continue;
        }
        if !seen.insert(target) {
            continue;
        }

        set.accepted.push(Candidate {
            pos: target,
            offset,
            ratio,
        });
    }

    set
}
