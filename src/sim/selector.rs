//! Candidate scoring and selection
//!
//! Picks one sampled candidate per step, favouring turns, lateral and
//! vertical movement and gaps near the middle of the band, and penalising
//! lanes used recently. The pick is random among the top quarter so runs
//! never collapse into a single greedy line.
//!
//! When sampling yields nothing, a coarse fallback search runs instead and
//! finally a fixed minimal step, so every call places a block.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::grid::{GridOffset, GridPos};
use super::kinematics::Kinematics;
use super::preview::{SamplerObserver, SamplerPreview};
use super::sampler::{Candidate, clamp_to_track, sample_candidates};
use crate::consts::*;
use crate::settings::Tuning;

/// Reach ratio the centred-gap bonus peaks at
pub const TARGET_RATIO: f32 = 0.62;
/// Fallback dead zone (in blocks)
const FALLBACK_DEAD_ZONE_BLOCKS: f32 = 1.2;
/// Fallback keeps gaps within this share of reach
const FALLBACK_REACH_SHARE: f32 = 0.98;
const FALLBACK_MIN_REACH: f32 = 0.2;

const FALLBACK_DX: [i32; 7] = [-3, -2, -1, 0, 1, 2, 3];
const FALLBACK_DY: [i32; 3] = [-1, 0, 1];
const FALLBACK_DZ: [i32; 4] = [1, 2, 3, 4];

/// Minimal step: two blocks forward, never upward
const MINIMAL_DX: [i32; 5] = [-2, -1, 0, 1, 2];
const MINIMAL_DY: [i32; 2] = [-1, 0];
const MINIMAL_DZ: i32 = 2;

/// Horizontal heading of a placed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub dx: i32,
    pub dz: i32,
}

impl Heading {
    pub const FORWARD: Heading = Heading { dx: 0, dz: 1 };

    #[inline]
    fn length(&self) -> f32 {
        let len = (self.dx as f32).hypot(self.dz as f32);
        if len == 0.0 { 1.0 } else { len }
    }

    /// Cosine similarity between two headings
    pub fn similarity(&self, other: Heading) -> f32 {
        let dot = (self.dx * other.dx + self.dz * other.dz) as f32;
        dot / (self.length() * other.length())
    }
}

/// How a block was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickSource {
    /// Scored pick from the sampled candidates
    Sampled,
    /// Coarse fallback search
    Fallback,
    /// Fixed minimal step after the fallback ran out of trials
    Minimal,
}

/// Result of one generation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: GridPos,
    pub offset: GridOffset,
    pub source: PickSource,
}

/// Mutable generator memory carried between steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    /// Most recently placed block
    pub last_node: GridPos,
    /// Heading of the last step that changed direction
    pub previous_step: Heading,
    /// Consecutive steps repeating `previous_step`
    pub repeated_heading: u32,
    /// Lanes of the most recent placements (oldest first)
    pub recent_lanes: VecDeque<i32>,
    /// Blocks generated this run
    pub spawn_count: u32,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new(GridPos::new(0, 0, 0))
    }
}

impl GeneratorState {
    pub fn new(last_node: GridPos) -> Self {
        Self {
            last_node,
            previous_step: Heading::FORWARD,
            repeated_heading: 0,
            recent_lanes: VecDeque::with_capacity(RECENT_LANE_MEMORY + 1),
            spawn_count: 0,
        }
    }

    /// Whether the gentler opening profile applies
    #[inline]
    pub fn is_early(&self) -> bool {
        self.spawn_count < EARLY_SPAWN_COUNT
    }

    /// Times `sx` appears in the recent lane history
    pub fn lane_uses(&self, sx: i32) -> usize {
        self.recent_lanes.iter().filter(|&&lane| lane == sx).count()
    }

    /// Heuristic score of a candidate, before jitter
    pub fn score(&self, candidate: &Candidate) -> f32 {
        let heading = Heading {
            dx: candidate.offset.dx,
            dz: candidate.offset.dz,
        };
        let similarity = heading.similarity(self.previous_step);
        let turn_bonus = (1.0 - similarity) * 0.8;
        let lateral_bonus = (candidate.offset.dx.abs() as f32 * 0.36).min(1.3);
        let vertical_bonus = (candidate.offset.dy.abs() as f32 * 0.24).min(0.75);
        let centered_gap = 1.0 - (candidate.ratio - TARGET_RATIO).abs();
        let anti_repeat = if self.repeated_heading >= 2 {
            (1.0 - similarity) * 0.9
        } else {
            0.0
        };
        let lane_penalty = self.lane_uses(candidate.pos.sx) as f32 * 0.2;

        turn_bonus + lateral_bonus + vertical_bonus + centered_gap + anti_repeat - lane_penalty
    }

    /// Pick uniformly among the top quarter of jittered scores
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R, accepted: &[Candidate]) -> Option<Candidate> {
        if accepted.is_empty() {
            return None;
        }
        let mut scored: Vec<(f32, Candidate)> = accepted
            .iter()
            .map(|c| (rng.random::<f32>() * 0.34 + self.score(c), *c))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let top_count = (scored.len() / 4).max(1);
        scored[..top_count].choose(rng).map(|(_, c)| *c)
    }

    /// Place the next block after `last_node` and update the generator memory
    pub fn next_block<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        tuning: &Tuning,
        observer: Option<&mut (dyn SamplerObserver + '_)>,
    ) -> Placement {
        let kin = Kinematics::from_tuning(tuning);
        let last = self.last_node;
        let set = sample_candidates(rng, tuning, &kin, last, self.is_early());

        let placement = match self.select(rng, &set.accepted) {
            Some(pick) => Placement {
                pos: pick.pos,
                offset: pick.offset,
                source: PickSource::Sampled,
            },
            None => {
                log::debug!("No sampled candidate after {:?}, using fallback", last);
                fallback_block(rng, &kin, last)
            }
        };

        if let Some(observer) = observer {
            observer.observe(&SamplerPreview {
                sampled: &set.sampled,
                chosen: placement.offset,
                envelope: kin.reach_envelope(),
            });
        }

        self.commit(placement.pos);
        placement
    }

    /// Record a placed block as the new last node
    fn commit(&mut self, pos: GridPos) {
        let step = Heading {
            dx: pos.sx - self.last_node.sx,
            dz: pos.sz - self.last_node.sz,
        };
        if step == self.previous_step {
            self.repeated_heading += 1;
        } else {
            self.previous_step = step;
            self.repeated_heading = 0;
        }

        self.last_node = pos;
        self.spawn_count += 1;
        self.recent_lanes.push_back(pos.sx);
        while self.recent_lanes.len() > RECENT_LANE_MEMORY {
            self.recent_lanes.pop_front();
        }
    }
}

/// Coarse search used when sampling produced nothing.
///
/// Always returns: a trial that passes the dead zone and reach checks, or
/// the minimal forward step.
pub fn fallback_block<R: Rng + ?Sized>(rng: &mut R, kin: &Kinematics, last: GridPos) -> Placement {
    for _ in 0..FALLBACK_TRIALS {
        let pos = clamp_to_track(GridPos::new(
            last.sx + pick(rng, &FALLBACK_DX),
            last.sy + pick(rng, &FALLBACK_DY),
            last.sz + pick(rng, &FALLBACK_DZ),
        ));
        let offset = pos.offset_from(last);
        let distance = offset.horizontal_distance();
        if distance < BLOCK_SIZE * FALLBACK_DEAD_ZONE_BLOCKS {
            continue;
        }
        let Some(reach) = kin.reach_with_allowance(offset.delta_y()) else {
            continue;
        };
        if reach > FALLBACK_MIN_REACH && distance <= reach * FALLBACK_REACH_SHARE {
            return Placement {
                pos,
                offset,
                source: PickSource::Fallback,
            };
        }
    }

    log::warn!("Fallback search exhausted after {:?}, placing minimal step", last);
    let pos = clamp_to_track(GridPos::new(
        last.sx + pick(rng, &MINIMAL_DX),
        last.sy + pick(rng, &MINIMAL_DY),
        last.sz + MINIMAL_DZ,
    ));
    Placement {
        pos,
        offset: pos.offset_from(last),
        source: PickSource::Minimal,
    }
}

#[inline]
fn pick<R: Rng + ?Sized>(rng: &mut R, choices: &[i32]) -> i32 {
    choices[rng.random_range(0..choices.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn candidate(dx: i32, dy: i32, dz: i32, ratio: f32) -> Candidate {
        Candidate {
            pos: GridPos::new(dx, dy, 4 + dz),
            offset: GridOffset::new(dx, dy, dz),
            ratio,
        }
    }

    #[test]
    fn test_heading_similarity() {
        let fwd = Heading::FORWARD;
        assert!((fwd.similarity(Heading { dx: 0, dz: 3 }) - 1.0).abs() < 1e-6);
        assert!(fwd.similarity(Heading { dx: 2, dz: 0 }).abs() < 1e-6);
        // Zero length counts as unit length
        assert_eq!(fwd.similarity(Heading { dx: 0, dz: 0 }), 0.0);
    }

    #[test]
    fn test_turns_score_higher_than_straight() {
        let generator = GeneratorState::new(GridPos::new(0, 0, 4));
        let straight = candidate(0, 0, 3, TARGET_RATIO);
        let turn = candidate(2, 0, 2, TARGET_RATIO);
        assert!(generator.score(&turn) > generator.score(&straight));
    }

    #[test]
    fn test_lane_penalty() {
        let mut generator = GeneratorState::new(GridPos::new(0, 0, 4));
        let c = candidate(1, 0, 3, TARGET_RATIO);
        let fresh = generator.score(&c);
        generator.recent_lanes.extend([1, 1, 1]);
        assert!((fresh - generator.score(&c) - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_anti_repeat_kicks_in_after_two_repeats() {
        let mut generator = GeneratorState::new(GridPos::new(0, 0, 4));
        let turn = candidate(2, 0, 2, TARGET_RATIO);
        let before = generator.score(&turn);
        generator.repeated_heading = 2;
        assert!(generator.score(&turn) > before);
    }

    #[test]
    fn test_select_picks_from_top_quarter() {
        let generator = GeneratorState::new(GridPos::new(0, 0, 4));
        // One clearly best candidate among weak ones: top quarter of 4 is 1
        let best = candidate(3, 1, 2, TARGET_RATIO);
        let weak = [
            candidate(0, 0, 2, 0.2),
            candidate(0, 0, 3, 0.2),
            candidate(0, 0, 4, 0.2),
        ];
        let all = [weak[0], best, weak[1], weak[2]];
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(generator.select(&mut rng, &all), Some(best));
        }
        assert_eq!(generator.select(&mut rng, &[]), None);
    }

    #[test]
    fn test_commit_tracks_heading_and_lanes() {
        let mut generator = GeneratorState::new(GridPos::new(0, 0, 4));
        generator.commit(GridPos::new(0, 0, 5));
        assert_eq!(generator.repeated_heading, 1);
        generator.commit(GridPos::new(0, 0, 6));
        assert_eq!(generator.repeated_heading, 2);
        generator.commit(GridPos::new(2, 0, 8));
        assert_eq!(generator.repeated_heading, 0);
        assert_eq!(generator.previous_step, Heading { dx: 2, dz: 2 });

        for z in 0..20 {
            generator.commit(GridPos::new(1, 0, 10 + z));
        }
        assert_eq!(generator.recent_lanes.len(), RECENT_LANE_MEMORY);
        assert_eq!(generator.spawn_count, 23);
        assert!(!generator.is_early());
    }

    #[test]
    fn test_next_block_advances_and_reports() {
        let mut generator = GeneratorState::new(GridPos::new(0, 0, 4));
        let mut rng = Pcg32::seed_from_u64(99);
        let tuning = Tuning::default();
        let mut seen = Vec::new();
        let mut observer = |preview: &SamplerPreview<'_>| seen.push(preview.chosen);

        let placement = generator.next_block(&mut rng, &tuning, Some(&mut observer));
        assert_eq!(placement.source, PickSource::Sampled);
        assert!(placement.pos.sz > 4);
        assert_eq!(generator.last_node, placement.pos);
        assert_eq!(seen, vec![placement.offset]);
    }

    #[test]
    fn test_observer_does_not_change_picks() {
        let tuning = Tuning::default();
        let mut a = GeneratorState::new(GridPos::new(0, 0, 4));
        let mut b = a.clone();
        let mut rng_a = Pcg32::seed_from_u64(5);
        let mut rng_b = Pcg32::seed_from_u64(5);
        let mut count = 0;
        let mut observer = |_: &SamplerPreview<'_>| count += 1;
        for _ in 0..30 {
            let pa = a.next_block(&mut rng_a, &tuning, Some(&mut observer));
            let pb = b.next_block(&mut rng_b, &tuning, None);
            assert_eq!(pa, pb);
        }
        assert_eq!(count, 30);
    }

    #[test]
    fn test_fallback_result_is_valid() {
        let kin = Kinematics::from_tuning(&Tuning::default());
        let mut rng = Pcg32::seed_from_u64(17);
        for z in 0..50 {
            let last = GridPos::new(0, 0, z);
            let placement = fallback_block(&mut rng, &kin, last);
            assert!(placement.pos.sz > last.sz);
            if placement.source == PickSource::Fallback {
                let distance = placement.offset.horizontal_distance();
                let reach = kin.reach_with_allowance(placement.offset.delta_y()).unwrap();
                assert!(distance >= BLOCK_SIZE * 1.2);
                assert!(distance <= reach * 0.98);
            }
        }
    }

    #[test]
    fn test_minimal_step_when_nothing_reachable() {
        // Far too weak to clear any fallback gap
        let kin = Kinematics {
            jump_speed: 0.5,
            horizontal_speed: 0.1,
            gravity: 60.0,
            air_retain_per_sec: 0.8,
            jump_tightness: 100.0,
        };
        let mut rng = Pcg32::seed_from_u64(2);
        let last = GridPos::new(TRACK_HALF_WIDTH, TRACK_MIN_Y, 40);
        let placement = fallback_block(&mut rng, &kin, last);
        assert_eq!(placement.source, PickSource::Minimal);
        assert_eq!(placement.offset.dz, MINIMAL_DZ);
        assert!(placement.offset.dy <= 0);
        assert!(placement.pos.sy >= TRACK_MIN_Y);
        assert!(placement.offset.horizontal_distance() >= BLOCK_SIZE * FALLBACK_DEAD_ZONE_BLOCKS);
    }
}
