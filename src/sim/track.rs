//! Track window
//!
//! Owns the live platforms and the generator memory. Keeps a chain of
//! blocks at least `future_jumps` steps ahead of the player, fades out
//! blocks left behind, and trims the window when the horizon shrinks.
//!
//! Platform lifecycle: `Active -> Fading -> removed`. Start platforms stay
//! `Active` for the whole run.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::GridPos;
use super::preview::SamplerObserver;
use super::selector::{GeneratorState, Placement};
use crate::consts::*;
use crate::settings::Tuning;
use crate::{clamp, step_from_z};

/// Extra steps kept beyond the horizon before reconciling trims them
const RECONCILE_SLACK: i32 = 2;

/// Platform lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlatformPhase {
    Active,
    /// Fading out; removed once `elapsed` reaches `FADE_DURATION`
    Fading { elapsed: f32 },
}

/// A block the player can stand on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub grid: GridPos,
    /// World-space centre
    pub center: Vec3,
    /// Footprint half extents (x, z)
    pub half_w: f32,
    pub half_d: f32,
    /// World height of the top face
    pub top_y: f32,
    /// Start platforms never fade
    pub is_start: bool,
    pub phase: PlatformPhase,
}

impl Platform {
    pub fn new(id: u32, grid: GridPos, x_scale: f32, z_scale: f32, is_start: bool) -> Self {
        let center = grid.world();
        Self {
            id,
            grid,
            center,
            half_w: BLOCK_SIZE * 0.5 * x_scale,
            half_d: BLOCK_SIZE * 0.5 * z_scale,
            top_y: center.y + BLOCK_HEIGHT * 0.5,
            is_start,
            phase: PlatformPhase::Active,
        }
    }

    /// Fading platforms are no longer solid
    #[inline]
    pub fn is_solid(&self) -> bool {
        self.is_start || self.phase == PlatformPhase::Active
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        matches!(self.phase, PlatformPhase::Fading { .. })
    }

    /// Render opacity (1 = fully visible)
    pub fn opacity(&self) -> f32 {
        match self.phase {
            PlatformPhase::Active => 1.0,
            PlatformPhase::Fading { elapsed } => 1.0 - clamp(elapsed / FADE_DURATION, 0.0, 1.0),
        }
    }
}

/// The live platform window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    platforms: Vec<Platform>,
    generator: GeneratorState,
    next_id: u32,
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl Track {
    /// Empty track; call `seed` to lay out a run
    pub fn new() -> Self {
        Self {
            platforms: Vec::new(),
            generator: GeneratorState::default(),
            next_id: 1,
        }
    }

    /// Live platforms, in placement order
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn generator(&self) -> &GeneratorState {
        &self.generator
    }

    /// Most recently placed block
    pub fn last_node(&self) -> GridPos {
        self.generator.last_node
    }

    fn push_platform(&mut self, grid: GridPos, scale: f32, is_start: bool) {
        let id = self.next_id;
        self.next_id += 1;
        self.platforms.push(Platform::new(id, grid, scale, scale, is_start));
    }

    /// Clear the track and lay out the opening blocks plus one horizon of jumps
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        tuning: &Tuning,
        mut observer: Option<&mut (dyn SamplerObserver + '_)>,
    ) {
        self.platforms.clear();
        self.push_platform(GridPos::new(0, 0, 0), 3.0, true);
        self.push_platform(GridPos::new(0, 0, 2), 1.0, true);
        self.push_platform(GridPos::new(0, 0, 4), 1.0, false);
        self.generator = GeneratorState::new(GridPos::new(0, 0, 4));

        for _ in 0..tuning.future_jumps {
            self.generate_next(rng, tuning, observer.as_deref_mut());
        }
        log::debug!(
            "Seeded track with {} platforms, last node {:?}",
            self.platforms.len(),
            self.generator.last_node
        );
    }

    /// Run one generation step and add the chosen block
    pub fn generate_next<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        tuning: &Tuning,
        observer: Option<&mut (dyn SamplerObserver + '_)>,
    ) -> Placement {
        let placement = self.generator.next_block(rng, tuning, observer);
        self.push_platform(placement.pos, 1.0, false);
        placement
    }

    /// Generate until the last node is `future_jumps` steps past the player.
    ///
    /// Every step advances at least one grid step, so this terminates.
    pub fn ensure_ahead<R: Rng + ?Sized>(
        &mut self,
        player_z: f32,
        rng: &mut R,
        tuning: &Tuning,
        mut observer: Option<&mut (dyn SamplerObserver + '_)>,
    ) -> usize {
        let target = step_from_z(player_z) + tuning.future_jumps as i32;
        let mut generated = 0;
        while self.generator.last_node.sz < target {
            self.generate_next(rng, tuning, observer.as_deref_mut());
            generated += 1;
        }
        generated
    }

    /// Advance fades for blocks behind the player and drop finished ones.
    /// Returns the number removed.
    pub fn retire(&mut self, player_z: f32, dt: f32) -> usize {
        for platform in self.platforms.iter_mut().filter(|p| !p.is_start) {
            let behind = player_z - platform.center.z;
            if platform.phase == PlatformPhase::Active && behind > FADE_START_DISTANCE {
                platform.phase = PlatformPhase::Fading { elapsed: 0.0 };
            }
            if let PlatformPhase::Fading { elapsed } = &mut platform.phase {
                *elapsed += dt;
            }
        }

        let before = self.platforms.len();
        self.platforms.retain(|p| match p.phase {
            PlatformPhase::Fading { elapsed } if !p.is_start => {
                let behind = player_z - p.center.z;
                behind <= DESPAWN_DISTANCE && elapsed < FADE_DURATION
            }
            _ => true,
        });
        before - self.platforms.len()
    }

    /// Drop blocks beyond a (possibly shrunk) horizon and re-anchor the
    /// last node on the furthest remaining block. Idempotent.
    pub fn reconcile(&mut self, player_z: f32, future_jumps: u32) {
        let max_ahead = step_from_z(player_z) + future_jumps as i32 + RECONCILE_SLACK;
        let before = self.platforms.len();
        self.platforms
            .retain(|p| p.is_start || p.grid.sz <= max_ahead);
        let removed = before - self.platforms.len();
        if removed > 0 {
            log::debug!("Reconcile dropped {} platforms past step {}", removed, max_ahead);
        }

        // First platform with the largest sz wins ties
        let furthest = self
            .platforms
            .iter()
            .fold(None::<GridPos>, |best, p| match best {
                Some(b) if p.grid.sz <= b.sz => Some(b),
                _ => Some(p.grid),
            });
        if let Some(grid) = furthest {
            self.generator.last_node = grid;
        }
    }

    /// Steps between the player's step and the furthest non-start block
    pub fn horizon_steps(&self, player_z: f32) -> i32 {
        let furthest = self
            .platforms
            .iter()
            .filter(|p| !p.is_start)
            .map(|p| p.grid.sz)
            .max()
            .unwrap_or(i32::MIN / 2);
        furthest - step_from_z(player_z)
    }
}
