//! Run state
//!
//! Everything a single parkour run owns: tuning, the track window, the
//! player, the seeded RNG, the best-distance record and its store. No
//! globals, so several runs can live side by side.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::kinematics::{Kinematics, MaxSeparation, ReachEnvelope, max_separation};
use super::player::PlayerState;
use super::preview::SamplerObserver;
use super::track::{Platform, Track};
use crate::best::BestDistance;
use crate::persistence::{MemoryStore, Store};
use crate::settings::Tuning;

/// Things the front-end may want to react to (sounds, HUD flashes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkourEvent {
    /// A new run was laid out
    Restarted,
    Jumped,
    /// Touched down on the platform with this id
    Landed { platform: u32 },
    /// Fell off the world and was put back
    Respawned,
    /// New best distance (grid steps)
    NewBest(u32),
}

/// Short status line shown under the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hint {
    Ready,
    Jumping,
    Respawned,
}

impl Hint {
    pub fn text(&self) -> &'static str {
        match self {
            Hint::Ready => "Walk forward and jump to the next block.",
            Hint::Jumping => "Nice. Sparse jumps ahead, keep momentum.",
            Hint::Respawned => "Missed jump. Respawned at last safe platform.",
        }
    }
}

/// Complete state of a parkour session
pub struct ParkourState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) tuning: Tuning,
    pub(crate) track: Track,
    pub(crate) player: PlayerState,
    pub(crate) best: BestDistance,
    pub(crate) hint: Hint,
    pub(crate) events: Vec<ParkourEvent>,
    /// Simulation tick counter
    pub(crate) time_ticks: u64,
    pub(crate) store: Box<dyn Store>,
    pub(crate) observer: Option<Box<dyn SamplerObserver>>,
}

impl ParkourState {
    /// New run with default tuning and an in-memory store
    pub fn new(seed: u64) -> Self {
        Self::with_parts(seed, Tuning::default(), BestDistance::new(), Box::new(MemoryStore::new()))
    }

    /// New run with default tuning and the best distance loaded from `store`.
    /// The best distance is the only thing ever written back.
    pub fn with_store(seed: u64, store: Box<dyn Store>) -> Self {
        let best = BestDistance::load(store.as_ref());
        Self::with_parts(seed, Tuning::default(), best, store)
    }

    /// New run with explicit tuning and an in-memory store
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self::with_parts(seed, tuning.clamped(), BestDistance::new(), Box::new(MemoryStore::new()))
    }

    fn with_parts(seed: u64, tuning: Tuning, best: BestDistance, store: Box<dyn Store>) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            track: Track::new(),
            player: PlayerState::spawn(),
            best,
            hint: Hint::Ready,
            events: Vec::new(),
            time_ticks: 0,
            store,
            observer: None,
        };
        state.restart();
        state
    }

    /// Lay out a fresh track and put the player back on the start block.
    /// The RNG stream carries on, so each restart gets a new track.
    pub fn restart(&mut self) {
        self.track
            .seed(&mut self.rng, &self.tuning, self.observer.as_deref_mut());
        self.player = PlayerState::spawn();
        self.track.ensure_ahead(
            self.player.position.z,
            &mut self.rng,
            &self.tuning,
            self.observer.as_deref_mut(),
        );
        self.hint = Hint::Ready;
        self.events.push(ParkourEvent::Restarted);
        log::info!(
            "Run restarted: {} platforms, best {}",
            self.track.platforms().len(),
            self.best.best
        );
    }

    /// Apply new tuning between ticks.
    ///
    /// Values are clamped. A changed horizon trims the window and tops it up
    /// straight away; other changes apply from the next generated block.
    pub fn set_tuning(&mut self, tuning: Tuning) {
        let tuning = tuning.clamped();
        if tuning == self.tuning {
            return;
        }
        let horizon_changed = tuning.future_jumps != self.tuning.future_jumps;
        self.tuning = tuning;

        if horizon_changed && !self.track.platforms().is_empty() {
            let z = self.player.position.z;
            self.track.reconcile(z, self.tuning.future_jumps);
            self.track
                .ensure_ahead(z, &mut self.rng, &self.tuning, self.observer.as_deref_mut());
        }
        log::debug!("Tuning updated: {:?}", self.tuning);
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Kinematics the generator currently plans with
    pub fn kinematics(&self) -> Kinematics {
        Kinematics::from_tuning(&self.tuning)
    }

    /// Widest same-height gap for the current tuning
    pub fn max_separation(&self) -> MaxSeparation {
        max_separation(&self.tuning)
    }

    /// Reach paraboloid for the sampler inset
    pub fn reach_envelope(&self) -> ReachEnvelope {
        self.kinematics().reach_envelope()
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn platforms(&self) -> &[Platform] {
        self.track.platforms()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Replace the player body, e.g. to replay a recorded position
    pub fn set_player(&mut self, player: PlayerState) {
        self.player = player;
    }

    /// Grid steps travelled in this run
    pub fn distance(&self) -> u32 {
        self.player.distance()
    }

    pub fn best(&self) -> u32 {
        self.best.best
    }

    pub fn hint(&self) -> Hint {
        self.hint
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<ParkourEvent> {
        std::mem::take(&mut self.events)
    }

    /// Install an observer for the sampler preview
    pub fn set_sampler_observer(&mut self, observer: Box<dyn SamplerObserver>) {
        self.observer = Some(observer);
    }

    /// Stop reporting sampler previews
    pub fn clear_sampler_observer(&mut self) {
        self.observer = None;
    }

    /// Record the current distance; persists and reports a new maximum
    pub(crate) fn update_best(&mut self) {
        let distance = self.player.distance();
        if self.best.record(distance) {
            self.best.save(self.store.as_mut());
            self.events.push(ParkourEvent::NewBest(distance));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PersistError;
    use crate::sim::preview::SamplerPreview;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[test]
    fn test_new_state_is_ready() {
        let mut state = ParkourState::new(12345);
        assert_eq!(state.hint(), Hint::Ready);
        assert!(state.player().grounded);
        assert_eq!(state.drain_events(), vec![ParkourEvent::Restarted]);
        assert!(state.drain_events().is_empty());
        assert!(state.track().horizon_steps(0.0) >= state.tuning().future_jumps as i32);
    }

    #[test]
    fn test_same_seed_same_track() {
        let a = ParkourState::new(777);
        let b = ParkourState::new(777);
        let grids_a: Vec<_> = a.platforms().iter().map(|p| p.grid).collect();
        let grids_b: Vec<_> = b.platforms().iter().map(|p| p.grid).collect();
        assert_eq!(grids_a, grids_b);

        let c = ParkourState::new(778);
        let grids_c: Vec<_> = c.platforms().iter().map(|p| p.grid).collect();
        assert_ne!(grids_a, grids_c);
    }

    #[test]
    fn test_shrinking_horizon_trims_window() {
        let mut state = ParkourState::new(4);
        let before = state.platforms().len();
        let mut tuning = *state.tuning();
        tuning.set_future_jumps(8.0);
        state.set_tuning(tuning);
        assert_eq!(state.tuning().future_jumps, 8);
        assert!(state.platforms().len() < before);
        assert!(state.platforms().iter().all(|p| p.is_start || p.grid.sz <= 20));
        assert!(state.track().horizon_steps(0.0) >= 8);
    }

    #[test]
    fn test_growing_horizon_tops_up() {
        let mut state = ParkourState::new(5);
        let mut tuning = *state.tuning();
        tuning.set_future_jumps(60.0);
        state.set_tuning(tuning);
        assert!(state.track().horizon_steps(0.0) >= 60);
    }

    /// Shared map that remembers every key written to it
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<BTreeMap<String, String>>>);

    impl Store for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
            Ok(self.0.borrow().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
            self.0.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_set_tuning_clamps_and_is_not_stored() {
        let store = SharedStore::default();
        let mut state = ParkourState::with_store(6, Box::new(store.clone()));
        let mut tuning = *state.tuning();
        tuning.difficulty = 400.0;
        tuning.set_future_jumps(9.0);
        state.set_tuning(tuning);
        assert_eq!(state.tuning().difficulty, 100.0);
        assert_eq!(state.tuning().future_jumps, 9);

        // Reach a new best so the store sees a write
        let top = state.platforms()[2].center;
        state.player.position = top + glam::Vec3::new(0.0, 0.5 + 0.9, 0.3);
        state.update_best();
        assert_eq!(state.best(), 4);

        let keys: Vec<String> = store.0.borrow().keys().cloned().collect();
        assert_eq!(keys, vec![BestDistance::STORAGE_KEY.to_string()]);

        let reopened = ParkourState::with_store(7, Box::new(store));
        assert_eq!(reopened.tuning(), &Tuning::default());
        assert_eq!(reopened.best(), 4);
    }

    #[test]
    fn test_cleared_observer_is_not_called() {
        let mut state = ParkourState::new(13);
        let calls = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&calls);
        state.set_sampler_observer(Box::new(move |_: &SamplerPreview<'_>| {
            *counter.borrow_mut() += 1;
        }));
        state.restart();
        assert!(*calls.borrow() > 0);

        state.clear_sampler_observer();
        let before = *calls.borrow();
        state.restart();
        assert_eq!(*calls.borrow(), before);
    }

    #[test]
    fn test_with_store_loads_best() {
        let mut store = MemoryStore::new();
        store.set(BestDistance::STORAGE_KEY, "14").unwrap();
        let state = ParkourState::with_store(1, Box::new(store));
        assert_eq!(state.best(), 14);
    }

    #[test]
    fn test_restart_resets_player() {
        let mut state = ParkourState::new(8);
        state.player.position.z = 50.0;
        state.player.grounded = false;
        state.restart();
        assert_eq!(state.player(), &PlayerState::spawn());
        assert_eq!(state.platforms()[0].grid.sz, 0);
    }
}
