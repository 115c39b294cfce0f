//! Browser bindings
//!
//! The page owns the renderer, input and HUD. Each animation frame it calls
//! `advance` with the frame delta and input intent, then reads the flat
//! platform buffer and the pose back out.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::persistence::LocalStore;
use crate::settings::Tuning;
use crate::sim::{ParkourState, SamplerPreview, TickInput, tick};

/// Floats per platform in the `advance` buffer:
/// `[center x, center y, center z, half_w, half_d, opacity, is_start]`
pub const PLATFORM_STRIDE: usize = 7;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
    log::info!("Voxel Parkour starting...");
}

/// A run driven from JavaScript
#[wasm_bindgen]
pub struct WebParkour {
    state: ParkourState,
    /// Last sampler pass as `[dx, dy, dz]*`, chosen offset first
    preview: Rc<RefCell<Vec<f32>>>,
}

#[wasm_bindgen]
impl WebParkour {
    /// New run with a random seed and LocalStorage persistence
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// New run with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        let state = ParkourState::with_store(seed, Box::new(LocalStore));
        let mut web = Self {
            state,
            preview: Rc::new(RefCell::new(Vec::new())),
        };
        web.set_preview_enabled(true);
        log::info!("Run initialized with seed: {}", seed);
        web
    }

    /// Turn the sampler inset feed on or off
    pub fn set_preview_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.state.clear_sampler_observer();
            self.preview.borrow_mut().clear();
            return;
        }
        let sink = Rc::clone(&self.preview);
        self.state
            .set_sampler_observer(Box::new(move |p: &SamplerPreview<'_>| {
                let mut buf = sink.borrow_mut();
                buf.clear();
                buf.extend_from_slice(&[p.chosen.dx as f32, p.chosen.dy as f32, p.chosen.dz as f32]);
                for o in p.sampled {
                    buf.extend_from_slice(&[o.dx as f32, o.dy as f32, o.dz as f32]);
                }
            }));
    }

    /// Step one frame and return the platform buffer
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &mut self,
        dt: f32,
        forward: f32,
        strafe: f32,
        look_x: f32,
        look_y: f32,
        jump: bool,
        sneak: bool,
    ) -> Vec<f32> {
        let input = TickInput {
            forward,
            strafe,
            look: Vec2::new(look_x, look_y),
            jump,
            sneak,
            restart: false,
        };
        let frame = tick(&mut self.state, &input, dt);
        let mut out = Vec::with_capacity(frame.platforms.len() * PLATFORM_STRIDE);
        for p in frame.platforms {
            out.extend_from_slice(&[
                p.center.x,
                p.center.y,
                p.center.z,
                p.half_w,
                p.half_d,
                p.opacity(),
                if p.is_start { 1.0 } else { 0.0 },
            ]);
        }
        out
    }

    /// `[eye x, eye y, eye z, yaw, pitch, grounded]`
    pub fn pose(&self) -> Vec<f32> {
        let player = self.state.player();
        let eye = player.eye();
        vec![
            eye.x,
            eye.y,
            eye.z,
            player.yaw,
            player.pitch,
            if player.grounded { 1.0 } else { 0.0 },
        ]
    }

    pub fn restart(&mut self) {
        self.state.restart();
    }

    pub fn distance(&self) -> u32 {
        self.state.distance()
    }

    pub fn best(&self) -> u32 {
        self.state.best()
    }

    pub fn hint(&self) -> String {
        self.state.hint().text().to_string()
    }

    /// Events since the last call, as a JSON array
    pub fn events_json(&mut self) -> String {
        let events = self.state.drain_events();
        serde_json::to_string(&events).unwrap_or_else(|e| {
            log::warn!("Failed to encode events: {}", e);
            "[]".to_string()
        })
    }

    /// Last sampler pass, see `preview` field for the layout
    pub fn sampler_preview(&self) -> Vec<f32> {
        self.preview.borrow().clone()
    }

    /// `[radius, peak, floor]` of the reach paraboloid
    pub fn reach_envelope(&self) -> Vec<f32> {
        let env = self.state.reach_envelope();
        vec![env.radius, env.peak, env.floor]
    }

    /// Widest same-height gap in metres
    pub fn max_separation_meters(&self) -> f32 {
        self.state.max_separation().meters
    }

    pub fn max_separation_blocks(&self) -> f32 {
        self.state.max_separation().blocks
    }

    pub fn tuning_json(&self) -> String {
        serde_json::to_string(self.state.tuning()).unwrap_or_default()
    }

    pub fn set_difficulty(&mut self, value: f32) {
        self.update_tuning(|t| t.set_difficulty(value));
    }

    pub fn set_min_separation(&mut self, value: f32) {
        self.update_tuning(|t| t.set_min_separation(value));
    }

    pub fn set_future_jumps(&mut self, value: f32) {
        self.update_tuning(|t| t.set_future_jumps(value));
    }

    pub fn set_move_speed(&mut self, value: f32) {
        self.update_tuning(|t| t.set_move_speed(value));
    }

    pub fn set_jump_speed(&mut self, value: f32) {
        self.update_tuning(|t| t.set_jump_speed(value));
    }

    pub fn set_gravity(&mut self, value: f32) {
        self.update_tuning(|t| t.set_gravity(value));
    }

    pub fn set_air_retain_per_sec(&mut self, value: f32) {
        self.update_tuning(|t| t.set_air_retain_per_sec(value));
    }

    pub fn set_jump_tightness(&mut self, value: f32) {
        self.update_tuning(|t| t.set_jump_tightness(value));
    }
}

impl WebParkour {
    fn update_tuning(&mut self, f: impl FnOnce(&mut Tuning)) {
        let mut tuning = *self.state.tuning();
        f(&mut tuning);
        self.state.set_tuning(tuning);
    }
}

impl Default for WebParkour {
    fn default() -> Self {
        Self::new()
    }
}
