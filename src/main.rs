//! Voxel Parkour entry point
//!
//! The browser build drives the simulation through `voxel_parkour::web`.
//! Natively this runs a headless autopilot over a generated track and logs
//! how far it gets.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use glam::{Vec2, Vec3};

    use voxel_parkour::Tuning;
    use voxel_parkour::persistence::{FileStore, MemoryStore, PersistError, Store};
    use voxel_parkour::sim::player::has_support_at;
    use voxel_parkour::sim::{ParkourEvent, ParkourState, Platform, PlayerState, TickInput, tick};

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// How far ahead of the feet the autopilot probes for an edge
    const EDGE_PROBE: f32 = 0.45;

    #[derive(Parser, Debug, Clone)]
    #[command(name = "voxel-parkour")]
    #[command(about = "Headless voxel parkour run: generates a track and lets an autopilot jump it", long_about = None)]
    struct Args {
        /// RNG seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Frames to simulate at 60 Hz
        #[arg(long, default_value_t = 3600)]
        frames: u32,

        /// JSON file with tuning overrides
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Where to keep the best distance
        #[arg(long, default_value = "voxel_parkour.json")]
        data_file: PathBuf,

        /// Keep everything in memory instead of `data_file`
        #[arg(long, default_value_t = false)]
        ephemeral: bool,
    }

    /// Walks toward the next block and jumps at the edge
    #[derive(Debug, Default)]
    struct Autopilot;

    impl Autopilot {
        /// Next solid block ahead of the player
        fn target<'a>(player: &PlayerState, platforms: &'a [Platform]) -> Option<&'a Platform> {
            platforms
                .iter()
                .filter(|p| !p.is_start && p.is_solid())
                .filter(|p| p.center.z > player.position.z + p.half_d)
                .min_by_key(|p| p.grid.sz)
        }

        fn input(&self, state: &ParkourState) -> TickInput {
            let player = state.player();
            let Some(target) = Self::target(player, state.platforms()) else {
                return TickInput::default();
            };

            let to_target = target.center - player.position;
            let wanted_yaw = (-to_target.x).atan2(-to_target.z);
            let mut turn = player.yaw - wanted_yaw;
            turn = (turn + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
                - std::f32::consts::PI;

            let probe = player.position + player.forward_dir() * EDGE_PROBE;
            let at_edge = !has_support_at(
                state.platforms(),
                probe.x,
                probe.z,
                player.feet_y(),
                0.0,
            );
            let horizontal = Vec3::new(to_target.x, 0.0, to_target.z).length();

            TickInput {
                forward: 1.0,
                look: Vec2::new(turn, 0.0),
                jump: player.grounded && (at_edge || horizontal < target.half_d + 0.5),
                ..Default::default()
            }
        }
    }

    fn load_tuning(path: &Path) -> Result<Tuning, PersistError> {
        let text = std::fs::read_to_string(path)?;
        let tuning: Tuning = serde_json::from_str(&text)?;
        Ok(tuning.clamped())
    }

    pub fn run() {
        env_logger::init();
        let args = Args::parse();
        let seed = args.seed.unwrap_or_else(rand::random);
        log::info!("Voxel Parkour (headless) starting with seed {}", seed);

        let store: Box<dyn Store> = if args.ephemeral {
            Box::new(MemoryStore::new())
        } else {
            log::info!("Using data file {}", args.data_file.display());
            Box::new(FileStore::new(args.data_file.clone()))
        };

        let mut state = ParkourState::with_store(seed, store);
        if let Some(path) = &args.tuning {
            match load_tuning(path) {
                Ok(tuning) => state.set_tuning(tuning),
                Err(e) => log::error!("Could not read tuning from {}: {}", path.display(), e),
            }
        }
        let kin = state.kinematics();
        let sep = state.max_separation();
        log::info!(
            "Flight time {:?}s, reach {:?}m, max separation {:.2}m ({:.2} blocks)",
            kin.flight_time(0.0),
            kin.max_horizontal_reach(0.0),
            sep.meters,
            sep.blocks
        );

        let pilot = Autopilot;
        let (mut jumps, mut landings, mut respawns) = (0u32, 0u32, 0u32);
        for frame in 0..args.frames {
            let input = pilot.input(&state);
            tick(&mut state, &input, FRAME_DT);

            for event in state.drain_events() {
                match event {
                    ParkourEvent::Jumped => jumps += 1,
                    ParkourEvent::Landed { .. } => landings += 1,
                    ParkourEvent::Respawned => respawns += 1,
                    ParkourEvent::NewBest(best) => log::debug!("New best: {}", best),
                    ParkourEvent::Restarted => {}
                }
            }

            if frame % 600 == 599 {
                log::info!(
                    "t={:.0}s distance {} best {} platforms {} | {}",
                    (frame + 1) as f32 * FRAME_DT,
                    state.distance(),
                    state.best(),
                    state.platforms().len(),
                    state.hint().text()
                );
            }
        }

        log::info!(
            "Finished: distance {}, best {}, {} jumps, {} landings, {} respawns",
            state.distance(),
            state.best(),
            jumps,
            landings,
            respawns
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is voxel_parkour::web::start, this is just to satisfy the compiler
}
