//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame delta, clamped to `MAX_FRAME_DT`
//! - Seeded RNG only
//! - Stable iteration order (platforms in placement order)
//! - No rendering or platform dependencies

pub mod grid;
pub mod kinematics;
pub mod player;
pub mod preview;
pub mod sampler;
pub mod selector;
pub mod state;
pub mod tick;
pub mod track;

pub use grid::{GridOffset, GridPos};
pub use kinematics::{Kinematics, MaxSeparation, ReachEnvelope, max_separation};
pub use player::PlayerState;
pub use preview::{SamplerObserver, SamplerPreview};
pub use sampler::{Candidate, SampleBounds, SampleSet, sample_candidates};
pub use selector::{GeneratorState, Heading, PickSource, Placement};
pub use state::{Hint, ParkourEvent, ParkourState};
pub use tick::{Frame, PlayerPose, TickInput, tick};
pub use track::{Platform, PlatformPhase, Track};
