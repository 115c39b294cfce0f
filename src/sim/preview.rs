//! Sampler preview side-channel
//!
//! The UI can show a small 3D inset of the last sampling pass. Generation
//! reports to an optional observer after each step and never reads anything
//! back from it.

use super::grid::GridOffset;
use super::kinematics::ReachEnvelope;

/// Snapshot of one generation step
#[derive(Debug, Clone, Copy)]
pub struct SamplerPreview<'a> {
    /// Every offset drawn by the sampler (empty when only the fallback ran)
    pub sampled: &'a [GridOffset],
    /// Offset actually placed
    pub chosen: GridOffset,
    /// Reach paraboloid for the tuning used
    pub envelope: ReachEnvelope,
}

/// Receives a preview after every generation step
pub trait SamplerObserver {
    fn observe(&mut self, preview: &SamplerPreview<'_>);
}

impl<F> SamplerObserver for F
where
    F: FnMut(&SamplerPreview<'_>),
{
    fn observe(&mut self, preview: &SamplerPreview<'_>) {
        self(preview)
    }
}
