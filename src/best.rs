//! Best distance record
//!
//! The only durable gameplay state: the furthest grid step ever reached.
//! Stored as a decimal string under a fixed key.

use serde::{Deserialize, Serialize};

use crate::persistence::Store;

/// Furthest distance reached across runs (in grid steps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestDistance {
    pub best: u32,
}

impl BestDistance {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "voxel_parkour_best";

    pub fn new() -> Self {
        Self { best: 0 }
    }

    /// Check if a distance beats the record
    pub fn qualifies(&self, distance: u32) -> bool {
        distance > self.best
    }

    /// Record a distance. Returns true when it is a new maximum.
    pub fn record(&mut self, distance: u32) -> bool {
        if !self.qualifies(distance) {
            return false;
        }
        self.best = distance;
        true
    }

    /// Load the record, treating anything unreadable as zero
    pub fn load(store: &dyn Store) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(text)) => {
                // Older saves may hold "12.0" style values
                let best = text
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .map(|v| v.min(u32::MAX as f64) as u32)
                    .unwrap_or(0);
                log::info!("Loaded best distance {}", best);
                Self { best }
            }
            Ok(None) => Self::new(),
            Err(e) => {
                log::warn!("Best distance unavailable: {}", e);
                Self::new()
            }
        }
    }

    /// Save the record
    pub fn save(&self, store: &mut dyn Store) {
        match store.set(Self::STORAGE_KEY, &self.best.to_string()) {
            Ok(()) => log::debug!("Best distance saved ({})", self.best),
            Err(e) => log::warn!("Failed to save best distance: {}", e),
        }
    }
}
