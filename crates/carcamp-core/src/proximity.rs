//! Great-circle proximity filtering of candidate spots.

use std::collections::HashSet;

use carcamp_store::Spot;

/// Default connection radius in meters.
pub const DEFAULT_THRESHOLD_METERS: f64 = 10_000.0;

/// Keeps candidates within `threshold_meters` of an origin.
#[derive(Debug, Clone, Copy)]
pub struct ProximityFilter {
    threshold_meters: f64,
}

impl Default for ProximityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_METERS)
    }
}

impl ProximityFilter {
    pub fn new(threshold_meters: f64) -> Self {
        Self { threshold_meters }
    }

    /// Boundary inclusive: exactly `threshold_meters` away is nearby.
    pub fn is_nearby(&self, origin: &Spot, candidate: &Spot) -> bool {
        origin.coordinate().distance_to(&candidate.coordinate()) <= self.threshold_meters
    }

    /// Drop the origin itself, repeated ids, and anything out of range.
    /// Input order is preserved.
    pub fn filter(&self, origin: &Spot, candidates: Vec<Spot>) -> Vec<Spot> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|candidate| {
                candidate.id != origin.id
                    && self.is_nearby(origin, candidate)
                    && seen.insert(candidate.id.clone())
            })
            .collect()
    }
}
