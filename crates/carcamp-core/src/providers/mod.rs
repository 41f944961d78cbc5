//! External services the graph builder talks to.
//!
//! This module provides:
//! - `DistanceMatrixProvider`: driving durations/distances between coordinates
//! - `FeatureCatalog`: the external map dataset spots are published to
//! - `ProviderError`: typed failures so callers can tell a transport
//!   problem from a rejected or malformed response
//!
//! `MapboxClient` implements both traits.

mod mapbox;

pub use mapbox::MapboxClient;

use async_trait::async_trait;
use thiserror::Error;

use carcamp_geo::Coordinate;
use carcamp_store::Spot;

/// Failures reported by an external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider returned code {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("matrix request needs 2..={limit} coordinates, got {count}")]
    CoordinateCount { count: usize, limit: usize },

    #[error("provider not configured: {0} is missing")]
    NotConfigured(&'static str),
}

/// Square duration/distance matrices for an ordered coordinate list.
///
/// Row `i`, column `j` is the trip from coordinate `i` to coordinate `j`.
/// A `None` cell means the provider found no route.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistanceMatrix {
    pub durations: Vec<Vec<Option<f64>>>,
    pub distances: Vec<Vec<Option<f64>>>,
}

impl DistanceMatrix {
    /// Check that both matrices are exactly `size` x `size`.
    pub fn validate(&self, size: usize) -> Result<(), ProviderError> {
        for (label, matrix) in [("durations", &self.durations), ("distances", &self.distances)] {
            if matrix.len() != size || matrix.iter().any(|row| row.len() != size) {
                return Err(ProviderError::Malformed(format!(
                    "{} matrix is not {}x{}",
                    label, size, size
                )));
            }
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.durations.len()
    }

    /// `(duration_seconds, distance_meters)` for `i -> j`, if both are known.
    pub fn trip(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        let duration = (*self.durations.get(i)?.get(j)?)?;
        let distance = (*self.distances.get(i)?.get(j)?)?;
        Some((duration, distance))
    }
}

/// Road-network durations and distances between coordinates.
#[async_trait]
pub trait DistanceMatrixProvider: Send + Sync {
    /// Most coordinates accepted by one request.
    fn max_coordinates(&self) -> usize;

    /// Matrix over `coordinates` in the given order. On success the matrix
    /// is `coordinates.len()` square.
    async fn driving_matrix(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<DistanceMatrix, ProviderError>;
}

/// Map dataset holding one point feature per spot.
#[async_trait]
pub trait FeatureCatalog: Send + Sync {
    /// Create or replace the feature for `spot`, keyed by its id.
    async fn upsert_feature(&self, spot: &Spot) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(n: usize) -> DistanceMatrix {
        let cells = |scale: f64| {
            (0..n)
                .map(|i| (0..n).map(|j| Some((i * 10 + j) as f64 * scale)).collect())
                .collect()
        };
        DistanceMatrix {
            durations: cells(1.0),
            distances: cells(100.0),
        }
    }

    #[test]
    fn test_validate_accepts_square() {
        assert!(matrix(3).validate(3).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_shape() {
        assert!(matches!(matrix(3).validate(4), Err(ProviderError::Malformed(_))));

        let mut ragged = matrix(3);
        ragged.distances[1].pop();
        assert!(matches!(ragged.validate(3), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn test_trip_reads_row_then_column() {
        let m = matrix(3);
        assert_eq!(m.trip(1, 2), Some((12.0, 1200.0)));
        assert_eq!(m.trip(2, 1), Some((21.0, 2100.0)));
        assert_eq!(m.trip(3, 0), None);
    }

    #[test]
    fn test_trip_none_when_unroutable() {
        let mut m = matrix(2);
        m.durations[0][1] = None;
        assert_eq!(m.trip(0, 1), None);
        assert!(m.trip(1, 0).is_some());
    }
}
