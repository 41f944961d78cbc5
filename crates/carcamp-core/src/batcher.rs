//! Splits missing destinations into provider-sized groups and turns each
//! matrix response into directed edges.
//!
//! A group of `G` destinations is sent together with the origin, so one
//! request covers `G + 1` coordinates and yields up to `(G + 1) * G` edges:
//! every ordered pair of distinct members within the great-circle
//! threshold, including pairs between destinations of the same group.

use std::sync::Arc;

use carcamp_store::{Spot, SpotDistance};

use crate::providers::{DistanceMatrix, DistanceMatrixProvider, ProviderError};
use crate::proximity::ProximityFilter;

/// Destinations per request with the Mapbox limit of 25 coordinates.
pub const DEFAULT_GROUP_SIZE: usize = 24;

/// Edges produced by one group.
#[derive(Debug, Default, Clone)]
pub struct GroupEdges {
    pub edges: Vec<SpotDistance>,
    /// Ordered pairs the provider returned no route for.
    pub skipped_pairs: usize,
    /// Member pairs farther apart than the threshold. Both members are near
    /// the origin but not necessarily near each other.
    pub out_of_range_pairs: usize,
}

/// Drives the distance-matrix provider over groups of destinations.
#[derive(Clone)]
pub struct MatrixBatcher {
    provider: Arc<dyn DistanceMatrixProvider>,
    filter: ProximityFilter,
    group_size: usize,
}

impl MatrixBatcher {
    /// Group size derived from the provider's coordinate limit.
    pub fn new(provider: Arc<dyn DistanceMatrixProvider>) -> Self {
        let group_size = Self::max_group_size(provider.as_ref());
        Self {
            provider,
            filter: ProximityFilter::default(),
            group_size,
        }
    }

    /// Use smaller groups. Never exceeds what the provider accepts.
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        let limit = Self::max_group_size(self.provider.as_ref());
        self.group_size = group_size.clamp(1, limit);
        self
    }

    /// Threshold applied to every member pair of a response.
    pub fn with_filter(mut self, filter: ProximityFilter) -> Self {
        self.filter = filter;
        self
    }

    fn max_group_size(provider: &dyn DistanceMatrixProvider) -> usize {
        provider.max_coordinates().saturating_sub(1).max(1)
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Consecutive groups of at most `group_size`, input order preserved.
    pub fn partition<'a>(&self, missing: &'a [Spot]) -> Vec<&'a [Spot]> {
        missing.chunks(self.group_size).collect()
    }

    /// One provider request for `origin` plus `group`.
    pub async fn compute_group(
        &self,
        origin: &Spot,
        group: &[Spot],
    ) -> Result<GroupEdges, ProviderError> {
        let members: Vec<&Spot> = std::iter::once(origin).chain(group.iter()).collect();
        let coordinates: Vec<_> = members.iter().map(|spot| spot.coordinate()).collect();

        let matrix = self.provider.driving_matrix(&coordinates).await?;
        matrix.validate(members.len())?;
        Ok(expand_edges(&members, &matrix, &self.filter))
    }
}

/// Every ordered pair `(i, j)`, `i != j`, of `members` that lies within
/// the filter's threshold and whose matrix cell has both a duration and a
/// distance.
pub fn expand_edges(
    members: &[&Spot],
    matrix: &DistanceMatrix,
    filter: &ProximityFilter,
) -> GroupEdges {
    let mut result = GroupEdges::default();
    for (i, from) in members.iter().enumerate() {
        for (j, to) in members.iter().enumerate() {
            if i == j {
                continue;
            }
            if !filter.is_nearby(from, to) {
                result.out_of_range_pairs += 1;
                continue;
            }
            match matrix.trip(i, j) {
                Some((duration, distance)) => {
                    result.edges.push(SpotDistance::new(from, to, duration, distance))
                }
                None => result.skipped_pairs += 1,
            }
        }
    }
    result
}
