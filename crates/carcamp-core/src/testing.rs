//! Test doubles shared by the builder, batcher and job tests.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use carcamp_geo::Coordinate;
use carcamp_store::{
    Database, EdgeStore, Spot, SpotDistance, SpotPage, SpotStore, SpotType, SqliteEdgeStore,
    SqliteSpotStore,
};

use crate::providers::{DistanceMatrix, DistanceMatrixProvider, FeatureCatalog, ProviderError};

pub fn spot(id: &str, lat: f64, lon: f64) -> Spot {
    Spot::new(id, lat, lon, SpotType::RoadSideStation).with_name(id.to_uppercase())
}

/// `count` spots stepping ~111 m north of `(lat, lon)`, ids `{prefix}-00`...
pub fn cluster(prefix: &str, count: usize, lat: f64, lon: f64) -> Vec<Spot> {
    (0..count)
        .map(|i| spot(&format!("{}-{:02}", prefix, i), lat + 0.001 * (i + 1) as f64, lon))
        .collect()
}

pub async fn seeded_db(spots: &[Spot]) -> Database {
    let db = Database::open_in_memory().await.unwrap();
    let store = db.spot_store();
    for spot in spots {
        store.insert_spot(spot).await.unwrap();
    }
    db
}

/// Answers every request with synthetic road figures: 1.3x the great-circle
/// distance, driven at 12.5 m/s.
pub struct FakeMatrixProvider {
    max_coordinates: usize,
    failing_calls: HashSet<usize>,
    unroutable: HashSet<(usize, usize)>,
    calls: Mutex<Vec<usize>>,
}

impl FakeMatrixProvider {
    pub fn new(max_coordinates: usize) -> Self {
        Self {
            max_coordinates,
            failing_calls: HashSet::new(),
            unroutable: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the n-th request (1-based).
    pub fn failing_call(mut self, n: usize) -> Self {
        self.failing_calls.insert(n);
        self
    }

    /// Return no route for matrix cell `(i, j)` in every response.
    pub fn unroutable(mut self, i: usize, j: usize) -> Self {
        self.unroutable.insert((i, j));
        self
    }

    /// Coordinate counts of every request received, in order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn road_distance(a: &Coordinate, b: &Coordinate) -> f64 {
        a.distance_to(b) * 1.3
    }
}

#[async_trait]
impl DistanceMatrixProvider for FakeMatrixProvider {
    fn max_coordinates(&self) -> usize {
        self.max_coordinates
    }

    async fn driving_matrix(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<DistanceMatrix, ProviderError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(coordinates.len());
            calls.len()
        };
        if coordinates.len() > self.max_coordinates {
            return Err(ProviderError::CoordinateCount {
                count: coordinates.len(),
                limit: self.max_coordinates,
            });
        }
        if self.failing_calls.contains(&call) {
            return Err(ProviderError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let n = coordinates.len();
        let mut matrix = DistanceMatrix {
            durations: vec![vec![None; n]; n],
            distances: vec![vec![None; n]; n],
        };
        for i in 0..n {
            for j in 0..n {
                if self.unroutable.contains(&(i, j)) {
                    continue;
                }
                let meters = Self::road_distance(&coordinates[i], &coordinates[j]);
                matrix.distances[i][j] = Some(meters);
                matrix.durations[i][j] = Some(meters / 12.5);
            }
        }
        Ok(matrix)
    }
}

/// Records upserted feature ids; fails for configured ids.
#[derive(Default)]
pub struct FakeCatalog {
    failing: HashSet<String>,
    upserts: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn upserts(&self) -> Vec<String> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeatureCatalog for FakeCatalog {
    async fn upsert_feature(&self, spot: &Spot) -> Result<(), ProviderError> {
        if self.failing.contains(&spot.id) {
            return Err(ProviderError::Status {
                status: 500,
                body: "dataset error".to_string(),
            });
        }
        self.upserts.lock().unwrap().push(spot.id.clone());
        Ok(())
    }
}

/// SQLite spot store that fails chosen cell queries or page scans.
pub struct FlakySpotStore {
    inner: SqliteSpotStore,
    failing_cells: HashSet<String>,
    fail_scans: bool,
}

impl FlakySpotStore {
    pub fn new(inner: SqliteSpotStore) -> Self {
        Self {
            inner,
            failing_cells: HashSet::new(),
            fail_scans: false,
        }
    }

    pub fn failing_cell(mut self, cell: &str) -> Self {
        self.failing_cells.insert(cell.to_string());
        self
    }

    pub fn failing_scans(mut self) -> Self {
        self.fail_scans = true;
        self
    }
}

#[async_trait]
impl SpotStore for FlakySpotStore {
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>> {
        self.inner.get_spot(id).await
    }

    async fn query_by_cell_prefix(&self, cell_prefix: &str) -> Result<Vec<Spot>> {
        if self.failing_cells.contains(cell_prefix) {
            return Err(anyhow!("cell {} unavailable", cell_prefix));
        }
        self.inner.query_by_cell_prefix(cell_prefix).await
    }

    async fn query_all_spots(&self, page_token: Option<&str>, limit: usize) -> Result<SpotPage> {
        if self.fail_scans {
            return Err(anyhow!("scan unavailable"));
        }
        self.inner.query_all_spots(page_token, limit).await
    }

    async fn insert_spot(&self, spot: &Spot) -> Result<()> {
        self.inner.insert_spot(spot).await
    }
}

/// SQLite edge store that fails writes to chosen destinations, or lookups.
pub struct FlakyEdgeStore {
    inner: SqliteEdgeStore,
    failing_destinations: HashSet<String>,
    fail_lookups: bool,
}

impl FlakyEdgeStore {
    pub fn new(inner: SqliteEdgeStore) -> Self {
        Self {
            inner,
            failing_destinations: HashSet::new(),
            fail_lookups: false,
        }
    }

    pub fn failing_destination(mut self, id: &str) -> Self {
        self.failing_destinations.insert(id.to_string());
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

#[async_trait]
impl EdgeStore for FlakyEdgeStore {
    async fn query_existing_edges(
        &self,
        origin_id: &str,
        destination_ids: &[String],
    ) -> Result<Vec<SpotDistance>> {
        if self.fail_lookups {
            return Err(anyhow!("edge index unavailable"));
        }
        self.inner.query_existing_edges(origin_id, destination_ids).await
    }

    async fn put_edge(&self, edge: &SpotDistance) -> Result<()> {
        if self.failing_destinations.contains(&edge.destination_id) {
            return Err(anyhow!("write rejected for {}", edge.destination_id));
        }
        self.inner.put_edge(edge).await
    }

    async fn edges_from(&self, origin_id: &str) -> Result<Vec<SpotDistance>> {
        self.inner.edges_from(origin_id).await
    }

    async fn edge_count(&self) -> Result<i64> {
        self.inner.edge_count().await
    }
}
