//! Proximity graph construction for a single spot.
//!
//! Building a spot runs these steps in order:
//!
//! 1. Collect candidates from the spot's geohash cell and its eight
//!    neighbors (`graph.cell_precision` characters). A failed cell query is
//!    logged and skipped.
//! 2. Keep candidates within `graph.threshold_meters` great-circle distance.
//! 3. Drop candidates that already have an edge from the spot (one bulk
//!    lookup; failure aborts the build).
//! 4. Request distance matrices group by group and persist each group's
//!    edges as soon as it returns. Member pairs beyond the threshold are
//!    dropped from the response.
//!
//! Only an unresolvable origin or a failed existence lookup is an error.
//! Everything else is counted in the returned [`BuildReport`].

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use carcamp_geo::geohash;
use carcamp_store::{EdgeStore, Spot, SpotStore};

use crate::batcher::MatrixBatcher;
use crate::config::GraphConfig;
use crate::ledger::DistanceLedger;
use crate::providers::DistanceMatrixProvider;
use crate::proximity::ProximityFilter;

/// Counters for one spot's build.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub spot_id: String,
    pub cells_queried: usize,
    pub cells_failed: usize,
    /// Spots returned by the cell queries, origin included.
    pub candidates: usize,
    pub in_range: usize,
    pub missing: usize,
    pub groups: usize,
    pub groups_failed: usize,
    pub edges_written: usize,
    pub edge_writes_failed: usize,
    pub skipped_pairs: usize,
    pub out_of_range_pairs: usize,
}

impl BuildReport {
    fn new(spot_id: &str) -> Self {
        Self {
            spot_id: spot_id.to_string(),
            ..Self::default()
        }
    }

    /// True if any step hit a recoverable failure.
    pub fn is_partial(&self) -> bool {
        self.cells_failed > 0 || self.groups_failed > 0 || self.edge_writes_failed > 0
    }
}

/// Computes and stores the edges from one spot to its nearby spots.
#[derive(Clone)]
pub struct GraphBuilder {
    spots: Arc<dyn SpotStore>,
    ledger: DistanceLedger,
    batcher: MatrixBatcher,
    filter: ProximityFilter,
    cell_precision: usize,
}

impl GraphBuilder {
    pub fn new(
        spots: Arc<dyn SpotStore>,
        edges: Arc<dyn EdgeStore>,
        provider: Arc<dyn DistanceMatrixProvider>,
    ) -> Self {
        let defaults = GraphConfig::default();
        let filter = ProximityFilter::new(defaults.threshold_meters);
        Self {
            spots,
            ledger: DistanceLedger::new(edges),
            batcher: MatrixBatcher::new(provider).with_filter(filter),
            filter,
            cell_precision: defaults.cell_precision,
        }
    }

    pub fn with_config(mut self, config: &GraphConfig) -> Self {
        self.filter = ProximityFilter::new(config.threshold_meters);
        self.batcher = self.batcher.with_filter(self.filter);
        self.cell_precision = config.cell_precision.clamp(1, geohash::SPOT_PRECISION);
        self
    }

    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.batcher = self.batcher.with_group_size(group_size);
        self
    }

    /// Resolve `spot_id` and build its edges.
    pub async fn build_spot(&self, spot_id: &str) -> Result<BuildReport> {
        let origin = self
            .spots
            .get_spot(spot_id)
            .await
            .with_context(|| format!("Failed to load spot {}", spot_id))?
            .ok_or_else(|| anyhow!("Spot not found: {}", spot_id))?;
        self.build(&origin).await
    }

    /// Build the outgoing edges of `origin`.
    #[instrument(skip(self, origin), fields(spot_id = %origin.id))]
    pub async fn build(&self, origin: &Spot) -> Result<BuildReport> {
        let mut report = BuildReport::new(&origin.id);

        let candidates = self.collect_candidates(origin, &mut report).await?;
        report.candidates = candidates.len();

        let in_range = self.filter.filter(origin, candidates);
        report.in_range = in_range.len();
        if in_range.is_empty() {
            debug!("No spots near {}", origin.id);
            return Ok(report);
        }

        let missing = self
            .ledger
            .missing_destinations(origin, in_range)
            .await
            .with_context(|| format!("Failed to check existing edges for {}", origin.id))?;
        report.missing = missing.len();

        if missing.is_empty() {
            debug!("No missing edges for {}", origin.id);
            return Ok(report);
        }

        for (index, group) in self.batcher.partition(&missing).into_iter().enumerate() {
            report.groups += 1;
            let group_edges = match self.batcher.compute_group(origin, group).await {
                Ok(group_edges) => group_edges,
                Err(e) => {
                    warn!(
                        spot_id = %origin.id,
                        group = index,
                        size = group.len(),
                        error = %e,
                        "Distance matrix request failed, skipping group"
                    );
                    report.groups_failed += 1;
                    continue;
                }
            };
            report.skipped_pairs += group_edges.skipped_pairs;
            report.out_of_range_pairs += group_edges.out_of_range_pairs;

            let persisted = self.ledger.persist_edges(&group_edges.edges).await;
            report.edges_written += persisted.written;
            report.edge_writes_failed += persisted.failed;
        }

        info!(
            "Built {}: {} in range, {} missing, {} edges written ({} groups, {} failed)",
            origin.id,
            report.in_range,
            report.missing,
            report.edges_written,
            report.groups,
            report.groups_failed
        );
        Ok(report)
    }

    /// Spots in the origin's cell and its eight neighbors.
    async fn collect_candidates(&self, origin: &Spot, report: &mut BuildReport) -> Result<Vec<Spot>> {
        let cell = origin
            .cell(self.cell_precision)
            .ok_or_else(|| anyhow!("Spot {} has malformed geohash '{}'", origin.id, origin.geohash))?;
        if cell.len() < self.cell_precision {
            return Err(anyhow!(
                "Spot {} has geohash '{}', shorter than cell precision {}",
                origin.id,
                origin.geohash,
                self.cell_precision
            ));
        }
        let neighbors = geohash::neighbors(cell)
            .with_context(|| format!("Invalid geohash on spot {}", origin.id))?;

        let mut candidates = Vec::new();
        for cell in std::iter::once(cell).chain(neighbors.iter().map(String::as_str)) {
            report.cells_queried += 1;
            match self.spots.query_by_cell_prefix(cell).await {
                Ok(spots) => candidates.extend(spots),
                Err(e) => {
                    warn!(spot_id = %origin.id, cell, error = %e, "Cell lookup failed, skipping");
                    report.cells_failed += 1;
                }
            }
        }
        Ok(candidates)
    }
}
