//! Which edges already exist, and recording new ones.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use carcamp_store::{EdgeStore, Spot, SpotDistance};

/// Outcome of writing a batch of edges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    pub written: usize,
    pub failed: usize,
}

/// The persisted edge set, seen from the builder.
#[derive(Clone)]
pub struct DistanceLedger {
    store: Arc<dyn EdgeStore>,
}

impl DistanceLedger {
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self { store }
    }

    /// Ids among `candidate_ids` that already have an edge from `origin_id`.
    /// One bulk query per call.
    pub async fn existing_destinations(
        &self,
        origin_id: &str,
        candidate_ids: &[String],
    ) -> Result<HashSet<String>> {
        let edges = self
            .store
            .query_existing_edges(origin_id, candidate_ids)
            .await?;
        Ok(edges.into_iter().map(|edge| edge.destination_id).collect())
    }

    /// Candidates with no edge from `origin` yet, in input order.
    pub async fn missing_destinations(
        &self,
        origin: &Spot,
        candidates: Vec<Spot>,
    ) -> Result<Vec<Spot>> {
        let ids: Vec<String> = candidates.iter().map(|spot| spot.id.clone()).collect();
        let existing = self.existing_destinations(&origin.id, &ids).await?;
        Ok(candidates
            .into_iter()
            .filter(|spot| !existing.contains(&spot.id))
            .collect())
    }

    /// Write every edge independently. A failed write is logged and counted;
    /// the rest still go through.
    pub async fn persist_edges(&self, edges: &[SpotDistance]) -> PersistReport {
        let mut report = PersistReport::default();
        for edge in edges {
            match self.store.put_edge(edge).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    warn!(
                        spot_id = %edge.origin_id,
                        destination_id = %edge.destination_id,
                        error = %e,
                        "Failed to persist edge"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }
}
