use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use carcamp_store::{Spot, SpotStore};

use crate::builder::GraphBuilder;
use crate::providers::FeatureCatalog;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub received: usize,
    pub inserted: usize,
    /// Same type at the same geohash as a stored spot.
    pub duplicates: usize,
    pub insert_failed: usize,
    pub published: usize,
    pub publish_failed: usize,
    pub builds_failed: usize,
    pub edges_written: usize,
}

/// Read a JSON array of spots.
pub fn read_spots(path: &Path) -> Result<Vec<Spot>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse spots from {}", path.display()))
}

/// Inserts new spots, publishes them, then builds their edges.
///
/// Every spot is inserted before any build starts, so spots from the same
/// batch see each other as candidates.
pub struct SpotImporter {
    spots: Arc<dyn SpotStore>,
    builder: GraphBuilder,
    catalog: Option<Arc<dyn FeatureCatalog>>,
}

impl SpotImporter {
    pub fn new(spots: Arc<dyn SpotStore>, builder: GraphBuilder) -> Self {
        Self {
            spots,
            builder,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn FeatureCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub async fn import(&self, incoming: Vec<Spot>) -> Result<ImportSummary> {
        let mut summary = ImportSummary {
            received: incoming.len(),
            ..ImportSummary::default()
        };
        let mut inserted = Vec::new();

        for mut spot in incoming {
            spot.refresh_geohash();

            match self.is_duplicate(&spot).await {
                Ok(true) => {
                    debug!(spot_id = %spot.id, "Same spot already stored, skipping");
                    summary.duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(spot_id = %spot.id, error = %e, "Duplicate check failed");
                    summary.insert_failed += 1;
                    continue;
                }
            }

            if let Err(e) = self.spots.insert_spot(&spot).await {
                warn!(spot_id = %spot.id, error = %e, "Insert failed");
                summary.insert_failed += 1;
                continue;
            }
            summary.inserted += 1;

            if let Some(catalog) = &self.catalog {
                match catalog.upsert_feature(&spot).await {
                    Ok(()) => summary.published += 1,
                    Err(e) => {
                        warn!(spot_id = %spot.id, error = %e, "Failed to publish spot");
                        summary.publish_failed += 1;
                    }
                }
            }
            inserted.push(spot);
        }

        for spot in &inserted {
            match self.builder.build(spot).await {
                Ok(report) => summary.edges_written += report.edges_written,
                Err(e) => {
                    warn!(spot_id = %spot.id, error = %e, "Build failed");
                    summary.builds_failed += 1;
                }
            }
        }

        info!(
            "Imported {} of {} spots ({} duplicates), {} edges written",
            summary.inserted, summary.received, summary.duplicates, summary.edges_written
        );
        Ok(summary)
    }

    async fn is_duplicate(&self, spot: &Spot) -> Result<bool> {
        let same_cell = self.spots.query_by_cell_prefix(&spot.geohash).await?;
        Ok(same_cell
            .iter()
            .any(|existing| existing.spot_type == spot.spot_type && existing.geohash == spot.geohash))
    }
}
