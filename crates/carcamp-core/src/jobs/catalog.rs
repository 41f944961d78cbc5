use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use carcamp_store::SpotStore;

use crate::providers::FeatureCatalog;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub synced: usize,
    pub failed: usize,
}

/// Publishes every stored spot as a point feature.
pub struct CatalogSync {
    spots: Arc<dyn SpotStore>,
    catalog: Arc<dyn FeatureCatalog>,
    page_size: usize,
}

impl CatalogSync {
    pub fn new(spots: Arc<dyn SpotStore>, catalog: Arc<dyn FeatureCatalog>, page_size: usize) -> Self {
        Self {
            spots,
            catalog,
            page_size: page_size.max(1),
        }
    }

    pub async fn run(&self) -> Result<CatalogSummary> {
        let mut summary = CatalogSummary::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .spots
                .query_all_spots(page_token.as_deref(), self.page_size)
                .await
                .context("Failed to list spots")?;

            for spot in &page.spots {
                match self.catalog.upsert_feature(spot).await {
                    Ok(()) => summary.synced += 1,
                    Err(e) => {
                        warn!(spot_id = %spot.id, error = %e, "Failed to publish spot");
                        summary.failed += 1;
                    }
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(
            "Catalog sync complete: {} published, {} failed",
            summary.synced, summary.failed
        );
        Ok(summary)
    }
}
