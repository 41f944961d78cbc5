use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use carcamp_store::SpotStore;

use crate::builder::{BuildReport, GraphBuilder};
use crate::config::JobConfig;

/// Totals over a full rebuild.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub spots: usize,
    pub spots_failed: usize,
    /// Spots built with at least one recoverable failure.
    pub spots_partial: usize,
    pub groups: usize,
    pub groups_failed: usize,
    pub edges_written: usize,
    pub edge_writes_failed: usize,
}

impl RebuildSummary {
    fn record(&mut self, result: Result<(String, Result<BuildReport>), JoinError>) {
        self.spots += 1;
        match result {
            Ok((_, Ok(report))) => {
                if report.is_partial() {
                    self.spots_partial += 1;
                }
                self.groups += report.groups;
                self.groups_failed += report.groups_failed;
                self.edges_written += report.edges_written;
                self.edge_writes_failed += report.edge_writes_failed;
            }
            Ok((spot_id, Err(e))) => {
                warn!(spot_id = %spot_id, error = %e, "Build failed");
                self.spots_failed += 1;
            }
            Err(join_err) => {
                warn!(error = %join_err, "Build task panicked");
                self.spots_failed += 1;
            }
        }
    }
}

/// Builds edges for every spot in the store.
///
/// Spots are scanned page by page; at most `concurrency` builds run at once.
/// One spot failing never stops the job.
pub struct RebuildJob {
    spots: Arc<dyn SpotStore>,
    builder: GraphBuilder,
    concurrency: usize,
    page_size: usize,
}

impl RebuildJob {
    pub fn new(spots: Arc<dyn SpotStore>, builder: GraphBuilder) -> Self {
        let defaults = JobConfig::default();
        Self {
            spots,
            builder,
            concurrency: defaults.concurrency,
            page_size: defaults.page_size,
        }
    }

    pub fn with_config(self, config: &JobConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            page_size: config.page_size.max(1),
            ..self
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fails only if the spot listing itself fails.
    pub async fn run(&self) -> Result<RebuildSummary> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut builds = JoinSet::new();
        let mut summary = RebuildSummary::default();
        let mut page_token: Option<String> = None;

        info!(
            "Rebuilding proximity graph (concurrency: {})",
            self.concurrency
        );

        loop {
            let page = self
                .spots
                .query_all_spots(page_token.as_deref(), self.page_size)
                .await
                .context("Failed to list spots")?;

            for spot in page.spots {
                // Wait for a free slot before spawning so pending builds
                // never pile up beyond the limit.
                let permit = Arc::clone(&semaphore).acquire_owned().await?;
                let builder = self.builder.clone();
                builds.spawn(async move {
                    let _permit = permit;
                    let result = builder.build(&spot).await;
                    (spot.id, result)
                });

                while let Some(result) = builds.try_join_next() {
                    summary.record(result);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        while let Some(result) = builds.join_next().await {
            summary.record(result);
        }

        info!(
            "Rebuild complete: {} spots ({} failed), {} edges written",
            summary.spots, summary.spots_failed, summary.edges_written
        );
        Ok(summary)
    }
}
