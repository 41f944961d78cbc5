use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

pub mod batcher;
pub mod builder;
pub mod config;
pub mod jobs;
pub mod ledger;
pub mod providers;
pub mod proximity;

#[cfg(test)]
mod testing;

pub use batcher::{GroupEdges, MatrixBatcher, DEFAULT_GROUP_SIZE};
pub use builder::{BuildReport, GraphBuilder};
pub use config::{CarcampConfig, GraphConfig, JobConfig, MapboxConfig};
pub use jobs::{CatalogSummary, CatalogSync, ImportSummary, RebuildJob, RebuildSummary, SpotImporter};
pub use ledger::{DistanceLedger, PersistReport};
pub use providers::{DistanceMatrix, DistanceMatrixProvider, FeatureCatalog, MapboxClient, ProviderError};
pub use proximity::{ProximityFilter, DEFAULT_THRESHOLD_METERS};

pub use carcamp_store::{Database, EdgeStore, Spot, SpotDistance, SpotStore, SpotType};

#[derive(Debug, Clone)]
pub struct CarcampPaths {
    pub base_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl CarcampPaths {
    pub fn from_env() -> Self {
        if let Some(dir) = std::env::var_os("CARCAMP_DATA_DIR") {
            return Self::from_base(PathBuf::from(dir));
        }
        if let Some(home) = std::env::var_os("HOME") {
            return Self::from_base(PathBuf::from(home).join(".carcamp"));
        }
        Self::from_base(PathBuf::from(".carcamp"))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let db_path = base_dir.join("carcamp.db");
        let config_path = base_dir.join("carcamp.toml");
        Self {
            base_dir,
            db_path,
            config_path,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

/// Storage, Mapbox client and builder wired from configuration.
#[derive(Clone)]
pub struct Core {
    pub config: CarcampConfig,
    pub db: Database,
    pub mapbox: Arc<MapboxClient>,
    pub builder: GraphBuilder,
}

impl Core {
    pub async fn init(paths: &CarcampPaths) -> Result<Self> {
        info!("Initializing Carcamp Core...");
        paths.ensure_dirs()?;
        let config = CarcampConfig::load(&paths.config_path)?;
        let db = Database::open(&paths.db_path).await?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: CarcampConfig, db: Database) -> Result<Self> {
        let mapbox = Arc::new(MapboxClient::new(&config.mapbox)?);
        let builder = GraphBuilder::new(
            Arc::new(db.spot_store()),
            Arc::new(db.edge_store()),
            mapbox.clone(),
        )
        .with_config(&config.graph)
        .with_group_size(config.mapbox.group_size());

        Ok(Self {
            config,
            db,
            mapbox,
            builder,
        })
    }

    pub fn spot_store(&self) -> Arc<dyn SpotStore> {
        Arc::new(self.db.spot_store())
    }

    pub fn edge_store(&self) -> Arc<dyn EdgeStore> {
        Arc::new(self.db.edge_store())
    }

    pub fn rebuild_job(&self) -> RebuildJob {
        RebuildJob::new(self.spot_store(), self.builder.clone()).with_config(&self.config.jobs)
    }

    pub fn catalog_sync(&self) -> CatalogSync {
        CatalogSync::new(self.spot_store(), self.mapbox.clone(), self.config.jobs.page_size)
    }

    pub fn importer(&self) -> SpotImporter {
        SpotImporter::new(self.spot_store(), self.builder.clone()).with_catalog(self.mapbox.clone())
    }

    /// Stored edges leaving `spot_id`, shortest drive first.
    pub async fn nearby(&self, spot_id: &str) -> Result<Vec<SpotDistance>> {
        self.db.edge_store().edges_from(spot_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_from_base() {
        let paths = CarcampPaths::from_base(PathBuf::from("/tmp/carcamp"));
        assert_eq!(paths.db_path, PathBuf::from("/tmp/carcamp/carcamp.db"));
        assert_eq!(paths.config_path, PathBuf::from("/tmp/carcamp/carcamp.toml"));
    }

    #[tokio::test]
    async fn test_init_applies_config() {
        let dir = TempDir::new().unwrap();
        let paths = CarcampPaths::from_base(dir.path().join("data"));
        paths.ensure_dirs().unwrap();
        std::fs::write(
            &paths.config_path,
            "[mapbox]\nmax_coordinates = 10\n\n[jobs]\nconcurrency = 3\n",
        )
        .unwrap();

        let core = Core::init(&paths).await.unwrap();
        assert!(paths.db_path.exists());
        assert_eq!(core.config.mapbox.group_size(), 9);
        assert_eq!(core.config.jobs.concurrency, 3);
        assert!(core.nearby("anything").await.unwrap().is_empty());
    }
}
