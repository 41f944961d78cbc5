//! Carcamp Store - persistence for spots and the distance graph.
//!
//! This crate owns the SQLite database behind Carcamp. It includes:
//!
//! - **Schema**: `Spot`, `SpotType` and `SpotDistance` records
//! - **Spots**: the `SpotStore` trait (cell-prefix and paginated queries)
//! - **Distances**: the `EdgeStore` trait (bulk existence check, edge writes)
//!
//! Both traits have SQLite implementations sharing one pool, opened through
//! [`Database`].
//!
//! # Example
//!
//! ```ignore
//! use carcamp_store::{Database, Spot, SpotType, SpotStore};
//!
//! let db = Database::open(&paths.db_path).await?;
//! let spots = db.spot_store();
//! spots.insert_spot(&Spot::new("s1", 35.07, 137.00, SpotType::RoadSideStation)).await?;
//! let in_cell = spots.query_by_cell_prefix("xn3n").await?;
//! ```

pub mod distances;
pub mod schema;
pub mod spots;

pub use distances::{EdgeStore, SqliteEdgeStore};
pub use schema::{Spot, SpotDistance, SpotType, SPOT_CATEGORY};
pub use spots::{SpotPage, SpotStore, SqliteSpotStore};

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, SqlitePool};
use tracing::instrument;

/// Handle on the Carcamp SQLite database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database file and initialize the schema.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::from_str("sqlite:")?
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&pool)
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// A private in-memory database. Single connection, so every handle
    /// sees the same data.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub fn spot_store(&self) -> SqliteSpotStore {
        SqliteSpotStore::new(self.pool.clone())
    }

    pub fn edge_store(&self) -> SqliteEdgeStore {
        SqliteEdgeStore::new(self.pool.clone())
    }

    #[instrument(skip_all)]
    async fn init_schema(&self) -> Result<()> {
        SqliteSpotStore::init_schema(&self.pool).await?;
        SqliteEdgeStore::init_schema(&self.pool).await?;
        Ok(())
    }
}
