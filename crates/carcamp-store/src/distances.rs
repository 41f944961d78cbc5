//! Spot distance (edge) storage.
//!
//! Edges are keyed by `(origin_id, destination_id)` and never change once
//! written. Writing a pair that already exists keeps the stored record, so
//! two builders racing on the same pair still leave a single record.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use crate::schema::{SpotDistance, SpotType};

/// Read/write access to directed spot distances.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Edges from `origin_id` to any of `destination_ids`, in one query.
    async fn query_existing_edges(
        &self,
        origin_id: &str,
        destination_ids: &[String],
    ) -> Result<Vec<SpotDistance>>;

    /// Write one edge. No existence precondition; an existing record for
    /// the same pair is left as is.
    async fn put_edge(&self, edge: &SpotDistance) -> Result<()>;

    /// Every edge leaving `origin_id`, shortest drive first.
    async fn edges_from(&self, origin_id: &str) -> Result<Vec<SpotDistance>>;

    /// Total number of stored edges.
    async fn edge_count(&self) -> Result<i64>;
}

type EdgeRow = (
    String,
    String,
    f64,
    f64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

const EDGE_COLUMNS: &str = "origin_id, destination_id, distance_meters, duration_seconds, \
     creation_time, destination_name, destination_spot_type, destination_image_url, \
     destination_description";

fn edge_from_row(row: EdgeRow) -> Result<SpotDistance> {
    let (
        origin_id,
        destination_id,
        distance_meters,
        duration_seconds,
        creation_time,
        destination_name,
        destination_spot_type,
        destination_image_url,
        destination_description,
    ) = row;

    let creation_time = DateTime::parse_from_rfc3339(&creation_time)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| {
            format!(
                "Invalid creation_time on edge {} -> {}",
                origin_id, destination_id
            )
        })?;

    Ok(SpotDistance {
        origin_id,
        destination_id,
        distance_meters,
        duration_seconds,
        creation_time,
        destination_name,
        destination_spot_type: destination_spot_type.as_deref().and_then(SpotType::parse),
        destination_image_url,
        destination_description,
    })
}

/// `EdgeStore` backed by SQLite.
#[derive(Clone)]
pub struct SqliteEdgeStore {
    pool: SqlitePool,
}

impl SqliteEdgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip_all)]
    pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS spot_distances (
                origin_id TEXT NOT NULL,
                destination_id TEXT NOT NULL,
                distance_meters REAL NOT NULL,
                duration_seconds REAL NOT NULL,
                creation_time TEXT NOT NULL,
                destination_name TEXT,
                destination_spot_type TEXT,
                destination_image_url TEXT,
                destination_description TEXT,
                PRIMARY KEY (origin_id, destination_id)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_spot_distances_destination
             ON spot_distances(destination_id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl EdgeStore for SqliteEdgeStore {
    #[instrument(skip(self, destination_ids), fields(candidates = destination_ids.len()))]
    async fn query_existing_edges(
        &self,
        origin_id: &str,
        destination_ids: &[String],
    ) -> Result<Vec<SpotDistance>> {
        if destination_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = destination_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(",");
        let query = format!(
            "SELECT {} FROM spot_distances WHERE origin_id = ? AND destination_id IN ({})",
            EDGE_COLUMNS, placeholders
        );

        let mut q = sqlx::query_as::<_, EdgeRow>(&query).bind(origin_id);
        for id in destination_ids {
            q = q.bind(id);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query existing edges from {}", origin_id))?;

        rows.into_iter().map(edge_from_row).collect()
    }

    async fn put_edge(&self, edge: &SpotDistance) -> Result<()> {
        sqlx::query(
            "INSERT INTO spot_distances (origin_id, destination_id, distance_meters,
                duration_seconds, creation_time, destination_name, destination_spot_type,
                destination_image_url, destination_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(origin_id, destination_id) DO NOTHING",
        )
        .bind(&edge.origin_id)
        .bind(&edge.destination_id)
        .bind(edge.distance_meters)
        .bind(edge.duration_seconds)
        .bind(edge.creation_time.to_rfc3339())
        .bind(&edge.destination_name)
        .bind(edge.destination_spot_type.map(|t| t.as_str()))
        .bind(&edge.destination_image_url)
        .bind(&edge.destination_description)
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "Failed to write edge {} -> {}",
                edge.origin_id, edge.destination_id
            )
        })?;

        Ok(())
    }

    async fn edges_from(&self, origin_id: &str) -> Result<Vec<SpotDistance>> {
        let query = format!(
            "SELECT {} FROM spot_distances WHERE origin_id = ?1 ORDER BY duration_seconds",
            EDGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, EdgeRow>(&query)
            .bind(origin_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(edge_from_row).collect()
    }

    async fn edge_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spot_distances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
