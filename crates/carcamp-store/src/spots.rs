//! Spot storage.
//!
//! Spots are listed through the `category = 'spots'` index together with
//! their geohash, so a geohash prefix selects every spot inside a cell.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use crate::schema::{Spot, SpotType, SPOT_CATEGORY};

/// One page of a full spot scan.
#[derive(Debug, Clone, Default)]
pub struct SpotPage {
    pub spots: Vec<Spot>,
    /// Token for the next page; `None` once the scan is exhausted.
    pub next_page_token: Option<String>,
}

/// Read/write access to spots.
#[async_trait]
pub trait SpotStore: Send + Sync {
    /// Look up a single spot by id.
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>>;

    /// All spots whose geohash starts with `cell_prefix`.
    async fn query_by_cell_prefix(&self, cell_prefix: &str) -> Result<Vec<Spot>>;

    /// Paginated scan over every spot, ordered by id.
    async fn query_all_spots(&self, page_token: Option<&str>, limit: usize) -> Result<SpotPage>;

    /// Insert a new spot. Fails if a spot with the same id exists.
    async fn insert_spot(&self, spot: &Spot) -> Result<()>;
}

type SpotRow = (
    String,
    f64,
    f64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    Option<String>,
    String,
);

const SPOT_COLUMNS: &str = "id, latitude, longitude, geohash, spot_type, name, description, \
     address, code, prefecture, city, home_page_urls, tags, default_image_url, creation_time";

fn spot_from_row(row: SpotRow) -> Result<Spot> {
    let (
        id,
        latitude,
        longitude,
        geohash,
        spot_type,
        name,
        description,
        address,
        code,
        prefecture,
        city,
        home_page_urls,
        tags,
        default_image_url,
        creation_time,
    ) = row;

    let spot_type = SpotType::parse(&spot_type)
        .ok_or_else(|| anyhow!("Unknown spot type '{}' on spot {}", spot_type, id))?;
    let home_page_urls = serde_json::from_str(&home_page_urls)
        .with_context(|| format!("Invalid home_page_urls on spot {}", id))?;
    let tags =
        serde_json::from_str(&tags).with_context(|| format!("Invalid tags on spot {}", id))?;
    let creation_time = DateTime::parse_from_rfc3339(&creation_time)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid creation_time on spot {}", id))?;

    Ok(Spot {
        id,
        latitude,
        longitude,
        geohash,
        spot_type,
        name,
        description,
        address,
        code,
        prefecture,
        city,
        home_page_urls,
        tags,
        default_image_url,
        creation_time,
    })
}

/// `SpotStore` backed by SQLite.
#[derive(Clone)]
pub struct SqliteSpotStore {
    pool: SqlitePool,
}

impl SqliteSpotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip_all)]
    pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS spots (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                geohash TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                spot_type TEXT NOT NULL,
                name TEXT,
                description TEXT,
                address TEXT,
                code TEXT,
                prefecture TEXT,
                city TEXT,
                home_page_urls TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                default_image_url TEXT,
                creation_time TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        // Cell lookups: category equality plus geohash prefix range.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_spots_category_geohash ON spots(category, geohash)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SpotStore for SqliteSpotStore {
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>> {
        let query = format!("SELECT {} FROM spots WHERE id = ?1", SPOT_COLUMNS);
        let row = sqlx::query_as::<_, SpotRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(spot_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn query_by_cell_prefix(&self, cell_prefix: &str) -> Result<Vec<Spot>> {
        // Prefix match as a range scan; '~' sorts after every geohash character.
        let upper = format!("{}~", cell_prefix);
        let query = format!(
            "SELECT {} FROM spots
             WHERE category = ?1 AND geohash >= ?2 AND geohash < ?3
             ORDER BY geohash",
            SPOT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SpotRow>(&query)
            .bind(SPOT_CATEGORY)
            .bind(cell_prefix)
            .bind(&upper)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query spots in cell {}", cell_prefix))?;

        rows.into_iter().map(spot_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn query_all_spots(&self, page_token: Option<&str>, limit: usize) -> Result<SpotPage> {
        let limit = limit.max(1);
        let query = format!(
            "SELECT {} FROM spots
             WHERE category = ?1 AND id > ?2
             ORDER BY id
             LIMIT ?3",
            SPOT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SpotRow>(&query)
            .bind(SPOT_CATEGORY)
            .bind(page_token.unwrap_or(""))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let spots = rows
            .into_iter()
            .map(spot_from_row)
            .collect::<Result<Vec<_>>>()?;
        let next_page_token = if spots.len() == limit {
            spots.last().map(|spot| spot.id.clone())
        } else {
            None
        };

        Ok(SpotPage {
            spots,
            next_page_token,
        })
    }

    #[instrument(skip(self, spot), fields(spot_id = %spot.id))]
    async fn insert_spot(&self, spot: &Spot) -> Result<()> {
        sqlx::query(
            "INSERT INTO spots (id, category, geohash, latitude, longitude, spot_type, name,
                description, address, code, prefecture, city, home_page_urls, tags,
                default_image_url, creation_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&spot.id)
        .bind(SPOT_CATEGORY)
        .bind(&spot.geohash)
        .bind(spot.latitude)
        .bind(spot.longitude)
        .bind(spot.spot_type.as_str())
        .bind(&spot.name)
        .bind(&spot.description)
        .bind(&spot.address)
        .bind(&spot.code)
        .bind(&spot.prefecture)
        .bind(&spot.city)
        .bind(serde_json::to_string(&spot.home_page_urls)?)
        .bind(serde_json::to_string(&spot.tags)?)
        .bind(&spot.default_image_url)
        .bind(spot.creation_time.to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert spot {}", spot.id))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_store() -> SqliteSpotStore {
        Database::open_in_memory().await.unwrap().spot_store()
    }

    #[tokio::test]
    async fn test_insert_and_get_spot() {
        let store = setup_store().await;

        let mut spot = Spot::new("s1", 35.067784, 137.0011201, SpotType::RoadSideStation)
            .with_name("Mikasa");
        spot.tags = vec!["Atm".to_string(), "Shop".to_string()];
        spot.home_page_urls = vec!["https://www.michi-no-eki.jp/stations/view/1".to_string()];
        spot.prefecture = Some("Hokkaido".to_string());
        store.insert_spot(&spot).await.unwrap();

        let loaded = store.get_spot("s1").await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Mikasa"));
        assert_eq!(loaded.geohash, spot.geohash);
        assert_eq!(loaded.spot_type, SpotType::RoadSideStation);
        assert_eq!(loaded.tags, spot.tags);
        assert_eq!(loaded.home_page_urls, spot.home_page_urls);
        assert_eq!(loaded.prefecture.as_deref(), Some("Hokkaido"));

        assert!(store.get_spot("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_is_conditional_on_id() {
        let store = setup_store().await;
        let spot = Spot::new("s1", 35.0, 137.0, SpotType::Parking);
        store.insert_spot(&spot).await.unwrap();
        assert!(store.insert_spot(&spot).await.is_err());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spots")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_query_by_cell_prefix() {
        let store = setup_store().await;

        // Tokyo Station and Shibuya share "xn76"; Sapporo does not.
        let tokyo = Spot::new("tokyo", 35.681236, 139.767125, SpotType::Parking);
        let shibuya = Spot::new("shibuya", 35.658034, 139.701636, SpotType::Parking);
        let sapporo = Spot::new("sapporo", 43.06417, 141.34694, SpotType::Parking);
        for spot in [&tokyo, &shibuya, &sapporo] {
            store.insert_spot(spot).await.unwrap();
        }

        let mut ids: Vec<String> = store
            .query_by_cell_prefix("xn76")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["shibuya", "tokyo"]);

        let exact = store.query_by_cell_prefix(&tokyo.geohash).await.unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].id, "tokyo");

        assert!(store.query_by_cell_prefix("zzzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_all_spots_paginates() {
        let store = setup_store().await;
        for i in 0..5 {
            let spot = Spot::new(format!("spot-{}", i), 35.0 + i as f64 * 0.01, 137.0, SpotType::Campground);
            store.insert_spot(&spot).await.unwrap();
        }

        let first = store.query_all_spots(None, 2).await.unwrap();
        assert_eq!(first.spots.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("spot-1"));

        let mut seen: Vec<String> = first.spots.into_iter().map(|s| s.id).collect();
        let mut token = first.next_page_token;
        while let Some(current) = token {
            let page = store.query_all_spots(Some(&current), 2).await.unwrap();
            seen.extend(page.spots.into_iter().map(|s| s.id));
            token = page.next_page_token;
        }

        assert_eq!(seen, vec!["spot-0", "spot-1", "spot-2", "spot-3", "spot-4"]);
    }

    #[tokio::test]
    async fn test_corrupt_columns_are_errors() {
        let store = setup_store().await;
        store
            .insert_spot(&Spot::new("s1", 35.0, 137.0, SpotType::Parking))
            .await
            .unwrap();

        sqlx::query("UPDATE spots SET tags = 'not json' WHERE id = 's1'")
            .execute(&store.pool)
            .await
            .unwrap();
        let err = store.get_spot("s1").await.unwrap_err();
        assert!(err.to_string().contains("Invalid tags"));

        sqlx::query("UPDATE spots SET tags = '[]', creation_time = 'never' WHERE id = 's1'")
            .execute(&store.pool)
            .await
            .unwrap();
        let err = store.get_spot("s1").await.unwrap_err();
        assert!(err.to_string().contains("Invalid creation_time"));
    }
}
