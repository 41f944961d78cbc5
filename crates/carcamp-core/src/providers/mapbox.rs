//! Mapbox Directions Matrix and Datasets client.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use carcamp_geo::Coordinate;
use carcamp_store::Spot;

use super::{DistanceMatrix, DistanceMatrixProvider, FeatureCatalog, ProviderError};
use crate::config::MapboxConfig;

#[derive(Debug, Deserialize)]
struct MatrixBody {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
}

/// HTTP client for the Mapbox APIs used by Carcamp.
#[derive(Clone)]
pub struct MapboxClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    owner: Option<String>,
    dataset_id: Option<String>,
    max_coordinates: usize,
}

impl MapboxClient {
    pub fn new(config: &MapboxConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            owner: config.owner.clone(),
            dataset_id: config.dataset_id.clone(),
            max_coordinates: config.max_coordinates.max(2),
        })
    }

    fn token(&self) -> Result<&str, ProviderError> {
        self.access_token
            .as_deref()
            .ok_or(ProviderError::NotConfigured("mapbox.access_token"))
    }

    async fn read_success(response: reqwest::Response) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// `lon,lat;lon,lat;...` with six decimals, as the matrix API expects.
fn coordinate_path(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(|c| format!("{:.6},{:.6}", c.longitude, c.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

#[async_trait]
impl DistanceMatrixProvider for MapboxClient {
    fn max_coordinates(&self) -> usize {
        self.max_coordinates
    }

    #[instrument(skip(self, coordinates), fields(coordinates = coordinates.len()))]
    async fn driving_matrix(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<DistanceMatrix, ProviderError> {
        let count = coordinates.len();
        if count < 2 || count > self.max_coordinates {
            return Err(ProviderError::CoordinateCount {
                count,
                limit: self.max_coordinates,
            });
        }

        let url = format!(
            "{}/directions-matrix/v1/mapbox/driving/{}",
            self.base_url,
            coordinate_path(coordinates)
        );
        debug!("Requesting {}x{} driving matrix", count, count);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("annotations", "duration,distance"),
                ("access_token", self.token()?),
            ])
            .send()
            .await?;
        let body = Self::read_success(response).await?;

        let parsed: MatrixBody = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        if parsed.code != "Ok" {
            return Err(ProviderError::Rejected {
                code: parsed.code,
                message: parsed.message.unwrap_or_default(),
            });
        }

        let matrix = DistanceMatrix {
            durations: parsed
                .durations
                .ok_or_else(|| ProviderError::Malformed("missing durations".to_string()))?,
            distances: parsed
                .distances
                .ok_or_else(|| ProviderError::Malformed("missing distances".to_string()))?,
        };
        matrix.validate(count)?;
        Ok(matrix)
    }
}

#[async_trait]
impl FeatureCatalog for MapboxClient {
    #[instrument(skip(self, spot), fields(spot_id = %spot.id))]
    async fn upsert_feature(&self, spot: &Spot) -> Result<(), ProviderError> {
        let owner = self
            .owner
            .as_deref()
            .ok_or(ProviderError::NotConfigured("mapbox.owner"))?;
        let dataset_id = self
            .dataset_id
            .as_deref()
            .ok_or(ProviderError::NotConfigured("mapbox.dataset_id"))?;

        let url = format!(
            "{}/datasets/v1/{}/{}/features/{}",
            self.base_url, owner, dataset_id, spot.id
        );
        let feature = serde_json::json!({
            "id": spot.id,
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [spot.longitude, spot.latitude],
            },
            "properties": {
                "Name": spot.name.clone().unwrap_or_default(),
                "SpotType": spot.spot_type.as_str(),
                "SpotId": spot.id,
            },
        });

        let response = self
            .http
            .put(&url)
            .query(&[("access_token", self.token()?)])
            .json(&feature)
            .send()
            .await?;
        Self::read_success(response).await?;
        Ok(())
    }
}
