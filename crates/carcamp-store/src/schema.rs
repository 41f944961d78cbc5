//! Record types for spots and the distance graph.
//!
//! - `SpotType`: category tag of a spot
//! - `Spot`: a geolocated point of interest
//! - `SpotDistance`: a directed driving distance/duration edge between two spots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carcamp_geo::{geohash, Coordinate};

/// Listing category every spot row is indexed under.
pub const SPOT_CATEGORY: &str = "spots";

/// Kinds of spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotType {
    /// Michi-no-eki roadside station
    RoadSideStation,
    Campground,
    HotSpring,
    /// Overnight parking area
    Parking,
    Viewpoint,
}

impl SpotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotType::RoadSideStation => "road_side_station",
            SpotType::Campground => "campground",
            SpotType::HotSpring => "hot_spring",
            SpotType::Parking => "parking",
            SpotType::Viewpoint => "viewpoint",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "road_side_station" => Some(SpotType::RoadSideStation),
            "campground" => Some(SpotType::Campground),
            "hot_spring" => Some(SpotType::HotSpring),
            "parking" => Some(SpotType::Parking),
            "viewpoint" => Some(SpotType::Viewpoint),
            _ => None,
        }
    }
}

/// A geolocated point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Geohash of the coordinates at `geohash::SPOT_PRECISION`.
    #[serde(default)]
    pub geohash: String,
    pub spot_type: SpotType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub home_page_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub default_image_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub creation_time: DateTime<Utc>,
}

impl Spot {
    /// Create a spot, deriving its geohash from the coordinates.
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        spot_type: SpotType,
    ) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            geohash: geohash::encode(
                Coordinate::new(latitude, longitude),
                geohash::SPOT_PRECISION,
            ),
            spot_type,
            name: None,
            description: None,
            address: None,
            code: None,
            prefecture: None,
            city: None,
            home_page_urls: Vec::new(),
            tags: Vec::new(),
            default_image_url: None,
            creation_time: Utc::now(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Recompute the geohash from the coordinates.
    pub fn refresh_geohash(&mut self) {
        self.geohash = geohash::encode(self.coordinate(), geohash::SPOT_PRECISION);
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// The geohash cell of this spot at `precision` characters, or `None`
    /// if the stored geohash is not valid at that length.
    pub fn cell(&self, precision: usize) -> Option<&str> {
        let end = precision.min(self.geohash.len());
        self.geohash.get(..end)
    }
}

/// A directed driving distance/duration from one spot to another.
///
/// Keyed by `(origin_id, destination_id)`. Destination display fields are
/// a snapshot taken when the edge is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotDistance {
    pub origin_id: String,
    pub destination_id: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub creation_time: DateTime<Utc>,
    pub destination_name: Option<String>,
    pub destination_spot_type: Option<SpotType>,
    pub destination_image_url: Option<String>,
    pub destination_description: Option<String>,
}

impl SpotDistance {
    /// Build an edge between two spots from provider measurements.
    pub fn new(
        origin: &Spot,
        destination: &Spot,
        duration_seconds: f64,
        distance_meters: f64,
    ) -> Self {
        Self {
            origin_id: origin.id.clone(),
            destination_id: destination.id.clone(),
            distance_meters,
            duration_seconds,
            creation_time: Utc::now(),
            destination_name: destination.name.clone(),
            destination_spot_type: Some(destination.spot_type),
            destination_image_url: destination.default_image_url.clone(),
            destination_description: destination.description.clone(),
        }
    }
}
