//! Carcamp Geo - spatial keys and distances for spots.
//!
//! This crate provides the two pure building blocks of the proximity graph:
//!
//! - **Geohash**: encode coordinates into base-32 cell keys and enumerate the
//!   eight cells surrounding a cell
//! - **Distance**: haversine great-circle distance in meters
//!
//! # Example
//!
//! ```
//! use carcamp_geo::{geohash, Coordinate};
//!
//! let tokyo = Coordinate::new(35.681236, 139.767125);
//! let hash = geohash::encode(tokyo, geohash::SPOT_PRECISION);
//! assert_eq!(&hash[..4], "xn76");
//!
//! let cells = geohash::neighbors(&hash[..4]).unwrap();
//! assert_eq!(cells.len(), 8);
//! ```

pub mod distance;
pub mod geohash;

pub use distance::{haversine_meters, EARTH_RADIUS_METERS};
pub use geohash::{BoundingBox, Direction, GeohashError};

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another coordinate, in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}
