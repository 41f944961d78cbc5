//! Geohash encoding and neighbor enumeration.
//!
//! A geohash interleaves longitude and latitude bisection bits (longitude
//! first) and writes them five at a time in the base-32 alphabet below.
//! Shorter hashes denote larger cells, and every prefix of a hash is the
//! hash of the enclosing cell.

use thiserror::Error;

use crate::Coordinate;

/// Geohash alphabet (no `a`, `i`, `l`, `o`).
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision at which spot geohashes are stored.
pub const SPOT_PRECISION: usize = 12;

/// Prefix length used to look up nearby spots. A 4-character cell is
/// roughly 39 km x 20 km, wide enough to hold every spot within the
/// proximity threshold once the eight neighbors are included.
pub const NEIGHBOR_PRECISION: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeohashError {
    #[error("empty geohash")]
    Empty,

    #[error("invalid geohash character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

/// Latitude/longitude extent of a geohash cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
    }
}

/// Compass direction of an adjacent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// (latitude steps, longitude steps) in cell units.
    fn offset(&self) -> (f64, f64) {
        match self {
            Direction::North => (1.0, 0.0),
            Direction::NorthEast => (1.0, 1.0),
            Direction::East => (0.0, 1.0),
            Direction::SouthEast => (-1.0, 1.0),
            Direction::South => (-1.0, 0.0),
            Direction::SouthWest => (-1.0, -1.0),
            Direction::West => (0.0, -1.0),
            Direction::NorthWest => (1.0, -1.0),
        }
    }
}

/// Encode a coordinate as a geohash of `precision` characters.
///
/// Coordinates outside [-90, 90] / [-180, 180] are a caller error; they
/// encode to the nearest edge cell.
pub fn encode(point: Coordinate, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even = true;

    for _ in 0..precision {
        let mut index = 0usize;
        for _ in 0..5 {
            let (range, value) = if even {
                (&mut lon_range, point.longitude)
            } else {
                (&mut lat_range, point.latitude)
            };
            let mid = (range.0 + range.1) / 2.0;
            index <<= 1;
            if value >= mid {
                index |= 1;
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
        hash.push(BASE32[index] as char);
    }

    hash
}

/// Decode a geohash into the bounding box of its cell.
pub fn decode(hash: &str) -> Result<BoundingBox, GeohashError> {
    if hash.is_empty() {
        return Err(GeohashError::Empty);
    }

    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut even = true;

    for (position, character) in hash.chars().enumerate() {
        let index = char_index(character)
            .ok_or(GeohashError::InvalidCharacter { character, position })?;
        for shift in (0..5).rev() {
            let range = if even { &mut lon_range } else { &mut lat_range };
            let mid = (range.0 + range.1) / 2.0;
            if (index >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Ok(BoundingBox {
        min_lat: lat_range.0,
        max_lat: lat_range.1,
        min_lon: lon_range.0,
        max_lon: lon_range.1,
    })
}

/// The cell of the same precision adjacent to `hash` in `direction`.
///
/// Longitude wraps around the antimeridian. Latitude is clamped at the
/// poles, so the northern neighbor of a cell touching the north pole is
/// the cell itself.
pub fn adjacent(hash: &str, direction: Direction) -> Result<String, GeohashError> {
    let bbox = decode(hash)?;
    Ok(step(&bbox, hash.chars().count(), direction))
}

/// The eight cells surrounding `hash`, in [`Direction::ALL`] order.
pub fn neighbors(hash: &str) -> Result<[String; 8], GeohashError> {
    let bbox = decode(hash)?;
    let precision = hash.chars().count();
    Ok(Direction::ALL.map(|direction| step(&bbox, precision, direction)))
}

fn step(bbox: &BoundingBox, precision: usize, direction: Direction) -> String {
    let center = bbox.center();
    let (lat_steps, lon_steps) = direction.offset();
    let latitude = (center.latitude + lat_steps * bbox.height()).clamp(-90.0, 90.0);
    let longitude = wrap_longitude(center.longitude + lon_steps * bbox.width());
    encode(Coordinate::new(latitude, longitude), precision)
}

fn char_index(character: char) -> Option<usize> {
    let lower = character.to_ascii_lowercase();
    BASE32.iter().position(|&b| b as char == lower)
}

fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}
