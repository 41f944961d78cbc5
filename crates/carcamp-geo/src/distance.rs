//! Great-circle distance on a spherical Earth.

use std::f64::consts::PI;

/// Earth radius used for every distance in the system, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

const DEG_TO_RAD: f64 = PI / 180.0;

/// haversin(θ) = sin²(θ/2)
fn hsin(theta: f64) -> f64 {
    (theta / 2.0).sin().powi(2)
}

/// Haversine distance between two points given in decimal degrees.
///
/// Returns meters. Symmetric in its arguments and exactly zero for
/// identical points.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let la1 = lat1 * DEG_TO_RAD;
    let lo1 = lon1 * DEG_TO_RAD;
    let la2 = lat2 * DEG_TO_RAD;
    let lo2 = lon2 * DEG_TO_RAD;

    let h = hsin(la2 - la1) + la1.cos() * la2.cos() * hsin(lo2 - lo1);
    // Rounding can push h a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * h.min(1.0).sqrt().asin()
}
