//! Coordinate helpers shared by the network, routing and dispatch modules.

use geo::{Coord, Distance, Haversine, Point};
use thiserror::Error;

/// Build a coordinate from latitude and longitude in degrees.
///
/// Map data is usually quoted as `(lat, lon)` while `geo` stores
/// `x = longitude`, `y = latitude`; this helper keeps call sites readable.
///
/// # Examples
/// ```
/// use courier_core::lat_lon;
///
/// let makati = lat_lon(14.5547, 121.0244);
/// assert_eq!(makati.y, 14.5547);
/// assert_eq!(makati.x, 121.0244);
/// ```
#[must_use]
pub const fn lat_lon(lat: f64, lon: f64) -> Coord<f64> {
    Coord { x: lon, y: lat }
}

/// Great-circle distance between two coordinates in metres.
#[must_use]
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Great-circle distance between two coordinates in kilometres.
///
/// Dispatch scoring adds this value to a worker's load, so the unit matters.
#[must_use]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    haversine_m(a, b) / 1_000.0
}

/// A coordinate outside the WGS84 range or containing non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("({lat}, {lon}) is not a valid WGS84 coordinate")]
pub struct InvalidLocation {
    /// Offending latitude.
    pub lat: f64,
    /// Offending longitude.
    pub lon: f64,
}

/// Check that a coordinate is finite and within WGS84 bounds.
///
/// # Errors
/// Returns [`InvalidLocation`] when either axis is non-finite or out of range.
pub fn validate_location(location: Coord<f64>) -> Result<Coord<f64>, InvalidLocation> {
    let Coord { x: lon, y: lat } = location;
    let valid = lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat);
    if valid {
        Ok(location)
    } else {
        Err(InvalidLocation { lat, lon })
    }
}
