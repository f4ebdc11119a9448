//! Service-area bounding boxes.

use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A latitude/longitude box given by its four edges in degrees.
///
/// Edges are inclusive: a point on the border is inside the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Northern latitude.
    pub north: f64,
    /// Southern latitude.
    pub south: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Western longitude.
    pub west: f64,
}

impl BoundingBox {
    /// Create a box from its edges.
    #[must_use]
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Whether `location` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        (self.south..=self.north).contains(&location.y)
            && (self.west..=self.east).contains(&location.x)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "north={} south={} east={} west={}",
            self.north, self.south, self.east, self.west
        )
    }
}

/// Failure to parse a `north,south,east,west` bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundingBoxParseError {
    /// The input did not contain exactly four comma-separated values.
    #[error("expected four comma-separated values (north,south,east,west), found {found}")]
    WrongArity {
        /// Number of values found.
        found: usize,
    },
    /// A value is not a number.
    #[error("invalid bounding box value")]
    InvalidNumber(#[from] ParseFloatError),
    /// The edges are inverted or outside WGS84.
    #[error("bounding box edges must satisfy -90 <= south <= north <= 90 and -180 <= west <= east <= 180")]
    InvalidEdges,
}

impl FromStr for BoundingBox {
    type Err = BoundingBoxParseError;

    /// Parse `north,south,east,west`, the order map services quote boxes in.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()?;
        let &[north, south, east, west] = values.as_slice() else {
            return Err(BoundingBoxParseError::WrongArity {
                found: values.len(),
            });
        };
        let valid = (-90.0..=90.0).contains(&south)
            && (-90.0..=90.0).contains(&north)
            && south <= north
            && (-180.0..=180.0).contains(&west)
            && (-180.0..=180.0).contains(&east)
            && west <= east;
        if !valid {
            return Err(BoundingBoxParseError::InvalidEdges);
        }
        Ok(Self::new(north, south, east, west))
    }
}
