//! Named exclusion zones and point-in-polygon checks.
//!
//! A geofence is a simple polygon given as an ordered ring of vertices; the
//! ring is closed implicitly. Containment is strict: a point lying on an edge
//! or vertex is outside. The index is immutable once built.

use geo::{Contains, Coord, LineString, Point, Polygon};
use thiserror::Error;

/// A polygon rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGeometryError {
    /// Fewer than three distinct vertices remain after removing repeats.
    #[error("geofence {id} has {found} distinct vertices; at least 3 are required")]
    TooFewVertices {
        /// Geofence identifier.
        id: u64,
        /// Distinct vertices found.
        found: usize,
    },
    /// A vertex contains NaN or an infinite value.
    #[error("geofence {id} has a non-finite vertex at position {position}")]
    NonFiniteVertex {
        /// Geofence identifier.
        id: u64,
        /// Zero-based position of the offending vertex.
        position: usize,
    },
}

/// A named exclusion zone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Geofence {
    id: u64,
    name: String,
    polygon: Polygon<f64>,
}

impl Geofence {
    /// Validate `vertices` and build a geofence.
    ///
    /// Consecutive duplicate vertices and an explicit closing vertex are
    /// ignored when counting distinct vertices.
    ///
    /// # Errors
    /// Returns [`InvalidGeometryError`] when a vertex is non-finite or fewer
    /// than three distinct vertices remain.
    ///
    /// # Examples
    /// ```
    /// use courier_core::{Geofence, lat_lon};
    ///
    /// let zone = Geofence::new(
    ///     1,
    ///     "No-Go Zone Makati",
    ///     vec![
    ///         lat_lon(14.555, 121.023),
    ///         lat_lon(14.556, 121.023),
    ///         lat_lon(14.556, 121.025),
    ///         lat_lon(14.555, 121.025),
    ///     ],
    /// )?;
    /// assert!(zone.contains(lat_lon(14.5555, 121.0240)));
    /// assert!(!zone.contains(lat_lon(14.555, 121.024)));
    /// # Ok::<(), courier_core::InvalidGeometryError>(())
    /// ```
    pub fn new(
        id: u64,
        name: impl Into<String>,
        vertices: Vec<Coord<f64>>,
    ) -> Result<Self, InvalidGeometryError> {
        if let Some(position) = vertices
            .iter()
            .position(|v| !(v.x.is_finite() && v.y.is_finite()))
        {
            return Err(InvalidGeometryError::NonFiniteVertex { id, position });
        }
        let mut ring = vertices;
        ring.dedup();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(InvalidGeometryError::TooFewVertices {
                id,
                found: ring.len(),
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            polygon: Polygon::new(LineString::from(ring), Vec::new()),
        })
    }

    /// Geofence identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Display name reported by checks.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The closed polygon backing this geofence.
    #[must_use]
    pub const fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Whether `location` lies strictly inside the polygon.
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        self.polygon.contains(&Point::from(location))
    }
}

/// Outcome of a geofence check as reported to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeofenceCheck {
    /// Whether any geofence contains the point.
    pub inside_geofence: bool,
    /// Name of the first containing geofence.
    pub geofence_name: Option<String>,
}

/// Ordered collection of geofences checked first-match-wins.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeofenceIndex {
    geofences: Vec<Geofence>,
}

impl GeofenceIndex {
    /// Build an index that checks `geofences` in the given order.
    #[must_use]
    pub const fn new(geofences: Vec<Geofence>) -> Self {
        Self { geofences }
    }

    /// Name of the first geofence containing `location`, if any.
    #[must_use]
    pub fn check(&self, location: Coord<f64>) -> Option<&str> {
        self.geofences
            .iter()
            .find(|fence| fence.contains(location))
            .map(Geofence::name)
    }

    /// [`check`](Self::check) shaped as a report.
    #[must_use]
    pub fn check_report(&self, location: Coord<f64>) -> GeofenceCheck {
        let name = self.check(location);
        GeofenceCheck {
            inside_geofence: name.is_some(),
            geofence_name: name.map(str::to_owned),
        }
    }

    /// Geofences in check order.
    #[must_use]
    pub fn geofences(&self) -> &[Geofence] {
        &self.geofences
    }

    /// Number of geofences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geofences.len()
    }

    /// Whether the index holds no geofences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geofences.is_empty()
    }
}
