//! Planar index used for nearest-node queries.

use geo::Coord;
use petgraph::graph::NodeIndex;
use rstar::{AABB, PointDistance, RTreeObject};

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Equirectangular projection about a reference latitude, in metres.
///
/// Distortion is negligible over a city-sized service area and the projection
/// preserves distance ordering well enough for nearest-node lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LocalProjection {
    lon_scale: f64,
}

impl LocalProjection {
    /// Centre the projection on the mean latitude of `locations`.
    pub(crate) fn centred_on(locations: impl Iterator<Item = Coord<f64>>) -> Self {
        let (sum, count) = locations.fold((0.0_f64, 0_u32), |(sum, count), c| {
            (sum + c.y, count.saturating_add(1))
        });
        let mean_lat = if count == 0 {
            0.0
        } else {
            sum / f64::from(count)
        };
        Self {
            lon_scale: mean_lat.to_radians().cos(),
        }
    }

    pub(crate) fn project(self, location: Coord<f64>) -> [f64; 2] {
        [
            location.x.to_radians() * self.lon_scale * EARTH_RADIUS_M,
            location.y.to_radians() * EARTH_RADIUS_M,
        ]
    }
}

/// R-tree entry pointing back at a graph node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexedNode {
    pub(crate) id: u64,
    pub(crate) index: NodeIndex,
    position: [f64; 2],
}

impl IndexedNode {
    pub(crate) const fn new(id: u64, index: NodeIndex, position: [f64; 2]) -> Self {
        Self {
            id,
            index,
            position,
        }
    }
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = self.position;
        let [px, py] = *point;
        (x - px).powi(2) + (y - py).powi(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::{haversine_m, lat_lon};
    use rstest::rstest;

    #[rstest]
    fn projected_distance_tracks_haversine_at_city_scale() {
        let a = lat_lon(14.5547, 121.0244);
        let b = lat_lon(14.5600, 121.0200);
        let projection = LocalProjection::centred_on([a, b].into_iter());
        let node = IndexedNode::new(1, NodeIndex::new(0), projection.project(a));
        let planar = node.distance_2(&projection.project(b)).sqrt();
        let great_circle = haversine_m(a, b);
        assert!((planar - great_circle).abs() < 1.0, "{planar} vs {great_circle}");
    }

    #[rstest]
    fn empty_projection_is_centred_on_equator() {
        let projection = LocalProjection::centred_on(std::iter::empty());
        assert_eq!(projection, LocalProjection { lon_scale: 1.0 });
    }
}
