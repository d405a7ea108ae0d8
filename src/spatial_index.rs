// ===========================================================================
// R*-tree over unit-sphere positions
// ===========================================================================
//
// Points are stored as 3d unit vectors, so a euclidean range query with the
// chord radius is exactly a great-circle range query.

use crate::geodesy::{central_angle, chord_squared, radians_to_km, to_unit_vector};
use crate::locations::Location;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

#[derive(Debug, Clone, PartialEq)]
struct SpherePoint {
    position: [f64; 3],
    index: usize,
}

impl RTreeObject for SpherePoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for SpherePoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        let dz = self.position[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Nearest-neighbour structure over a frozen snapshot of locations.
/// Results refer to positions in the slice the index was built from.
pub struct SpatialIndex {
    tree: RTree<SpherePoint>,
    positions: Vec<[f64; 3]>,
}

impl SpatialIndex {
    pub fn new(locations: &[Location]) -> Self {
        let positions: Vec<[f64; 3]> = locations
            .iter()
            .map(|l| to_unit_vector(l.lat, l.lon))
            .collect();
        let points = positions
            .iter()
            .enumerate()
            .map(|(index, &position)| SpherePoint { position, index })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> [f64; 3] {
        self.positions[index]
    }

    /// Add one more point; its index is the current length.
    pub fn insert(&mut self, lat: f64, lon: f64) -> usize {
        let index = self.positions.len();
        let position = to_unit_vector(lat, lon);
        self.positions.push(position);
        self.tree.insert(SpherePoint { position, index });
        index
    }

    /// All indexed points within `angle` radians of `center`, as
    /// `(index, angle)` sorted by angle then index.
    pub fn within_angle(&self, center: [f64; 3], angle: f64) -> Vec<(usize, f64)> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut found: Vec<(usize, f64)> = self
            .tree
            .locate_within_distance(center, chord_squared(angle))
            .map(|p| (p.index, central_angle(center, p.position)))
            .filter(|&(_, a)| a <= angle)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// Neighbours of an indexed point within `angle`, excluding the point itself.
    pub fn neighbours_of(&self, index: usize, angle: f64) -> Vec<(usize, f64)> {
        let mut found = self.within_angle(self.positions[index], angle);
        found.retain(|&(other, _)| other != index);
        found
    }

    /// Nearest indexed point to (lat, lon) and its distance in kilometres.
    /// Equidistant candidates resolve to the smallest index.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<(usize, f64)> {
        let query = to_unit_vector(lat, lon);
        let best = self.tree.nearest_neighbor(&query)?;
        let best_angle = central_angle(query, best.position);
        let tie_radius = chord_squared(best_angle) * (1.0 + 1e-12) + 1e-24;
        let index = self
            .tree
            .locate_within_distance(query, tie_radius)
            .map(|p| p.index)
            .min()
            .unwrap_or(best.index);
        Some((index, radians_to_km(central_angle(query, self.positions[index]))))
    }

    /// Nearest point no further than `tolerance_km`.
    pub fn nearest_within(&self, lat: f64, lon: f64, tolerance_km: f64) -> Option<(usize, f64)> {
        self.nearest(lat, lon)
            .filter(|&(_, distance)| distance <= tolerance_km)
    }
}
