// ===========================================================================
// Lune based beta-skeleton over a Delaunay graph
// ===========================================================================
use crate::config::validate_beta;
use crate::errors::Result;
use crate::graph::TopologyGraph;
use crate::locations::Location;
use log::info;

/// Relative slack so that points on the region boundary never remove an edge.
const STRICT_TOLERANCE: f64 = 1e-12;

type Xy = (f64, f64);

fn xy(location: &Location) -> Xy {
    (location.lon, location.lat)
}

fn dist2(a: Xy, b: Xy) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

/// The forbidden region of an edge as the intersection of two disks.
#[derive(Debug, Clone, Copy)]
struct BetaRegion {
    centers: [Xy; 2],
    radius2: f64,
}

impl BetaRegion {
    fn new(u: Xy, v: Xy, beta: f64) -> Self {
        let d2 = dist2(u, v);
        if beta >= 1.0 {
            let r = beta * d2.sqrt() / 2.0;
            let (s, t) = (1.0 - beta / 2.0, beta / 2.0);
            Self {
                centers: [
                    (s * u.0 + t * v.0, s * u.1 + t * v.1),
                    (t * u.0 + s * v.0, t * u.1 + s * v.1),
                ],
                radius2: r * r,
            }
        } else {
            // disks of radius d / (2 beta) through both endpoints
            let d = d2.sqrt();
            let r = d / (2.0 * beta);
            let h = (r * r - d2 / 4.0).max(0.0).sqrt();
            let mid = ((u.0 + v.0) / 2.0, (u.1 + v.1) / 2.0);
            let normal = if d > 0.0 {
                (-(v.1 - u.1) / d, (v.0 - u.0) / d)
            } else {
                (0.0, 0.0)
            };
            Self {
                centers: [
                    (mid.0 + h * normal.0, mid.1 + h * normal.1),
                    (mid.0 - h * normal.0, mid.1 - h * normal.1),
                ],
                radius2: r * r,
            }
        }
    }

    fn strictly_contains(&self, w: Xy) -> bool {
        let limit = self.radius2 * (1.0 - STRICT_TOLERANCE);
        self.centers.iter().all(|&c| dist2(c, w) < limit)
    }
}

pub struct BetaSkeletonFilter {
    beta: f64,
}

impl BetaSkeletonFilter {
    pub fn new(beta: f64) -> Result<Self> {
        Ok(Self {
            beta: validate_beta(beta)?,
        })
    }

    /// Gabriel graph filter.
    pub fn gabriel() -> Self {
        Self { beta: 1.0 }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    fn violates(&self, graph: &TopologyGraph, u: usize, v: usize) -> bool {
        let nodes = graph.nodes();
        let region = BetaRegion::new(xy(&nodes[u]), xy(&nodes[v]), self.beta);
        graph
            .neighbours(u)
            .chain(graph.neighbours(v))
            .filter(|&w| w != u && w != v)
            .any(|w| region.strictly_contains(xy(&nodes[w])))
    }

    /// Remove every edge whose beta region holds another node. Witnesses are
    /// drawn from the neighbourhoods of the endpoints in the unfiltered
    /// graph. Returns the number of removed edges.
    pub fn filter(&self, graph: &mut TopologyGraph) -> usize {
        let frozen: &TopologyGraph = graph;
        let doomed: Vec<(usize, usize)> = frozen
            .edges()
            .filter(|e| self.violates(frozen, e.from, e.to))
            .map(|e| e.key())
            .collect();
        for &(u, v) in &doomed {
            graph.remove_edge(u, v);
        }
        info!(
            "beta-skeleton (beta = {}) removed {} edges, {} remain",
            self.beta,
            doomed.len(),
            graph.num_edges()
        );
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::connected_components;
    use crate::delaunay::PlanarTriangulator;
    use crate::errors::TopoGenError;
    use crate::locations::LocationKind;

    fn triangulated(points: &[(f64, f64)]) -> TopologyGraph {
        let locations: Vec<Location> = points
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon))| Location::new(i, lat, lon, LocationKind::City))
            .collect();
        PlanarTriangulator::triangulate(&locations).unwrap().graph
    }

    fn scattered() -> Vec<(f64, f64)> {
        (0..60)
            .map(|i| {
                let i = i as f64;
                ((i * 13.7) % 17.0 - 8.0, (i * 5.3) % 23.0 - 11.0 + i * 0.003)
            })
            .collect()
    }

    #[test]
    fn test_long_edge_of_flat_triangle_is_removed() {
        let mut graph = triangulated(&[(0.0, 0.0), (0.01, 1.0), (0.0, 2.0)]);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(BetaSkeletonFilter::gabriel().filter(&mut graph), 1);
        assert!(!graph.has_edge(0, 2));
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 2));
    }

    #[test]
    fn test_cocircular_square_keeps_diagonal() {
        let mut graph = triangulated(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        BetaSkeletonFilter::gabriel().filter(&mut graph);
        assert_eq!(graph.num_edges(), 5);
    }

    #[test]
    fn test_skeleton_is_subset_and_connected() {
        let delaunay = triangulated(&scattered());
        let mut gabriel = delaunay.clone();
        BetaSkeletonFilter::gabriel().filter(&mut gabriel);

        assert!(gabriel.num_edges() < delaunay.num_edges());
        for edge in gabriel.edges() {
            assert!(delaunay.has_edge(edge.from, edge.to));
        }
        assert_eq!(connected_components(&delaunay).len(), 1);
        assert_eq!(connected_components(&gabriel).len(), 1);
    }

    #[test]
    fn test_larger_beta_is_sparser() {
        let delaunay = triangulated(&scattered());
        let mut gabriel = delaunay.clone();
        let mut wide = delaunay.clone();
        let mut narrow = delaunay.clone();
        BetaSkeletonFilter::gabriel().filter(&mut gabriel);
        BetaSkeletonFilter::new(2.0).unwrap().filter(&mut wide);
        BetaSkeletonFilter::new(0.5).unwrap().filter(&mut narrow);

        for edge in wide.edges() {
            assert!(gabriel.has_edge(edge.from, edge.to));
        }
        for edge in gabriel.edges() {
            assert!(narrow.has_edge(edge.from, edge.to));
        }
    }

    #[test]
    fn test_rejects_non_positive_beta() {
        assert!(matches!(
            BetaSkeletonFilter::new(0.0),
            Err(TopoGenError::InvalidParameter { .. })
        ));
        assert!(BetaSkeletonFilter::new(f64::NAN).is_err());
    }
}
