// ===========================================================================
// Planar Delaunay triangulation over (lon, lat)
// ===========================================================================
use crate::errors::{Result, TopoGenError};
use crate::graph::{EdgeProvenance, TopologyGraph};
use crate::locations::Location;
use delaunator::{Point as DPoint, next_halfedge, triangulate};
use log::{info, warn};

pub struct Triangulation {
    pub graph: TopologyGraph,
    /// Triangles as node-id triples.
    pub triangles: Vec<[usize; 3]>,
}

pub struct PlanarTriangulator;

impl PlanarTriangulator {
    /// Triangulate renumbered locations (`id == position`). Points are fed to
    /// delaunator sorted by (lon, lat, id) so identical inputs always give the
    /// same diagonal for cocircular quads; repeated coordinates take part once.
    pub fn triangulate(locations: &[Location]) -> Result<Triangulation> {
        if let Some((position, l)) = locations.iter().enumerate().find(|(i, l)| l.id != *i) {
            return Err(TopoGenError::invalid(
                "locations",
                format!("ids must be renumbered to 0..n, found id {} at position {position}", l.id),
            ));
        }

        let mut order: Vec<&Location> = locations.iter().collect();
        order.sort_by(|a, b| {
            a.lon
                .total_cmp(&b.lon)
                .then(a.lat.total_cmp(&b.lat))
                .then(a.id.cmp(&b.id))
        });
        let before = order.len();
        order.dedup_by(|later, earlier| later.same_position(*earlier));
        if order.len() < before {
            warn!(
                "{} locations share coordinates with another one and stay isolated",
                before - order.len()
            );
        }

        if order.len() < 3 {
            return Err(TopoGenError::DegenerateInput(format!(
                "triangulation needs at least 3 distinct points, got {}",
                order.len()
            )));
        }

        let points: Vec<DPoint> = order
            .iter()
            .map(|l| DPoint { x: l.lon, y: l.lat })
            .collect();
        let result = triangulate(&points);
        if result.triangles.is_empty() {
            return Err(TopoGenError::DegenerateInput(format!(
                "all {} points are collinear",
                order.len()
            )));
        }

        let mut graph = TopologyGraph::from_locations(locations.to_vec());
        for e in 0..result.triangles.len() {
            let a = order[result.triangles[e]].id;
            let b = order[result.triangles[next_halfedge(e)]].id;
            graph.add_edge(a, b, EdgeProvenance::Triangulation);
        }

        let triangles: Vec<[usize; 3]> = result
            .triangles
            .chunks_exact(3)
            .map(|t| [order[t[0]].id, order[t[1]].id, order[t[2]].id])
            .collect();

        info!(
            "Delaunay triangulation: {} nodes, {} triangles, {} edges",
            graph.num_nodes(),
            triangles.len(),
            graph.num_edges()
        );

        Ok(Triangulation { graph, triangles })
    }
}
