// ===========================================================================
// Index-based topology graph
// ===========================================================================
//
// Nodes live in one Vec and are addressed by their position, which is also
// their id once the graph is built. Edges are keyed by the ordered id pair so
// iteration order never depends on hashing.

use crate::geodesy::haversine_km;
use crate::locations::{Location, LocationKind};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeProvenance {
    Triangulation,
    ExternalLink,
}

impl fmt::Display for EdgeProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeProvenance::Triangulation => write!(f, "triangulation"),
            EdgeProvenance::ExternalLink => write!(f, "external-link"),
        }
    }
}

/// Undirected edge, always stored with `from < to`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub length_km: f64,
    pub provenance: EdgeProvenance,
}

impl Edge {
    pub fn key(&self) -> (usize, usize) {
        (self.from, self.to)
    }

    pub fn other(&self, node: usize) -> usize {
        if node == self.from { self.to } else { self.from }
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

#[derive(Clone, Debug, Default)]
pub struct TopologyGraph {
    nodes: Vec<Location>,
    adjacency: Vec<BTreeSet<usize>>,
    edges: BTreeMap<(usize, usize), Edge>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph without edges over already renumbered locations.
    pub fn from_locations(locations: Vec<Location>) -> Self {
        let mut graph = Self::new();
        for location in locations {
            graph.add_node(location.lat, location.lon, location.kind);
        }
        graph
    }

    /// Append a node; its id is the next free index.
    pub fn add_node(&mut self, lat: f64, lon: f64, kind: LocationKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Location::new(id, lat, lon, kind));
        self.adjacency.push(BTreeSet::new());
        id
    }

    /// Add an edge weighted by its haversine length. Self-loops, unknown
    /// nodes and already present pairs are ignored; returns whether the
    /// edge was inserted.
    pub fn add_edge(&mut self, a: usize, b: usize, provenance: EdgeProvenance) -> bool {
        if a == b || a >= self.nodes.len() || b >= self.nodes.len() {
            return false;
        }
        let (from, to) = ordered(a, b);
        if self.edges.contains_key(&(from, to)) {
            return false;
        }
        let (na, nb) = (&self.nodes[from], &self.nodes[to]);
        let length_km = haversine_km(na.lat, na.lon, nb.lat, nb.lon);
        self.edges.insert(
            (from, to),
            Edge {
                from,
                to,
                length_km,
                provenance,
            },
        );
        self.adjacency[from].insert(to);
        self.adjacency[to].insert(from);
        true
    }

    pub fn remove_edge(&mut self, a: usize, b: usize) -> Option<Edge> {
        let key = ordered(a, b);
        let edge = self.edges.remove(&key)?;
        self.adjacency[key.0].remove(&key.1);
        self.adjacency[key.1].remove(&key.0);
        Some(edge)
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edges.contains_key(&ordered(a, b))
    }

    pub fn edge(&self, a: usize, b: usize) -> Option<&Edge> {
        self.edges.get(&ordered(a, b))
    }

    pub fn node(&self, id: usize) -> Option<&Location> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Location] {
        &self.nodes
    }

    /// Edges in ascending `(from, to)` order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbours(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[id].iter().copied()
    }

    pub fn degree(&self, id: usize) -> usize {
        self.adjacency.get(id).map_or(0, BTreeSet::len)
    }

    /// Drop every node whose flag is false together with its incident edges
    /// and renumber the survivors to `0..n` in their previous order.
    pub fn retain_nodes(&mut self, keep: &[bool]) {
        let mut remap = vec![None; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (old, node) in self.nodes.drain(..).enumerate() {
            if keep.get(old).copied().unwrap_or(false) {
                let new = nodes.len();
                remap[old] = Some(new);
                nodes.push(Location { id: new, ..node });
            }
        }

        let mut adjacency = vec![BTreeSet::new(); nodes.len()];
        let mut edges = BTreeMap::new();
        for edge in std::mem::take(&mut self.edges).into_values() {
            if let (Some(from), Some(to)) = (remap[edge.from], remap[edge.to]) {
                let (from, to) = ordered(from, to);
                adjacency[from].insert(to);
                adjacency[to].insert(from);
                edges.insert(
                    (from, to),
                    Edge {
                        from,
                        to,
                        ..edge
                    },
                );
            }
        }

        self.nodes = nodes;
        self.adjacency = adjacency;
        self.edges = edges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph(n: usize) -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        for i in 0..n {
            graph.add_node(0.0, i as f64, LocationKind::City);
        }
        for i in 1..n {
            graph.add_edge(i - 1, i, EdgeProvenance::Triangulation);
        }
        graph
    }

    #[test]
    fn test_add_edge_rejects_loops_and_duplicates() {
        let mut graph = line_graph(3);
        assert_eq!(graph.num_edges(), 2);
        assert!(!graph.add_edge(1, 1, EdgeProvenance::Triangulation));
        assert!(!graph.add_edge(1, 0, EdgeProvenance::ExternalLink));
        assert!(!graph.add_edge(0, 7, EdgeProvenance::Triangulation));
        assert_eq!(graph.num_edges(), 2);
        // the first insertion wins
        assert_eq!(
            graph.edge(0, 1).unwrap().provenance,
            EdgeProvenance::Triangulation
        );
        assert_eq!(graph.degree(1), 2);
    }

    #[test]
    fn test_edge_length_is_geodesic() {
        let graph = line_graph(2);
        let edge = graph.edge(1, 0).unwrap();
        // one degree of longitude on the equator
        assert!((edge.length_km - 111.19).abs() < 0.1);
        assert_eq!(edge.key(), (0, 1));
        assert_eq!(edge.other(0), 1);
    }

    #[test]
    fn test_remove_edge_updates_degree() {
        let mut graph = line_graph(3);
        assert!(graph.remove_edge(2, 1).is_some());
        assert!(graph.remove_edge(2, 1).is_none());
        assert_eq!(graph.degree(1), 1);
        assert_eq!(graph.degree(2), 0);
        assert!(!graph.has_edge(1, 2));
    }

    #[test]
    fn test_retain_nodes_renumbers_contiguously() {
        let mut graph = line_graph(5);
        graph.retain_nodes(&[false, true, true, false, true]);
        assert_eq!(graph.num_nodes(), 3);
        let ids: Vec<usize> = graph.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        // only 1-2 survives, now 0-1
        assert_eq!(graph.num_edges(), 1);
        assert!(graph.has_edge(0, 1));
        assert_eq!(graph.node(2).unwrap().lon, 4.0);
        assert_eq!(graph.degree(2), 0);
    }
}
