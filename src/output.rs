use crate::errors::{Result, io_err};
use crate::graph::{EdgeProvenance, TopologyGraph};
use crate::locations::LocationKind;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
pub struct ExportNode {
    pub id: usize,
    pub lat: f64,
    pub lon: f64,
    pub kind: LocationKind,
    pub degree: usize,
}

#[derive(Serialize)]
pub struct ExportEdge {
    pub from: usize,
    pub to: usize,
    pub length_km: f64,
    pub provenance: EdgeProvenance,
}

#[derive(Serialize)]
pub struct ExportGraph {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

impl ExportGraph {
    pub fn from_graph(graph: &TopologyGraph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .iter()
                .map(|n| ExportNode {
                    id: n.id,
                    lat: n.lat,
                    lon: n.lon,
                    kind: n.kind,
                    degree: graph.degree(n.id),
                })
                .collect(),
            edges: graph
                .edges()
                .map(|e| ExportEdge {
                    from: e.from,
                    to: e.to,
                    length_km: e.length_km,
                    provenance: e.provenance,
                })
                .collect(),
        }
    }
}

/// One `id lat lon kind` line per node and one `from to length_km provenance`
/// line per edge.
pub fn write_plain<N: Write, E: Write>(
    graph: &TopologyGraph,
    mut nodes: N,
    mut edges: E,
) -> io::Result<()> {
    for node in graph.nodes() {
        writeln!(nodes, "{} {} {} {}", node.id, node.lat, node.lon, node.kind)?;
    }
    for edge in graph.edges() {
        writeln!(
            edges,
            "{} {} {:.3} {}",
            edge.from, edge.to, edge.length_km, edge.provenance
        )?;
    }
    nodes.flush()?;
    edges.flush()
}

pub fn write_json<W: Write>(graph: &TopologyGraph, writer: W, pretty: bool) -> serde_json::Result<()> {
    let export = ExportGraph::from_graph(graph);
    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
}

pub fn save_plain(graph: &TopologyGraph, node_path: &Path, edge_path: &Path) -> Result<()> {
    let nodes = File::create(node_path).map_err(|e| io_err!(node_path, e))?;
    let edges = File::create(edge_path).map_err(|e| io_err!(edge_path, e))?;
    write_plain(graph, BufWriter::new(nodes), BufWriter::new(edges))
        .map_err(|e| io_err!(edge_path, e))
}

pub fn save_json(graph: &TopologyGraph, path: &Path, pretty: bool) -> Result<()> {
    let file = File::create(path).map_err(|e| io_err!(path, e))?;
    let mut writer = BufWriter::new(file);
    write_json(graph, &mut writer, pretty).map_err(|e| io_err!(path, e.into()))?;
    writer.flush().map_err(|e| io_err!(path, e))
}
