// ===========================================================================
// Fixed long-haul links (submarine cables) merged into the topology
// ===========================================================================
use crate::config::ExternalLinkParams;
use crate::errors::{Result, TopoGenError};
use crate::graph::{EdgeProvenance, TopologyGraph};
use crate::locations::LocationKind;
use crate::spatial_index::SpatialIndex;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A real-world link given by coordinates, `[lat, lon]` each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    #[serde(default)]
    pub name: Option<String>,
    pub from: [f64; 2],
    pub to: [f64; 2],
    /// Intermediate points between `from` and `to`, in order.
    #[serde(default)]
    pub waypoints: Vec<[f64; 2]>,
}

impl ExternalLink {
    pub fn new(from: [f64; 2], to: [f64; 2]) -> Self {
        Self {
            name: None,
            from,
            to,
            waypoints: Vec::new(),
        }
    }

    /// `from`, the waypoints, then `to`.
    pub fn chain(&self) -> Vec<[f64; 2]> {
        let mut chain = Vec::with_capacity(self.waypoints.len() + 2);
        chain.push(self.from);
        chain.extend_from_slice(&self.waypoints);
        chain.push(self.to);
        chain
    }

    pub fn validate(&self) -> Result<()> {
        for [lat, lon] in self.chain() {
            let valid = lat.is_finite()
                && lon.is_finite()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon);
            if !valid {
                return Err(TopoGenError::parse(
                    "external links",
                    format!(
                        "link {} has invalid coordinate ({}, {})",
                        self.name.as_deref().unwrap_or("<unnamed>"),
                        lat,
                        lon
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub edges_added: usize,
    pub endpoints_snapped: usize,
    pub nodes_inserted: usize,
}

pub struct ExternalLinkMerger {
    params: ExternalLinkParams,
}

impl ExternalLinkMerger {
    pub fn new(params: ExternalLinkParams) -> Self {
        Self { params }
    }

    /// Snap every chain point to the nearest node within tolerance, inserting
    /// a node where none is close enough, and connect consecutive points.
    /// Every link is validated before the graph is touched.
    pub fn merge(&self, graph: &mut TopologyGraph, links: &[ExternalLink]) -> Result<MergeReport> {
        for link in links {
            link.validate()?;
        }

        let mut index = SpatialIndex::new(graph.nodes());
        let mut report = MergeReport::default();

        for link in links {
            let chain = link.chain();
            let last = chain.len() - 1;
            let mut nodes = Vec::with_capacity(chain.len());

            for (position, [lat, lon]) in chain.into_iter().enumerate() {
                let node = match index.nearest_within(lat, lon, self.params.snap_tolerance_km()) {
                    Some((node, _)) => {
                        report.endpoints_snapped += 1;
                        node
                    }
                    None => {
                        let kind = if position == 0 || position == last {
                            LocationKind::CableLanding
                        } else {
                            LocationKind::CableWaypoint
                        };
                        let node = graph.add_node(lat, lon, kind);
                        let indexed = index.insert(lat, lon);
                        debug_assert_eq!(node, indexed);
                        report.nodes_inserted += 1;
                        node
                    }
                };
                nodes.push(node);
            }

            for (a, b) in nodes.into_iter().tuple_windows() {
                if graph.add_edge(a, b, EdgeProvenance::ExternalLink) {
                    report.edges_added += 1;
                }
            }

            debug!(
                "merged external link {}",
                link.name.as_deref().unwrap_or("<unnamed>")
            );
        }

        info!(
            "merged {} external links: {} edges added, {} points snapped, {} nodes inserted",
            links.len(),
            report.edges_added,
            report.endpoints_snapped,
            report.nodes_inserted
        );
        Ok(report)
    }
}
