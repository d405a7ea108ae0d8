use crate::graph::TopologyGraph;
use log::info;
use std::collections::VecDeque;

/// Connected components as sorted node-id lists, ordered by their smallest id.
pub fn connected_components(graph: &TopologyGraph) -> Vec<Vec<usize>> {
    let n = graph.num_nodes();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in graph.neighbours(current) {
                if !visited[next] {
                    visited[next] = true;
                    component.push(next);
                    queue.push_back(next);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}

/// Component index of every node, matching [`connected_components`] order.
pub fn component_membership(graph: &TopologyGraph) -> Vec<usize> {
    let mut membership = vec![0; graph.num_nodes()];
    for (component, nodes) in connected_components(graph).iter().enumerate() {
        for &node in nodes {
            membership[node] = component;
        }
    }
    membership
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub components: usize,
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

pub struct ConnectivityPruner;

impl ConnectivityPruner {
    /// Keep only the largest component; among equally large ones the one
    /// holding the smallest node id wins. Survivors are renumbered to `0..n`.
    pub fn prune(graph: &mut TopologyGraph) -> PruneReport {
        let components = connected_components(graph);
        // max_by_key returns the last maximum, so walk in reverse
        let Some(largest) = components.iter().rev().max_by_key(|c| c.len()) else {
            return PruneReport::default();
        };

        let mut keep = vec![false; graph.num_nodes()];
        for &node in largest {
            keep[node] = true;
        }

        let (nodes_before, edges_before) = (graph.num_nodes(), graph.num_edges());
        graph.retain_nodes(&keep);
        let report = PruneReport {
            components: components.len(),
            nodes_removed: nodes_before - graph.num_nodes(),
            edges_removed: edges_before - graph.num_edges(),
        };
        info!(
            "kept largest of {} components: {} nodes / {} edges, dropped {} nodes / {} edges",
            report.components,
            graph.num_nodes(),
            graph.num_edges(),
            report.nodes_removed,
            report.edges_removed
        );
        report
    }
}
