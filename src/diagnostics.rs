use crate::graph::TopologyGraph;
use crate::locations::Location;
use crate::regions::Region;

/// Every node whose degree is at most `max_degree` and that satisfies
/// `filter`, in id order.
pub fn low_degree_nodes<'a, F>(
    graph: &'a TopologyGraph,
    max_degree: usize,
    filter: F,
) -> Vec<&'a Location>
where
    F: Fn(&Location) -> bool,
{
    graph
        .nodes()
        .iter()
        .filter(|n| graph.degree(n.id) <= max_degree && filter(*n))
        .collect()
}

/// Low degree nodes worldwide and, optionally, inside one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegreeReport {
    pub max_degree: usize,
    /// (lat, lon) of every matching node
    pub worldwide: Vec<(f64, f64)>,
    pub region: Option<(Region, Vec<(f64, f64)>)>,
}

impl DegreeReport {
    pub fn collect(graph: &TopologyGraph, max_degree: usize, region: Option<Region>) -> Self {
        let coords = |nodes: Vec<&Location>| -> Vec<(f64, f64)> {
            nodes.iter().map(|n| (n.lat, n.lon)).collect()
        };
        Self {
            max_degree,
            worldwide: coords(low_degree_nodes(graph, max_degree, |_| true)),
            region: region.map(|r| {
                (
                    r,
                    coords(low_degree_nodes(graph, max_degree, |n| r.contains(n.lat, n.lon))),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeProvenance;
    use crate::locations::LocationKind;

    #[test]
    fn test_low_degree_query() {
        let mut graph = TopologyGraph::new();
        graph.add_node(41.88, -87.63, LocationKind::City); // Chicago
        graph.add_node(40.71, -74.00, LocationKind::City); // New York
        graph.add_node(48.86, 2.35, LocationKind::City); // Paris
        graph.add_node(51.51, -0.13, LocationKind::City); // London
        graph.add_edge(0, 1, EdgeProvenance::Triangulation);
        graph.add_edge(0, 2, EdgeProvenance::Triangulation);
        graph.add_edge(0, 3, EdgeProvenance::Triangulation);

        let leaves: Vec<usize> = low_degree_nodes(&graph, 1, |_| true)
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(leaves, vec![1, 2, 3]);

        let report = DegreeReport::collect(&graph, 1, Some(Region::UnitedStates));
        assert_eq!(report.worldwide.len(), 3);
        let (region, us) = report.region.unwrap();
        assert_eq!(region, Region::UnitedStates);
        assert_eq!(us, vec![(40.71, -74.00)]);
        // read-only
        assert_eq!(graph.num_edges(), 3);
    }
}
