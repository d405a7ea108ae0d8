use crate::config::TopoGenConfig;
use crate::connectivity::connected_components;
use crate::density::PopulationDensity;
use crate::errors::TopoGenError;
use crate::external_links::ExternalLink;
use crate::graph::EdgeProvenance;
use crate::locations::{Location, LocationKind};
use crate::pipeline::{PipelineInput, TopologyBuilder};
use crate::regions::Region;

/// Populated away from the central Atlantic-like strip |lon| <= 20.
struct TwoContinents;

impl PopulationDensity for TwoContinents {
    fn density_at(&self, _lat: f64, lon: f64) -> Option<f64> {
        if lon.abs() > 20.0 { Some(250.0) } else { Some(0.0) }
    }
}

fn city(id: usize, lat: f64, lon: f64) -> Location {
    Location::new(id, lat, lon, LocationKind::City)
}

/// Ten cities in the west (5 x 2 grid) and three in the east.
fn two_continents() -> Vec<Location> {
    let mut points = Vec::new();
    for row in 0..2 {
        for col in 0..5 {
            points.push(city(points.len(), row as f64, -31.0 + col as f64));
        }
    }
    points.push(city(points.len(), 0.0, 27.0));
    points.push(city(points.len(), 1.0, 28.0));
    points.push(city(points.len(), 0.0, 29.0));
    points
}

fn config(length_filter: bool, external_links: bool) -> TopoGenConfig {
    let mut config = TopoGenConfig::default();
    config.length_filter.enable = length_filter;
    config.external_links.enable = external_links;
    config
}

#[test]
fn test_gap_without_links_keeps_larger_continent() {
    let params = config(true, false).validate().unwrap();
    let outcome = TopologyBuilder::new(&params)
        .build(PipelineInput {
            points: two_continents(),
            density: Some(&TwoContinents),
            ..PipelineInput::default()
        })
        .unwrap();

    assert_eq!(outcome.stats.after_metropolis_pass, 13);
    assert!(outcome.stats.density_removed.unwrap() > 0);
    assert_eq!(outcome.stats.prune.components, 2);
    assert_eq!(outcome.graph.num_nodes(), 10);
    assert!(outcome.graph.nodes().iter().all(|n| n.lon < 0.0));
    assert_eq!(connected_components(&outcome.graph).len(), 1);
}

#[test]
fn test_external_link_bridges_the_gap() {
    let params = config(true, true).validate().unwrap();
    let link = ExternalLink::new([0.0, -27.0], [0.0, 27.0]);
    let outcome = TopologyBuilder::new(&params)
        .build(PipelineInput {
            points: two_continents(),
            external_links: vec![link],
            density: Some(&TwoContinents),
            ..PipelineInput::default()
        })
        .unwrap();

    let merge = outcome.stats.merge.unwrap();
    assert_eq!(merge.nodes_inserted, 0);
    assert_eq!(merge.edges_added, 1);
    assert_eq!(outcome.graph.num_nodes(), 13);
    let cables: Vec<_> = outcome
        .graph
        .edges()
        .filter(|e| e.provenance == EdgeProvenance::ExternalLink)
        .collect();
    assert_eq!(cables.len(), 1);
    assert!(cables[0].length_km > 5_000.0);
}

#[test]
fn test_final_graph_invariants() {
    let mut points = two_continents();
    // a dense metro area that collapses, plus a cable landing inside it
    for i in 0..6 {
        points.push(city(100 + i, 40.0 + i as f64 * 0.01, -74.0));
    }
    points.push(Location::new(200, 40.02, -74.01, LocationKind::CableLanding));

    let params = config(false, true).validate().unwrap();
    let outcome = TopologyBuilder::new(&params)
        .build(PipelineInput {
            points,
            report_region: Some(Region::UnitedStates),
            ..PipelineInput::default()
        })
        .unwrap();
    let graph = &outcome.graph;

    assert_eq!(outcome.stats.input_points, 20);
    assert_eq!(outcome.stats.fixed_points, 1);
    assert_eq!(outcome.stats.after_metropolis_pass, 14);
    // the landing point survives next to its metro representative
    assert_eq!(graph.num_nodes(), 15);
    assert_eq!(
        graph
            .nodes()
            .iter()
            .filter(|n| n.kind == LocationKind::CableLanding)
            .count(),
        1
    );

    let ids: Vec<usize> = graph.nodes().iter().map(|n| n.id).collect();
    assert_eq!(ids, (0..graph.num_nodes()).collect::<Vec<_>>());
    for edge in graph.edges() {
        assert_ne!(edge.from, edge.to);
        assert!(outcome.triangulation.has_edge(edge.from, edge.to));
    }
    assert_eq!(connected_components(graph).len(), 1);
    assert!(outcome.stats.degree_report.region.is_some());
}

#[test]
fn test_build_is_deterministic() {
    let params = config(true, true).validate().unwrap();
    let run = || {
        TopologyBuilder::new(&params)
            .build(PipelineInput {
                points: two_continents(),
                external_links: vec![ExternalLink::new([1.0, -27.0], [1.0, 28.0])],
                density: Some(&TwoContinents),
                ..PipelineInput::default()
            })
            .unwrap()
            .graph
    };
    let (a, b) = (run(), run());
    assert_eq!(a.nodes(), b.nodes());
    let ea: Vec<_> = a.edges().cloned().collect();
    let eb: Vec<_> = b.edges().cloned().collect();
    assert_eq!(ea, eb);
}

#[test]
fn test_pipeline_errors() {
    let params = config(true, false).validate().unwrap();
    let missing_provider = TopologyBuilder::new(&params).build(PipelineInput {
        points: two_continents(),
        ..PipelineInput::default()
    });
    assert!(matches!(
        missing_provider,
        Err(TopoGenError::InvalidParameter { .. })
    ));

    // everything collapses to one representative
    let params = config(false, false).validate().unwrap();
    let crowded: Vec<Location> = (0..5).map(|i| city(i, 10.0, 10.0 + i as f64 * 0.01)).collect();
    let degenerate = TopologyBuilder::new(&params).build(PipelineInput {
        points: crowded,
        ..PipelineInput::default()
    });
    assert!(matches!(degenerate, Err(TopoGenError::DegenerateInput(_))));
}
