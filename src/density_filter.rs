use crate::config::LengthFilterParams;
use crate::density::{DensityLineSampler, PopulationDensity};
use crate::errors::Result;
use crate::graph::TopologyGraph;
use log::{debug, info};

/// Drops long edges whose great-circle path runs mostly through
/// unpopulated cells.
pub struct DensityLengthFilter<'a> {
    params: LengthFilterParams,
    sampler: DensityLineSampler<'a>,
}

impl<'a> DensityLengthFilter<'a> {
    pub fn new(params: LengthFilterParams, provider: &'a dyn PopulationDensity) -> Result<Self> {
        let sampler = DensityLineSampler::new(provider, params.sample_spacing_km())?;
        Ok(Self { params, sampler })
    }

    /// Share of samples below `min_density`. Samples the raster cannot
    /// answer count as `missing_density`.
    pub fn unpopulated_fraction(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
        let samples = self.sampler.sample(from, to);
        if samples.is_empty() {
            return 0.0;
        }
        let unpopulated = samples
            .iter()
            .map(|s| s.unwrap_or(self.params.missing_density()))
            .filter(|&density| density < self.params.min_density())
            .count();
        unpopulated as f64 / samples.len() as f64
    }

    pub fn should_remove(&self, length_km: f64, from: (f64, f64), to: (f64, f64)) -> bool {
        length_km > self.params.min_length_km()
            && self.unpopulated_fraction(from, to) > self.params.max_unpopulated_fraction()
    }

    /// Returns the number of removed edges.
    pub fn filter(&self, graph: &mut TopologyGraph) -> usize {
        let frozen: &TopologyGraph = graph;
        let nodes = frozen.nodes();
        let doomed: Vec<(usize, usize)> = frozen
            .edges()
            .filter(|e| {
                let (a, b) = (&nodes[e.from], &nodes[e.to]);
                self.should_remove(e.length_km, (a.lat, a.lon), (b.lat, b.lon))
            })
            .map(|e| e.key())
            .collect();

        for &(u, v) in &doomed {
            debug!("density filter drops edge {} - {}", u, v);
            graph.remove_edge(u, v);
        }
        info!(
            "density-length filter removed {} edges longer than {} km",
            doomed.len(),
            self.params.min_length_km()
        );
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeProvenance;
    use crate::locations::LocationKind;

    /// Populated west of the prime meridian, empty east of it, unknown
    /// south of the equator.
    struct HalfWorld;

    impl PopulationDensity for HalfWorld {
        fn density_at(&self, lat: f64, lon: f64) -> Option<f64> {
            if lat < 0.0 {
                None
            } else if lon < 0.0 {
                Some(100.0)
            } else {
                Some(0.0)
            }
        }
    }

    fn params() -> LengthFilterParams {
        LengthFilterParams::new(300.0, 1.0, 0.5, 20.0, 0.0).unwrap()
    }

    fn graph() -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        graph.add_node(10.0, -20.0, LocationKind::City); // 0
        graph.add_node(10.0, -10.0, LocationKind::City); // 1
        graph.add_node(10.0, 10.0, LocationKind::City); // 2
        graph.add_node(10.0, 20.0, LocationKind::City); // 3
        graph.add_node(10.0, 21.0, LocationKind::City); // 4
        graph.add_node(-20.0, -20.0, LocationKind::City); // 5
        graph.add_edge(0, 1, EdgeProvenance::Triangulation); // populated, long
        graph.add_edge(2, 3, EdgeProvenance::Triangulation); // empty, long
        graph.add_edge(3, 4, EdgeProvenance::Triangulation); // empty, short
        graph.add_edge(0, 5, EdgeProvenance::Triangulation); // mostly unknown, long
        graph
    }

    #[test]
    fn test_removes_long_unpopulated_edges_only() {
        let mut graph = graph();
        let removed = DensityLengthFilter::new(params(), &HalfWorld)
            .unwrap()
            .filter(&mut graph);
        assert_eq!(removed, 2);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(3, 4));
        assert!(!graph.has_edge(2, 3));
        assert!(!graph.has_edge(0, 5));
    }

    #[test]
    fn test_missing_density_fallback_is_configurable() {
        let generous = LengthFilterParams::new(300.0, 1.0, 0.5, 20.0, 50.0).unwrap();
        let mut graph = graph();
        DensityLengthFilter::new(generous, &HalfWorld)
            .unwrap()
            .filter(&mut graph);
        assert!(graph.has_edge(0, 5));
        assert!(!graph.has_edge(2, 3));
    }

    #[test]
    fn test_unpopulated_fraction() {
        let filter = DensityLengthFilter::new(params(), &HalfWorld).unwrap();
        assert_eq!(filter.unpopulated_fraction((10.0, -20.0), (10.0, -10.0)), 0.0);
        assert_eq!(filter.unpopulated_fraction((10.0, 10.0), (10.0, 20.0)), 1.0);
    }
}
