// ===========================================================================
// Topology construction: clustering -> Delaunay -> skeleton -> density ->
// external links -> largest component
// ===========================================================================
use crate::beta_skeleton::BetaSkeletonFilter;
use crate::config::TopologyParams;
use crate::connectivity::{ConnectivityPruner, PruneReport};
use crate::delaunay::PlanarTriangulator;
use crate::density::PopulationDensity;
use crate::density_filter::DensityLengthFilter;
use crate::diagnostics::DegreeReport;
use crate::errors::{Result, TopoGenError};
use crate::external_links::{ExternalLink, ExternalLinkMerger, MergeReport};
use crate::graph::TopologyGraph;
use crate::locations::{Location, LocationStore};
use crate::optics::OpticsFilter;
use crate::regions::Region;
use log::info;

/// Degree threshold of the low-degree report taken before cable import.
const REPORT_MAX_DEGREE: usize = 2;

#[derive(Default)]
pub struct PipelineInput<'a> {
    pub points: Vec<Location>,
    pub external_links: Vec<ExternalLink>,
    pub density: Option<&'a dyn PopulationDensity>,
    pub report_region: Option<Region>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub input_points: usize,
    pub after_neighbour_pass: usize,
    pub after_metropolis_pass: usize,
    pub fixed_points: usize,
    pub delaunay_edges: usize,
    pub skeleton_removed: usize,
    pub density_removed: Option<usize>,
    pub merge: Option<MergeReport>,
    pub prune: PruneReport,
    pub degree_report: DegreeReport,
}

pub struct BuildOutcome {
    pub graph: TopologyGraph,
    /// The Delaunay graph before any filtering.
    pub triangulation: TopologyGraph,
    pub stats: BuildStats,
}

pub struct TopologyBuilder<'p> {
    params: &'p TopologyParams,
}

impl<'p> TopologyBuilder<'p> {
    pub fn new(params: &'p TopologyParams) -> Self {
        Self { params }
    }

    pub fn build(&self, input: PipelineInput<'_>) -> Result<BuildOutcome> {
        let params = self.params;
        let skeleton = BetaSkeletonFilter::new(params.beta)?;
        let density_filter = match (params.length_filter, input.density) {
            (Some(lf), Some(provider)) => Some(DensityLengthFilter::new(lf, provider)?),
            (Some(_), None) => {
                return Err(TopoGenError::invalid(
                    "length_filter",
                    "enabled without a population density provider",
                ));
            }
            (None, _) => None,
        };

        let mut stats = BuildStats {
            input_points: input.points.len(),
            ..BuildStats::default()
        };

        let mut store = LocationStore::from_locations(input.points)?;
        let fixed = store.take_fixed();
        stats.fixed_points = fixed.len();

        info!("clustering {} locations at neighbour scale", store.len());
        OpticsFilter::new(params.neighbour).filter(&mut store);
        stats.after_neighbour_pass = store.len();

        info!("clustering {} locations at metropolis scale", store.len());
        OpticsFilter::new(params.metropolis).filter(&mut store);
        stats.after_metropolis_pass = store.len();

        // cable points join after clustering so they are never collapsed
        store.extend(fixed);
        store.renumber();

        let triangulation = PlanarTriangulator::triangulate(store.as_slice())?.graph;
        stats.delaunay_edges = triangulation.num_edges();

        let mut graph = triangulation.clone();
        stats.skeleton_removed = skeleton.filter(&mut graph);

        if let Some(filter) = &density_filter {
            stats.density_removed = Some(filter.filter(&mut graph));
        }

        stats.degree_report = DegreeReport::collect(&graph, REPORT_MAX_DEGREE, input.report_region);
        info!(
            "{} nodes with degree <= {} before external links",
            stats.degree_report.worldwide.len(),
            REPORT_MAX_DEGREE
        );
        if let Some((region, nodes)) = &stats.degree_report.region {
            info!(
                "{} of them in {}",
                nodes.len(),
                region.config().display_name
            );
        }

        if let Some(link_params) = params.external_links {
            let merger = ExternalLinkMerger::new(link_params);
            stats.merge = Some(merger.merge(&mut graph, &input.external_links)?);
        }

        stats.prune = ConnectivityPruner::prune(&mut graph);
        info!(
            "final topology: {} nodes, {} edges",
            graph.num_nodes(),
            graph.num_edges()
        );

        Ok(BuildOutcome {
            graph,
            triangulation,
            stats,
        })
    }
}
