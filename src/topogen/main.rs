use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use topogen::density::{DensityGrid, PopulationDensity};
use topogen::input::{load_links, load_points};
use topogen::output::{save_json, save_plain};
use topogen::regions::Region;
use topogen::{PipelineInput, TopoGenConfig, TopologyBuilder, TopologyParams};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON configuration file. Defaults apply when omitted.
    #[arg(long, env = "TOPOGEN_CONFIG")]
    config: Option<PathBuf>,

    /// CSV of candidate locations (`id,latitude,longitude[,kind]`).
    #[arg(long, env = "TOPOGEN_POINTS")]
    points: PathBuf,

    /// JSON array of submarine cable links.
    #[arg(long, env = "TOPOGEN_LINKS")]
    links: Option<PathBuf>,

    /// ESRI ASCII population density raster.
    #[arg(long, env = "TOPOGEN_DENSITY_GRID")]
    density_grid: Option<PathBuf>,

    #[arg(long, env = "TOPOGEN_JSON_OUTPUT")]
    json_output: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,

    #[arg(long, env = "TOPOGEN_NODE_FILE", requires = "edge_file")]
    node_file: Option<PathBuf>,

    #[arg(long, env = "TOPOGEN_EDGE_FILE", requires = "node_file")]
    edge_file: Option<PathBuf>,

    /// Write the unfiltered Delaunay graph here.
    #[arg(long, env = "TOPOGEN_DELAUNAY_JSON")]
    delaunay_json: Option<PathBuf>,

    /// Report low degree nodes inside this region as well.
    /// Valid options: united-states, europe, east-asia, south-america, africa, oceania
    #[arg(long)]
    report_region: Option<String>,

    /// Overrides the skeleton parameter of the config file.
    #[arg(long)]
    beta: Option<f64>,
}

fn report_region(args: &Args) -> Result<Option<Region>> {
    match &args.report_region {
        Some(name) => Ok(Some(name.parse::<Region>().map_err(|e| anyhow::anyhow!(e))?)),
        None => Ok(None),
    }
}

/// Config file (or defaults) with command line overrides applied.
fn topology_params(args: &Args) -> Result<TopologyParams> {
    let mut config = match &args.config {
        Some(path) => TopoGenConfig::load(path)?,
        None => {
            info!("no config file given, using defaults");
            TopoGenConfig::default()
        }
    };
    if let Some(beta) = args.beta {
        config.beta = beta;
    }
    config.validate().context("invalid configuration")
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let report_region = report_region(&args)?;
    let params = topology_params(&args)?;

    let points = load_points(&args.points)?;
    info!("loaded {} locations from {}", points.len(), args.points.display());

    let external_links = match &args.links {
        Some(path) => load_links(path)?,
        None => Vec::new(),
    };
    if params.external_links.is_none() && !external_links.is_empty() {
        warn!(
            "external links are disabled, ignoring {} links",
            external_links.len()
        );
    }

    let grid = match &args.density_grid {
        Some(path) => Some(DensityGrid::load(path)?),
        None => None,
    };
    if grid.is_some() && params.length_filter.is_none() {
        warn!("density grid given but the length filter is disabled");
    }

    let outcome = TopologyBuilder::new(&params).build(PipelineInput {
        points,
        external_links,
        density: grid.as_ref().map(|g| g as &dyn PopulationDensity),
        report_region,
    })?;

    let stats = &outcome.stats;
    println!(
        "{} locations -> {} after clustering ({} fixed), {} Delaunay edges",
        stats.input_points,
        stats.after_metropolis_pass + stats.fixed_points,
        stats.fixed_points,
        stats.delaunay_edges
    );
    println!(
        "final topology: {} nodes, {} edges ({} components before pruning)",
        outcome.graph.num_nodes(),
        outcome.graph.num_edges(),
        stats.prune.components
    );

    if let Some(path) = &args.json_output {
        save_json(&outcome.graph, path, args.pretty)?;
        info!("wrote {}", path.display());
    }
    if let (Some(nodes), Some(edges)) = (&args.node_file, &args.edge_file) {
        save_plain(&outcome.graph, nodes, edges)?;
        info!("wrote {} and {}", nodes.display(), edges.display());
    }
    if let Some(path) = &args.delaunay_json {
        save_json(&outcome.triangulation, path, args.pretty)?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
