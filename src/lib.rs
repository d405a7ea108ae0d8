#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

pub mod beta_skeleton;
pub mod config;
pub mod connectivity;
pub mod delaunay;
pub mod density;
pub mod density_filter;
pub mod diagnostics;
pub mod errors;
pub mod external_links;
pub mod geodesy;
pub mod graph;
pub mod input;
pub mod locations;
pub mod optics;
pub mod output;
pub mod pipeline;
pub mod regions;
pub mod spatial_index;

#[cfg(test)]
mod pipeline_tests;

pub use config::{TopoGenConfig, TopologyParams};
pub use errors::TopoGenError;
pub use graph::{Edge, EdgeProvenance, TopologyGraph};
pub use locations::{Location, LocationKind};
pub use pipeline::{BuildOutcome, PipelineInput, TopologyBuilder};
