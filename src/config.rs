use crate::errors::{Result, TopoGenError, io_err};
use crate::geodesy::km_to_radians;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    pub max_cluster_distance_km: f64,
    pub min_pts: usize,
    pub representative: RepresentativePolicy,
}

/// Which member of a cluster survives a clustering pass.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativePolicy {
    /// The member nearest the spherical centroid of the cluster, ties broken
    /// by the smaller id.
    #[default]
    Centroid,
    /// The member with the smallest id, i.e. the first one supplied.
    LowestId,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LengthFilterConfig {
    pub enable: bool,
    /// Edges no longer than this are never removed.
    pub min_length_km: f64,
    /// Samples below this density (people per km²) count as unpopulated.
    pub min_density: f64,
    /// Remove when the unpopulated share of samples exceeds this.
    pub max_unpopulated_fraction: f64,
    pub sample_spacing_km: f64,
    /// Density assumed where the raster has no value.
    pub missing_density: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExternalLinkConfig {
    pub enable: bool,
    pub snap_tolerance_km: f64,
}

/// Raw configuration as read from a RON file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TopoGenConfig {
    pub neighbour_cluster: ClusterConfig,
    pub metropolis_cluster: ClusterConfig,
    /// Share of eps used as the cut threshold of the reachability plot.
    pub extraction_ratio: f64,
    pub beta: f64,
    pub length_filter: LengthFilterConfig,
    pub external_links: ExternalLinkConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_cluster_distance_km: 10.0,
            min_pts: 1,
            representative: RepresentativePolicy::default(),
        }
    }
}

impl Default for LengthFilterConfig {
    fn default() -> Self {
        Self {
            enable: false,
            min_length_km: 500.0,
            min_density: 1.0,
            max_unpopulated_fraction: 0.5,
            sample_spacing_km: 25.0,
            missing_density: 0.0,
        }
    }
}

impl Default for ExternalLinkConfig {
    fn default() -> Self {
        Self {
            enable: true,
            snap_tolerance_km: 5.0,
        }
    }
}

impl Default for TopoGenConfig {
    fn default() -> Self {
        Self {
            neighbour_cluster: ClusterConfig::default(),
            metropolis_cluster: ClusterConfig {
                max_cluster_distance_km: 40.0,
                min_pts: 3,
                representative: RepresentativePolicy::default(),
            },
            extraction_ratio: 0.8,
            beta: 1.0,
            length_filter: LengthFilterConfig::default(),
            external_links: ExternalLinkConfig::default(),
        }
    }
}

/// One validated OPTICS scale. Distances are central angles in radians.
/// Only constructible through [`ClusterParams::new`], so every instance holds
/// `eps > 0`, `min_pts >= 1` and `0 < extraction_eps <= eps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    eps: f64,
    min_pts: usize,
    extraction_eps: f64,
    representative: RepresentativePolicy,
}

impl ClusterParams {
    pub fn new(eps: f64, min_pts: usize, extraction_eps: f64) -> Result<Self> {
        if !(eps.is_finite() && eps > 0.0) {
            return Err(TopoGenError::invalid("eps", format!("must be > 0, got {eps}")));
        }
        if min_pts == 0 {
            return Err(TopoGenError::invalid("min_pts", "must be > 0"));
        }
        if !(extraction_eps.is_finite() && extraction_eps > 0.0 && extraction_eps <= eps) {
            return Err(TopoGenError::invalid(
                "extraction_eps",
                format!("must lie in (0, eps], got {extraction_eps}"),
            ));
        }
        Ok(Self {
            eps,
            min_pts,
            extraction_eps,
            representative: RepresentativePolicy::default(),
        })
    }

    pub fn with_representative(mut self, policy: RepresentativePolicy) -> Self {
        self.representative = policy;
        self
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_pts(&self) -> usize {
        self.min_pts
    }

    pub fn extraction_eps(&self) -> f64 {
        self.extraction_eps
    }

    pub fn representative(&self) -> RepresentativePolicy {
        self.representative
    }

    fn from_config(cluster: &ClusterConfig, extraction_ratio: f64) -> Result<Self> {
        if !(cluster.max_cluster_distance_km.is_finite() && cluster.max_cluster_distance_km > 0.0)
        {
            return Err(TopoGenError::invalid(
                "max_cluster_distance_km",
                format!("must be > 0, got {}", cluster.max_cluster_distance_km),
            ));
        }
        let eps = km_to_radians(cluster.max_cluster_distance_km);
        Ok(Self::new(eps, cluster.min_pts, extraction_ratio * eps)?
            .with_representative(cluster.representative))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthFilterParams {
    min_length_km: f64,
    min_density: f64,
    max_unpopulated_fraction: f64,
    sample_spacing_km: f64,
    missing_density: f64,
}

impl LengthFilterParams {
    pub fn new(
        min_length_km: f64,
        min_density: f64,
        max_unpopulated_fraction: f64,
        sample_spacing_km: f64,
        missing_density: f64,
    ) -> Result<Self> {
        if !(min_length_km.is_finite() && min_length_km >= 0.0) {
            return Err(TopoGenError::invalid("min_length_km", "must be >= 0"));
        }
        if !(min_density.is_finite() && min_density >= 0.0) {
            return Err(TopoGenError::invalid("min_density", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&max_unpopulated_fraction) {
            return Err(TopoGenError::invalid(
                "max_unpopulated_fraction",
                "must lie in [0, 1]",
            ));
        }
        if !(sample_spacing_km.is_finite() && sample_spacing_km > 0.0) {
            return Err(TopoGenError::invalid("sample_spacing_km", "must be > 0"));
        }
        if !missing_density.is_finite() {
            return Err(TopoGenError::invalid("missing_density", "must be finite"));
        }
        Ok(Self {
            min_length_km,
            min_density,
            max_unpopulated_fraction,
            sample_spacing_km,
            missing_density,
        })
    }

    pub fn min_length_km(&self) -> f64 {
        self.min_length_km
    }

    pub fn min_density(&self) -> f64 {
        self.min_density
    }

    pub fn max_unpopulated_fraction(&self) -> f64 {
        self.max_unpopulated_fraction
    }

    pub fn sample_spacing_km(&self) -> f64 {
        self.sample_spacing_km
    }

    pub fn missing_density(&self) -> f64 {
        self.missing_density
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalLinkParams {
    snap_tolerance_km: f64,
}

impl ExternalLinkParams {
    pub fn new(snap_tolerance_km: f64) -> Result<Self> {
        if !(snap_tolerance_km.is_finite() && snap_tolerance_km >= 0.0) {
            return Err(TopoGenError::invalid("snap_tolerance_km", "must be >= 0"));
        }
        Ok(Self { snap_tolerance_km })
    }

    pub fn snap_tolerance_km(&self) -> f64 {
        self.snap_tolerance_km
    }
}

/// Validated parameter bundle handed to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyParams {
    pub neighbour: ClusterParams,
    pub metropolis: ClusterParams,
    pub beta: f64,
    /// `None` when the density-length filter is disabled.
    pub length_filter: Option<LengthFilterParams>,
    /// `None` when external links are not merged.
    pub external_links: Option<ExternalLinkParams>,
}

pub fn validate_beta(beta: f64) -> Result<f64> {
    if beta.is_finite() && beta > 0.0 {
        Ok(beta)
    } else {
        Err(TopoGenError::invalid("beta", format!("must be > 0, got {beta}")))
    }
}

impl TopoGenConfig {
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| TopoGenError::parse(source_name, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| io_err!(path, e))?;
        Self::from_ron_str(&path.display().to_string(), &text)
    }

    pub fn validate(&self) -> Result<TopologyParams> {
        if !(self.extraction_ratio > 0.0 && self.extraction_ratio <= 1.0) {
            return Err(TopoGenError::invalid(
                "extraction_ratio",
                format!("must lie in (0, 1], got {}", self.extraction_ratio),
            ));
        }
        let neighbour = ClusterParams::from_config(&self.neighbour_cluster, self.extraction_ratio)?;
        let metropolis =
            ClusterParams::from_config(&self.metropolis_cluster, self.extraction_ratio)?;
        let beta = validate_beta(self.beta)?;

        let length_filter = if self.length_filter.enable {
            let lf = &self.length_filter;
            Some(LengthFilterParams::new(
                lf.min_length_km,
                lf.min_density,
                lf.max_unpopulated_fraction,
                lf.sample_spacing_km,
                lf.missing_density,
            )?)
        } else {
            None
        };

        let external_links = if self.external_links.enable {
            Some(ExternalLinkParams::new(self.external_links.snap_tolerance_km)?)
        } else {
            None
        };

        Ok(TopologyParams {
            neighbour,
            metropolis,
            beta,
            length_filter,
            external_links,
        })
    }
}
