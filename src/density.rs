// ===========================================================================
// Population density rasters and sampling along great circles
// ===========================================================================
use crate::errors::{Result, TopoGenError, io_err};
use crate::geodesy::{haversine_km, interpolate};
use std::path::Path;
use std::str::FromStr;

/// Source of population density (people per km²) at a coordinate.
/// `None` means the raster holds no value there.
pub trait PopulationDensity {
    fn density_at(&self, lat: f64, lon: f64) -> Option<f64>;
}

/// Regular lat/lon raster, rows stored north to south.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    ncols: usize,
    nrows: usize,
    /// Longitude of the western edge.
    west: f64,
    /// Latitude of the southern edge.
    south: f64,
    cell_size: f64,
    nodata: Option<f64>,
    values: Vec<f64>,
}

impl DensityGrid {
    pub fn new(
        ncols: usize,
        nrows: usize,
        west: f64,
        south: f64,
        cell_size: f64,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let cells = ncols
            .checked_mul(nrows)
            .filter(|&cells| cells > 0)
            .ok_or_else(|| {
                TopoGenError::parse("density grid", format!("invalid dimensions {ncols} x {nrows}"))
            })?;
        if values.len() != cells {
            return Err(TopoGenError::parse(
                "density grid",
                format!("expected {} values, got {}", cells, values.len()),
            ));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(TopoGenError::parse("density grid", "cell size must be > 0"));
        }
        Ok(Self {
            ncols,
            nrows,
            west,
            south,
            cell_size,
            nodata,
            values,
        })
    }

    /// Parse an ESRI ASCII grid (`ncols`, `nrows`, `xllcorner`, `yllcorner`,
    /// `cellsize`, optional `NODATA_value`, then rows from north to south).
    pub fn from_ascii_grid(source_name: &str, text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace().peekable();
        let ncols: usize = header(&mut tokens, source_name, "ncols")?;
        let nrows: usize = header(&mut tokens, source_name, "nrows")?;
        let west: f64 = header(&mut tokens, source_name, "xllcorner")?;
        let south: f64 = header(&mut tokens, source_name, "yllcorner")?;
        let cell_size: f64 = header(&mut tokens, source_name, "cellsize")?;

        let nodata = match tokens.peek() {
            Some(t) if t.eq_ignore_ascii_case("nodata_value") => {
                tokens.next();
                let value = tokens
                    .next()
                    .ok_or_else(|| TopoGenError::parse(source_name, "missing NODATA_value"))?;
                Some(
                    value
                        .parse::<f64>()
                        .map_err(|e| TopoGenError::parse(source_name, format!("NODATA_value: {e}")))?,
                )
            }
            _ => None,
        };

        let values = tokens
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|e| TopoGenError::parse(source_name, format!("cell value '{t}': {e}")))
            })
            .collect::<Result<Vec<f64>>>()?;

        Self::new(ncols, nrows, west, south, cell_size, nodata, values)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| io_err!(path, e))?;
        Self::from_ascii_grid(&path.display().to_string(), &text)
    }
}

/// Read one `key value` header pair. Dimensions parse as `usize`, so negative,
/// fractional or out of range values are rejected here.
fn header<'t, T>(
    tokens: &mut impl Iterator<Item = &'t str>,
    source_name: &str,
    key: &str,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = tokens
        .next()
        .ok_or_else(|| TopoGenError::parse(source_name, format!("missing {key}")))?;
    if !name.eq_ignore_ascii_case(key) {
        return Err(TopoGenError::parse(
            source_name,
            format!("expected header {key}, found {name}"),
        ));
    }
    let value = tokens
        .next()
        .ok_or_else(|| TopoGenError::parse(source_name, format!("missing value of {key}")))?;
    value
        .parse::<T>()
        .map_err(|e| TopoGenError::parse(source_name, format!("{key} '{value}': {e}")))
}

impl PopulationDensity for DensityGrid {
    fn density_at(&self, lat: f64, lon: f64) -> Option<f64> {
        let col = ((lon - self.west) / self.cell_size).floor();
        let row_from_south = ((lat - self.south) / self.cell_size).floor();
        if col < 0.0 || row_from_south < 0.0 {
            return None;
        }
        let (col, row_from_south) = (col as usize, row_from_south as usize);
        if col >= self.ncols || row_from_south >= self.nrows {
            return None;
        }
        let row = self.nrows - 1 - row_from_south;
        let value = self.values[row * self.ncols + col];
        match self.nodata {
            Some(nodata) if value == nodata => None,
            _ if !value.is_finite() || value < 0.0 => None,
            _ => Some(value),
        }
    }
}

/// Samples density at evenly spaced points along the great circle between
/// two coordinates, endpoints included.
pub struct DensityLineSampler<'a> {
    provider: &'a dyn PopulationDensity,
    spacing_km: f64,
}

impl<'a> DensityLineSampler<'a> {
    pub fn new(provider: &'a dyn PopulationDensity, spacing_km: f64) -> Result<Self> {
        if !(spacing_km.is_finite() && spacing_km > 0.0) {
            return Err(TopoGenError::invalid(
                "sample_spacing_km",
                format!("must be > 0, got {spacing_km}"),
            ));
        }
        Ok(Self {
            provider,
            spacing_km,
        })
    }

    pub fn sample(&self, from: (f64, f64), to: (f64, f64)) -> Vec<Option<f64>> {
        let length = haversine_km(from.0, from.1, to.0, to.1);
        let segments = ((length / self.spacing_km).ceil() as usize).max(1);
        (0..=segments)
            .map(|i| {
                let (lat, lon) = interpolate(from, to, i as f64 / segments as f64);
                self.provider.density_at(lat, lon)
            })
            .collect()
    }
}
