use crate::errors::{Result, TopoGenError, io_err};
use crate::external_links::ExternalLink;
use crate::locations::{Location, LocationKind};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PointRecord {
    id: usize,
    latitude: f64,
    longitude: f64,
    #[serde(default = "default_kind")]
    kind: LocationKind,
}

fn default_kind() -> LocationKind {
    LocationKind::City
}

/// Read points from CSV with an `id,latitude,longitude[,kind]` header.
pub fn read_points<R: Read>(source_name: &str, reader: R) -> Result<Vec<Location>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader
        .deserialize::<PointRecord>()
        .map(|record| {
            let record = record.map_err(|e| TopoGenError::parse(source_name, e))?;
            Ok(Location::new(
                record.id,
                record.latitude,
                record.longitude,
                record.kind,
            ))
        })
        .collect()
}

pub fn load_points(path: &Path) -> Result<Vec<Location>> {
    let file = std::fs::File::open(path).map_err(|e| io_err!(path, e))?;
    read_points(&path.display().to_string(), file)
}

/// Read a JSON array of external links.
pub fn read_links<R: Read>(source_name: &str, reader: R) -> Result<Vec<ExternalLink>> {
    let links: Vec<ExternalLink> =
        serde_json::from_reader(reader).map_err(|e| TopoGenError::parse(source_name, e))?;
    for link in &links {
        link.validate()?;
    }
    Ok(links)
}

pub fn load_links(path: &Path) -> Result<Vec<ExternalLink>> {
    let file = std::fs::File::open(path).map_err(|e| io_err!(path, e))?;
    read_links(&path.display().to_string(), std::io::BufReader::new(file))
}
