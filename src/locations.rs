use crate::errors::{Result, TopoGenError};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationKind {
    City,
    CableLanding,
    CableWaypoint,
    Synthetic,
}

impl LocationKind {
    /// Cable points are imported after clustering and never collapsed.
    pub fn is_fixed(&self) -> bool {
        matches!(self, LocationKind::CableLanding | LocationKind::CableWaypoint)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::City => "city",
            LocationKind::CableLanding => "cable-landing",
            LocationKind::CableWaypoint => "cable-waypoint",
            LocationKind::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: usize,
    pub lat: f64,
    pub lon: f64,
    pub kind: LocationKind,
}

impl Location {
    pub fn new(id: usize, lat: f64, lon: f64, kind: LocationKind) -> Self {
        Self { id, lat, lon, kind }
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn same_position(&self, other: &Location) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

/// Ordered working set of points. Ids are whatever the point source supplied
/// until [`LocationStore::renumber`] is called.
#[derive(Debug, Clone, Default)]
pub struct LocationStore {
    locations: Vec<Location>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, rejecting out-of-range coordinates and duplicate ids.
    pub fn from_locations(locations: Vec<Location>) -> Result<Self> {
        let mut seen = AHashSet::with_capacity(locations.len());
        let mut store = Self::new();
        for location in locations {
            if !seen.insert(location.id) {
                return Err(TopoGenError::parse(
                    "point source",
                    format!("duplicate location id {}", location.id),
                ));
            }
            store.push(location)?;
        }
        Ok(store)
    }

    pub fn push(&mut self, location: Location) -> Result<()> {
        if !location.has_valid_coordinates() {
            return Err(TopoGenError::parse(
                "point source",
                format!(
                    "location {} has invalid coordinates ({}, {})",
                    location.id, location.lat, location.lon
                ),
            ));
        }
        self.locations.push(location);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn as_slice(&self) -> &[Location] {
        &self.locations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Keep the locations at the given positions, preserving order.
    pub fn retain_positions(&mut self, keep: &[bool]) {
        let mut position = 0;
        self.locations.retain(|_| {
            let kept = keep.get(position).copied().unwrap_or(true);
            position += 1;
            kept
        });
    }

    /// Split off every fixed (cable) location, leaving only clusterable ones.
    pub fn take_fixed(&mut self) -> Vec<Location> {
        let (fixed, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.locations)
            .into_iter()
            .partition(|l| l.kind.is_fixed());
        self.locations = rest;
        fixed
    }

    /// Append without validation of id uniqueness; used right before renumbering.
    pub fn extend(&mut self, locations: impl IntoIterator<Item = Location>) {
        self.locations.extend(locations);
    }

    /// Reassign ids to `0..len` in storage order.
    pub fn renumber(&mut self) {
        for (id, location) in self.locations.iter_mut().enumerate() {
            location.id = id;
        }
    }

    pub fn into_locations(self) -> Vec<Location> {
        self.locations
    }
}
