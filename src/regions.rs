// Named bounding boxes for restricting diagnostics to one part of the world.
//
// Boxes are coarse (west, south, east, north) envelopes in WGS84 degrees and
// are only meant for reporting.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    UnitedStates,
    Europe,
    EastAsia,
    SouthAmerica,
    Africa,
    Oceania,
}

impl Region {
    pub const ALL: &'static [Region] = &[
        Region::UnitedStates,
        Region::Europe,
        Region::EastAsia,
        Region::SouthAmerica,
        Region::Africa,
        Region::Oceania,
    ];

    pub fn config(&self) -> RegionConfig {
        match self {
            Region::UnitedStates => RegionConfig {
                name: "united-states",
                display_name: "United States (contiguous)",
                bbox: (-125.0, 24.0, -66.0, 50.0),
            },
            Region::Europe => RegionConfig {
                name: "europe",
                display_name: "Europe",
                // Western European landmass + Britain + Scandinavia
                bbox: (-25.0, 34.0, 46.0, 72.0),
            },
            Region::EastAsia => RegionConfig {
                name: "east-asia",
                display_name: "East Asia",
                bbox: (73.0, 18.0, 150.0, 54.0),
            },
            Region::SouthAmerica => RegionConfig {
                name: "south-america",
                display_name: "South America",
                bbox: (-82.0, -56.0, -34.0, 13.0),
            },
            Region::Africa => RegionConfig {
                name: "africa",
                display_name: "Africa",
                bbox: (-18.0, -35.0, 52.0, 38.0),
            },
            Region::Oceania => RegionConfig {
                name: "oceania",
                display_name: "Oceania",
                bbox: (112.0, -48.0, 180.0, -9.0),
            },
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.config().contains_point(lon, lat)
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "united-states" | "unitedstates" | "us" | "usa" => Ok(Region::UnitedStates),
            "europe" | "eu" => Ok(Region::Europe),
            "east-asia" | "eastasia" | "asia" => Ok(Region::EastAsia),
            "south-america" | "southamerica" | "sa" => Ok(Region::SouthAmerica),
            "africa" | "af" => Ok(Region::Africa),
            "oceania" | "australia" | "au" => Ok(Region::Oceania),
            _ => Err(format!(
                "Unknown region: '{}'. Valid options: united-states, europe, east-asia, south-america, africa, oceania",
                s
            )),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config().name)
    }
}

#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Short name
    pub name: &'static str,
    /// Human-readable display name
    pub display_name: &'static str,
    /// Bounding box: (west, south, east, north) in WGS84 degrees
    pub bbox: (f64, f64, f64, f64),
}

impl RegionConfig {
    /// Check if a point (lon, lat) is within this region's bounding box
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        let (west, south, east, north) = self.bbox;
        lon >= west && lon <= east && lat >= south && lat <= north
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_str() {
        assert_eq!(Region::from_str("us").unwrap(), Region::UnitedStates);
        assert_eq!(Region::from_str("EU").unwrap(), Region::Europe);
        assert!(Region::from_str("atlantis").is_err());
        for region in Region::ALL {
            assert_eq!(Region::from_str(&region.to_string()).unwrap(), *region);
        }
    }

    #[test]
    fn test_contains() {
        // Chicago
        assert!(Region::UnitedStates.contains(41.88, -87.63));
        // Paris is in Europe, not in the US
        assert!(Region::Europe.contains(48.86, 2.35));
        assert!(!Region::UnitedStates.contains(48.86, 2.35));
    }
}
