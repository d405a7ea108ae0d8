// ===========================================================================
// OPTICS based point thinning
// ===========================================================================
//
// Builds the OPTICS cluster ordering over great-circle distances, cuts the
// reachability plot at `extraction_eps` and collapses every resulting
// cluster to one representative chosen by `RepresentativePolicy`.

use crate::config::{ClusterParams, RepresentativePolicy};
use crate::geodesy::{central_angle, spherical_centroid};
use crate::locations::{Location, LocationStore};
use crate::spatial_index::SpatialIndex;
use log::{debug, info};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// One step of the cluster ordering. Distances are central angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachabilityEntry {
    /// Position in the location slice the ordering was computed over.
    pub position: usize,
    /// `None` for the first point of every expansion.
    pub reachability: Option<f64>,
    /// `None` when fewer than `min_pts` neighbours lie within eps.
    pub core_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Ids of every member, the representative included, in ordering order.
    pub members: Vec<usize>,
    pub representative: usize,
}

impl Cluster {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterReport {
    pub clusters: Vec<Cluster>,
    pub removed: usize,
}

impl ClusterReport {
    /// Map from every input id to the id of the point that now stands for it.
    pub fn representative_of(&self) -> BTreeMap<usize, usize> {
        self.clusters
            .iter()
            .flat_map(|c| c.members.iter().map(move |&m| (m, c.representative)))
            .collect()
    }

    pub fn non_singleton_count(&self) -> usize {
        self.clusters.iter().filter(|c| !c.is_singleton()).count()
    }
}

pub struct OpticsFilter {
    params: ClusterParams,
}

impl OpticsFilter {
    pub fn new(params: ClusterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    fn core_distance(&self, neighbours: &[(usize, f64)]) -> Option<f64> {
        neighbours
            .get(self.params.min_pts() - 1)
            .map(|&(_, distance)| distance)
    }

    /// Compute the OPTICS cluster ordering. Expansion starts from the lowest
    /// unprocessed position; seeds are taken by smallest reachability, then
    /// smallest position.
    pub fn ordering(&self, index: &SpatialIndex) -> Vec<ReachabilityEntry> {
        let n = index.len();
        let mut processed = vec![false; n];
        let mut reachability = vec![f64::INFINITY; n];
        let mut order = Vec::with_capacity(n);

        for start in 0..n {
            if processed[start] {
                continue;
            }
            let mut seeds: BinaryHeap<Reverse<(OrderedFloat<f64>, usize)>> = BinaryHeap::new();
            let mut next = Some((start, None));

            while let Some((position, reach)) = next {
                processed[position] = true;
                let neighbours = index.neighbours_of(position, self.params.eps());
                let core_distance = self.core_distance(&neighbours);
                order.push(ReachabilityEntry {
                    position,
                    reachability: reach,
                    core_distance,
                });

                if let Some(core) = core_distance {
                    for &(other, distance) in &neighbours {
                        if processed[other] {
                            continue;
                        }
                        let candidate = core.max(distance);
                        if candidate < reachability[other] {
                            reachability[other] = candidate;
                            seeds.push(Reverse((OrderedFloat(candidate), other)));
                        }
                    }
                }

                next = None;
                while let Some(Reverse((OrderedFloat(reach), candidate))) = seeds.pop() {
                    // stale heap entries are left behind by reachability updates
                    if !processed[candidate] {
                        next = Some((candidate, Some(reach)));
                        break;
                    }
                }
            }
        }

        order
    }

    /// Cut the ordering into clusters of positions. A point whose
    /// reachability exceeds `extraction_eps` opens a new cluster when it is
    /// a core point at that scale and is noise (a singleton) otherwise.
    pub fn extract(&self, ordering: &[ReachabilityEntry]) -> Vec<Vec<usize>> {
        let cut = self.params.extraction_eps();
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        let mut current: Option<usize> = None;

        for entry in ordering {
            let reachable = entry.reachability.is_some_and(|r| r <= cut);
            match (reachable, current) {
                (true, Some(cluster)) => clusters[cluster].push(entry.position),
                (true, None) => {
                    clusters.push(vec![entry.position]);
                    current = Some(clusters.len() - 1);
                }
                (false, _) => {
                    clusters.push(vec![entry.position]);
                    current = entry
                        .core_distance
                        .filter(|&core| core <= cut)
                        .map(|_| clusters.len() - 1);
                }
            }
        }

        clusters
    }

    fn representative(&self, locations: &[Location], index: &SpatialIndex, members: &[usize]) -> usize {
        let by_id = |&&m: &&usize| locations[m].id;
        let lowest_id = *members.iter().min_by_key(by_id).unwrap_or(&members[0]);
        if self.params.representative() == RepresentativePolicy::LowestId {
            return lowest_id;
        }

        let vectors: Vec<[f64; 3]> = members.iter().map(|&m| index.position(m)).collect();
        match spherical_centroid(&vectors) {
            Some(centroid) => *members
                .iter()
                .min_by(|a, b| {
                    let da = central_angle(centroid, index.position(**a));
                    let db = central_angle(centroid, index.position(**b));
                    da.total_cmp(&db).then(by_id(a).cmp(&by_id(b)))
                })
                .unwrap_or(&members[0]),
            None => lowest_id,
        }
    }

    /// Run one clustering pass, shrinking `store` to one point per cluster.
    pub fn filter(&self, store: &mut LocationStore) -> ClusterReport {
        let before = store.len();
        let locations = store.as_slice();
        let index = SpatialIndex::new(locations);
        let ordering = self.ordering(&index);
        let groups = self.extract(&ordering);

        let mut keep = vec![true; locations.len()];
        let mut clusters = Vec::with_capacity(groups.len());
        for members in groups {
            let representative = self.representative(locations, &index, &members);
            for &m in &members {
                if m != representative {
                    keep[m] = false;
                }
            }
            clusters.push(Cluster {
                members: members.iter().map(|&m| locations[m].id).collect(),
                representative: locations[representative].id,
            });
        }

        store.retain_positions(&keep);
        let report = ClusterReport {
            removed: before - store.len(),
            clusters,
        };
        debug!(
            "OPTICS eps={:.6} rad min_pts={}: {} clusters, {} with several members",
            self.params.eps(),
            self.params.min_pts(),
            report.clusters.len(),
            report.non_singleton_count()
        );
        info!(
            "OPTICS pass reduced {} locations to {} ({} removed)",
            before,
            store.len(),
            report.removed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::km_to_radians;
    use crate::locations::LocationKind;

    // 0.009 degrees of latitude is roughly 1 km
    const KM_IN_DEGREES: f64 = 1.0 / 111.195;

    fn filter_km(eps_km: f64, min_pts: usize) -> OpticsFilter {
        let eps = km_to_radians(eps_km);
        OpticsFilter::new(ClusterParams::new(eps, min_pts, 0.8 * eps).unwrap())
    }

    fn store(points: &[(f64, f64)]) -> LocationStore {
        LocationStore::from_locations(
            points
                .iter()
                .enumerate()
                .map(|(i, &(lat, lon))| Location::new(i, lat, lon, LocationKind::City))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_separated_groups_collapse_independently() {
        let mut points = Vec::new();
        for i in 0..4 {
            points.push((i as f64 * KM_IN_DEGREES, 0.0));
        }
        for i in 0..3 {
            points.push((i as f64 * KM_IN_DEGREES, 5.0));
        }
        let mut locations = store(&points);
        let report = filter_km(10.0, 1).filter(&mut locations);

        assert_eq!(report.non_singleton_count(), 2);
        assert_eq!(locations.len(), 2);
        assert_eq!(report.removed, 5);

        let mapping = report.representative_of();
        assert_eq!(mapping.len(), 7);
        // no representative stands for members of both groups
        let west: Vec<usize> = (0..4).map(|i| mapping[&i]).collect();
        let east: Vec<usize> = (4..7).map(|i| mapping[&i]).collect();
        assert!(west.iter().all(|&r| r == west[0] && r < 4));
        assert!(east.iter().all(|&r| r == east[0] && r >= 4));
    }

    #[test]
    fn test_representative_is_closest_to_centroid() {
        let points = [
            (0.0, 0.0),
            (2.0 * KM_IN_DEGREES, 0.0),
            (4.0 * KM_IN_DEGREES, 0.0),
        ];
        let mut locations = store(&points);
        let report = filter_km(10.0, 1).filter(&mut locations);
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clusters[0].representative, 1);
        assert_eq!(locations.as_slice()[0].id, 1);
    }

    #[test]
    fn test_lowest_id_policy() {
        let points = [
            (4.0 * KM_IN_DEGREES, 0.0),
            (2.0 * KM_IN_DEGREES, 0.0),
            (0.0, 0.0),
        ];
        let eps = km_to_radians(10.0);
        let params = ClusterParams::new(eps, 1, 0.8 * eps)
            .unwrap()
            .with_representative(RepresentativePolicy::LowestId);
        let mut locations = store(&points);
        let report = OpticsFilter::new(params).filter(&mut locations);
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clusters[0].representative, 0);
        assert_eq!(locations.as_slice()[0].lat, 4.0 * KM_IN_DEGREES);
    }

    #[test]
    fn test_every_point_maps_to_a_survivor() {
        let points: Vec<(f64, f64)> = (0..30)
            .map(|i| ((i % 6) as f64 * 0.05, (i / 6) as f64 * 0.05))
            .collect();
        let mut locations = store(&points);
        let report = filter_km(6.0, 2).filter(&mut locations);

        let survivors: Vec<usize> = locations.iter().map(|l| l.id).collect();
        let mapping = report.representative_of();
        assert_eq!(mapping.len(), 30);
        for representative in mapping.values() {
            assert!(survivors.contains(representative));
        }
        assert_eq!(report.clusters.len(), survivors.len());
    }

    #[test]
    fn test_chain_is_cut_at_extraction_threshold() {
        // spacing of 9 km lies inside eps (10 km) but above the 8 km cut
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64 * 9.0 * KM_IN_DEGREES, 0.0)).collect();
        let mut locations = store(&points);
        let report = filter_km(10.0, 1).filter(&mut locations);
        assert_eq!(locations.len(), 5);
        assert_eq!(report.non_singleton_count(), 0);

        // 5 km spacing stays below the cut and chains into one cluster
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64 * 5.0 * KM_IN_DEGREES, 0.0)).collect();
        let mut locations = store(&points);
        filter_km(10.0, 1).filter(&mut locations);
        assert_eq!(locations.len(), 1);
    }

    #[test]
    fn test_sparse_points_are_noise() {
        let points = [(0.0, 0.0), (KM_IN_DEGREES, 0.0), (2.0 * KM_IN_DEGREES, 0.0)];
        let mut locations = store(&points);
        let report = filter_km(10.0, 5).filter(&mut locations);
        assert_eq!(locations.len(), 3);
        assert!(report.clusters.iter().all(Cluster::is_singleton));
    }

    #[test]
    fn test_ordering_visits_every_point_once() {
        let points = [(0.0, 0.0), (10.0, 10.0), (0.0, 3.0 * KM_IN_DEGREES), (-20.0, 5.0)];
        let locations = store(&points);
        let index = SpatialIndex::new(locations.as_slice());
        let ordering = filter_km(10.0, 1).ordering(&index);
        let mut positions: Vec<usize> = ordering.iter().map(|e| e.position).collect();
        assert_eq!(ordering[0].reachability, None);
        // the close neighbour of 0 is expanded right after it
        assert_eq!(positions[1], 2);
        positions.sort();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_single_point_survives() {
        let mut locations = store(&[(45.0, 7.0)]);
        let report = filter_km(10.0, 1).filter(&mut locations);
        assert_eq!(locations.len(), 1);
        assert_eq!(report.removed, 0);
    }
}
