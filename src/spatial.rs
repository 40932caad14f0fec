//! Uniform-grid spatial index over stop coordinates (spec.md §2 "HashGrid
//! / Spatial index", §4.2; ≈5% of the core).
//!
//! Grounded in the bucketed-grid shape used across the corpus for
//! coordinate nearest-neighbor lookups (e.g. `ferrobus_core`'s use of an
//! r-tree over stop points for `isochrone`/`range_routing` origin
//! resolution, generalized here to spec.md's plain uniform grid since a
//! full r-tree dependency is unneeded for a fixed-cell-size lookup).

use hashbrown::HashMap;

use crate::model::{Coord, StopId, Timetable};

/// Cell coordinate in the projected grid.
type CellKey = (i64, i64);

/// Uniform grid over stop coordinates, bucketed into square cells of a
/// fixed edge length (`RouterConfig::hash_grid_cell_size_m`).
///
/// Built once at load time (paired with a [`Timetable`]) and reused
/// across queries; it is read-only after construction.
#[derive(Debug, Clone)]
pub struct HashGrid {
    cell_size_deg: f64,
    cells: HashMap<CellKey, Vec<StopId>>,
}

/// One candidate returned by a [`HashGrid::query`], sorted by distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHit {
    pub stop: StopId,
    pub dist_meters: f64,
}

impl HashGrid {
    /// Builds the grid for every stop in `timetable`. `cell_size_m` is an
    /// approximate edge length; it is converted to a degrees-of-latitude
    /// cell size (close enough at the scale this index targets — a single
    /// metro area, not a cross-continental deployment).
    #[must_use]
    pub fn build(timetable: &Timetable, cell_size_m: f64) -> Self {
        const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
        let cell_size_deg = (cell_size_m / METERS_PER_DEGREE_LAT).max(1e-6);
        let mut cells: HashMap<CellKey, Vec<StopId>> = HashMap::new();
        for i in 0..timetable.n_stops() {
            let stop = StopId::from_index(i);
            let coord = timetable.stop_coord(stop);
            let key = cell_key(coord, cell_size_deg);
            cells.entry(key).or_default().push(stop);
        }
        HashGrid { cell_size_deg, cells }
    }

    /// All stops within `radius_m` of `center`, nearest first, ties
    /// broken by ascending stop index (spec.md §4.2: "Deterministic
    /// iteration order over stops at identical distances").
    #[must_use]
    pub fn query(&self, timetable: &Timetable, center: Coord, radius_m: f64) -> Vec<GridHit> {
        let center_key = cell_key(center, self.cell_size_deg);
        let cell_radius = (radius_m / (self.cell_size_deg * 111_320.0)).ceil() as i64 + 1;

        let mut seen = hashbrown::HashSet::new();
        let mut hits = Vec::new();
        for dx in -cell_radius..=cell_radius {
            for dy in -cell_radius..=cell_radius {
                let key = (center_key.0 + dx, center_key.1 + dy);
                let Some(stops) = self.cells.get(&key) else {
                    continue;
                };
                for &stop in stops {
                    if !seen.insert(stop) {
                        continue;
                    }
                    let dist = center.distance_meters(timetable.stop_coord(stop));
                    if dist <= radius_m {
                        hits.push(GridHit {
                            stop,
                            dist_meters: dist,
                        });
                    }
                }
            }
        }
        hits.sort_by(|a, b| {
            a.dist_meters
                .partial_cmp(&b.dist_meters)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.stop.index().cmp(&b.stop.index()))
        });
        hits
    }

    /// The single closest stop to `center` within `radius_m`, or `None`.
    #[must_use]
    pub fn closest(&self, timetable: &Timetable, center: Coord, radius_m: f64) -> Option<GridHit> {
        self.query(timetable, center, radius_m).into_iter().next()
    }
}

fn cell_key(coord: Coord, cell_size_deg: f64) -> CellKey {
    (
        (coord.lat / cell_size_deg).floor() as i64,
        (coord.lon / cell_size_deg).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StopSpec, TimetableBuilder};

    fn single_stop_timetable() -> Timetable {
        let mut b = TimetableBuilder::new(0);
        b.add_stop(StopSpec {
            name: "a".into(),
            external_id: "a".into(),
            coord: Coord::new(51.5, -0.1),
        });
        b.add_stop(StopSpec {
            name: "b".into(),
            external_id: "b".into(),
            coord: Coord::new(51.5001, -0.1),
        });
        b.add_stop(StopSpec {
            name: "far".into(),
            external_id: "far".into(),
            coord: Coord::new(52.5, 1.0),
        });
        b.build().unwrap()
    }

    #[test]
    fn query_finds_nearby_not_far() {
        let tt = single_stop_timetable();
        let grid = HashGrid::build(&tt, 500.0);
        let hits = grid.query(&tt, Coord::new(51.5, -0.1), 200.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].stop.index(), 0);
    }

    #[test]
    fn no_duplicates_across_overlapping_cells() {
        let tt = single_stop_timetable();
        let grid = HashGrid::build(&tt, 50.0);
        let hits = grid.query(&tt, Coord::new(51.5, -0.1), 50_000.0);
        let mut idxs: Vec<_> = hits.iter().map(|h| h.stop.index()).collect();
        idxs.sort_unstable();
        idxs.dedup();
        assert_eq!(idxs.len(), hits.len());
    }
}
