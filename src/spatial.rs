//! Spatial join between trail polylines and transit stops: `spec.md` §4.2.
//!
//! Grounded on `original_source/src/index/spatial_join.py`: an R-tree (there,
//! Shapely's `STRtree`) over stop points, queried with a degree-space buffer
//! around each polyline vertex, refined by an exact haversine distance
//! check, then swept to drop access points too close to one another along
//! the trail, keeping whichever has the shorter walk. The degree-space
//! buffer is an equatorial approximation that over-selects candidates at
//! higher latitudes; this is preserved rather than corrected, matching the
//! source being ported (`crate::geo::DEGREES_PER_METER`'s own note).

use crate::geo::{self, Coordinate, DEGREES_PER_METER};
use crate::models::TrailAccessPoint;
use crate::schedule::ScheduleStore;
use rstar::{RTree, primitives::GeomWithData};
use std::collections::HashSet;
use std::sync::Arc;

type StopPoint = GeomWithData<[f64; 2], (Arc<str>, Arc<str>)>;

/// Queryable index of every stop in a schedule, keyed by `[lon, lat]` so the
/// tree's native Euclidean metric is the same local approximation used
/// elsewhere for buffering (see `DEGREES_PER_METER`).
pub struct SpatialIndex {
    tree: RTree<StopPoint>,
}

impl SpatialIndex {
    pub fn build<S: ScheduleStore>(store: &S) -> Self {
        let points: Vec<StopPoint> = store
            .stop_ids()
            .iter()
            .filter_map(|id| {
                let coord = store.stop_coordinate(id)?;
                let name = store.get_stop_name(id)?;
                Some(GeomWithData::new([coord.lon, coord.lat], (id.clone(), name)))
            })
            .collect();
        Self { tree: RTree::bulk_load(points) }
    }

    /// Every stop within `max_distance_m` of `point`, nearest first. Used
    /// for origin-stop search (`spec.md` §4.1).
    pub fn stops_near(&self, point: Coordinate, max_distance_m: f64) -> Vec<Arc<str>> {
        let buffer_deg = max_distance_m * DEGREES_PER_METER;
        let mut found: Vec<(f64, Arc<str>)> = self
            .tree
            .locate_within_distance([point.lon, point.lat], buffer_deg * buffer_deg)
            .filter_map(|candidate| {
                let coord = Coordinate::new(candidate.geom()[1], candidate.geom()[0]);
                let dist = geo::haversine_coord(point, coord);
                (dist <= max_distance_m).then(|| (dist, candidate.data.0.clone()))
            })
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Every stop within `max_walk_m` of any point on `polyline`, as trail
    /// access points with their along-trail position filled in. Not yet
    /// deduplicated; pass the result through `dedup_access_points`.
    pub fn access_points_for_polyline(
        &self,
        polyline: &[Coordinate],
        distance_km: f64,
        max_walk_m: f64,
    ) -> Vec<TrailAccessPoint> {
        let buffer_deg = max_walk_m * DEGREES_PER_METER;
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for vertex in polyline {
            let candidates = self
                .tree
                .locate_within_distance([vertex.lon, vertex.lat], buffer_deg * buffer_deg);
            for candidate in candidates {
                let (stop_id, stop_name) = &candidate.data;
                if !seen.insert(stop_id.clone()) {
                    continue;
                }
                let stop_coord = Coordinate::new(candidate.geom()[1], candidate.geom()[0]);
                let (nearest, fraction) = geo::nearest_point_on_polyline(polyline, stop_coord);
                let walk_distance_m = geo::haversine_coord(stop_coord, nearest);
                if walk_distance_m > max_walk_m {
                    continue;
                }
                out.push(TrailAccessPoint {
                    stop_id: stop_id.clone(),
                    stop_name: stop_name.clone(),
                    walk_distance_m,
                    entry_lat: nearest.lat,
                    entry_lon: nearest.lon,
                    trail_km_from_start: fraction * distance_km,
                });
            }
        }
        out
    }
}

/// Sweeps access points sorted by along-trail position, dropping any whose
/// `trail_km_from_start` falls within `threshold_m` of the last kept point;
/// between two that collide, keeps the shorter walk.
pub fn dedup_access_points(mut points: Vec<TrailAccessPoint>, threshold_m: f64) -> Vec<TrailAccessPoint> {
    points.sort_by(|a, b| a.trail_km_from_start.total_cmp(&b.trail_km_from_start));
    let threshold_km = threshold_m / 1000.0;

    let mut kept: Vec<TrailAccessPoint> = Vec::new();
    for point in points {
        if let Some(last) = kept.last_mut() {
            if (point.trail_km_from_start - last.trail_km_from_start).abs() <= threshold_km {
                if point.walk_distance_m < last.walk_distance_m {
                    *last = point;
                }
                continue;
            }
        }
        kept.push(point);
    }
    kept
}
