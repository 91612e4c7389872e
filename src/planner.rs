//! Plan composition and scoring: `spec.md` §4.5, the top-level
//! `plan_hikes`/`plan_hikes_for_origin` operation.
//!
//! Grounded directly on `original_source/src/query/planner.py`: origin
//! resolution (`_resolve_origin`), trail filtering (`_filter_trails`), and
//! both per-trail plan shapes (`_plan_access_point` for out-and-back/loop,
//! `_plan_through_hike` for through-hikes) — every formula below reproduces
//! theirs exactly, including the "preserve verbatim" quirks `spec.md` §9
//! calls out (full-trail `effective_speed` in out-and-back planning,
//! proportional through-hike elevation split, zero elevation on the
//! out-and-back `HikeSegment` since the original never fills it there).

use crate::config::{
    DEFAULT_EARLIEST_DEPARTURE_HOUR, NAISMITH_CLIMB_FACTOR, NAISMITH_SPEED_KMH, RAINY_MONTHS,
    THROUGH_HIKE_MAX_DISTANCE_KM, THROUGH_HIKE_MIN_DISTANCE_KM, WALK_SPEED_KMH,
};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::models::{
    BusLeg, Difficulty, HikePlan, HikeQuery, HikeSegment, Origin, SortKey, Trail,
    TrailAccessPoint,
};
use crate::router::Router;
use crate::schedule::ScheduleStore;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;

/// Central bus/train station coordinates per city, case-insensitively
/// keyed. Mirrors `original_source/src/config.py::CITY_COORDINATES`.
const CITY_COORDINATES: &[(&str, f64, f64)] = &[
    ("rehovot", 31.8928, 34.8113),
    ("jerusalem", 31.7892, 35.2033),
    ("tel aviv", 32.0564, 34.7796),
    ("haifa", 32.7940, 34.9896),
    ("beer sheva", 31.2430, 34.7932),
    ("netanya", 32.3215, 34.8532),
    ("herzliya", 32.1629, 34.8447),
    ("petah tikva", 32.0868, 34.8867),
    ("rishon lezion", 31.9642, 34.8048),
    ("ashdod", 31.8014, 34.6435),
];

fn resolve_origin(origin: &Origin) -> Result<Coordinate> {
    match origin {
        Origin::Coordinate(lat, lon) => Ok(Coordinate::new(*lat, *lon)),
        Origin::City(name) => {
            let key = name.trim().to_lowercase();
            CITY_COORDINATES
                .iter()
                .find(|(city, _, _)| *city == key)
                .map(|(_, lat, lon)| Coordinate::new(*lat, *lon))
                .ok_or_else(|| Error::UnknownOrigin(name.clone()))
        }
    }
}

/// Applies every user-specified filter of `spec.md` §4.5 step 4. Trails
/// already carry access points (or don't) from spatial join; this step
/// never looks at those, only at the catalogue metadata.
pub fn filter_trails(trails: Vec<Trail>, query: &HikeQuery) -> Vec<Trail> {
    let colors: Option<HashSet<String>> = query
        .colors
        .as_ref()
        .map(|cs| cs.iter().map(|c| c.to_lowercase()).collect());

    trails
        .into_iter()
        .filter(|t| {
            if let Some(colors) = &colors {
                let trail_colors: HashSet<String> =
                    t.colors.iter().map(|c| c.to_lowercase()).collect();
                if colors.is_disjoint(&trail_colors) {
                    return false;
                }
            }
            if let Some(min) = query.min_distance_km {
                if t.distance_km < min {
                    return false;
                }
            }
            if let Some(max) = query.max_distance_km {
                if t.distance_km > max {
                    return false;
                }
            }
            if query.loop_only && !t.is_loop {
                return false;
            }
            if query.linear_only && t.is_loop {
                return false;
            }
            if let Some(max_gain) = query.max_elevation_gain_m {
                if t.elevation_gain_m > max_gain {
                    return false;
                }
            }
            if let Some(difficulty) = query.difficulty {
                if t.difficulty != Some(difficulty) {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn naismith_hours(distance_km: f64, elevation_gain_m: f64) -> f64 {
    distance_km / NAISMITH_SPEED_KMH + elevation_gain_m / NAISMITH_CLIMB_FACTOR
}

fn walk_hours(distance_m: f64) -> f64 {
    (distance_m / 1000.0) / WALK_SPEED_KMH
}

fn secs_of(dt: NaiveDateTime, date: NaiveDate) -> u32 {
    (dt.signed_duration_since(date.and_hms_opt(0, 0, 0).expect("valid midnight")).num_seconds())
        .max(0) as u32
}

fn season_warnings(trail: &Trail, date: NaiveDate) -> Vec<Arc<str>> {
    if !trail.season_warnings.is_empty() && RAINY_MONTHS.contains(&date.month()) {
        trail.season_warnings.clone()
    } else {
        Vec::new()
    }
}

/// Every piece shared by both `_plan_access_point` and `_plan_through_hike`:
/// the outbound/return bus search and the resulting trip window. Returns
/// `None` under exactly the circumstances `spec.md` §4.5 names as "no plan".
struct Window {
    outbound_legs: Vec<BusLeg>,
    return_legs: Vec<BusLeg>,
    hike_start_secs: f64,
    hike_end_secs: f64,
    departure_ts: NaiveDateTime,
    arrival_ts: NaiveDateTime,
    total_hours: f64,
}

#[allow(clippy::too_many_arguments)]
fn find_window<S: ScheduleStore>(
    router: &Router<S>,
    entry_stop: &Arc<str>,
    exit_stop: &Arc<str>,
    entry_walk_m: f64,
    exit_walk_m: f64,
    origin_stops: &[Arc<str>],
    origin_stop_set: &HashSet<Arc<str>>,
    earliest_dep_secs: u32,
    deadline_secs: u32,
    date: NaiveDate,
) -> Option<Window> {
    let return_legs = router.find_return(&[exit_stop.clone()], origin_stop_set, deadline_secs)?;
    let return_dep_secs = secs_of(return_legs[0].departure_ts, date) as f64;
    let walk_back_secs = walk_hours(exit_walk_m) * 3600.0;
    if return_dep_secs < walk_back_secs {
        return None;
    }
    let hike_end_secs = return_dep_secs - walk_back_secs;
    if hike_end_secs <= earliest_dep_secs as f64 {
        return None;
    }

    let dest: HashSet<Arc<str>> = [entry_stop.clone()].into_iter().collect();
    let outbound_legs = router.find_outbound(origin_stops, &dest, earliest_dep_secs)?;
    let outbound_arr_secs = secs_of(outbound_legs.last().unwrap().arrival_ts, date) as f64;
    let walk_to_secs = walk_hours(entry_walk_m) * 3600.0;
    let hike_start_secs = outbound_arr_secs + walk_to_secs;

    if hike_start_secs >= hike_end_secs {
        return None;
    }

    let departure_ts = outbound_legs[0].departure_ts;
    let arrival_ts = return_legs.last().unwrap().arrival_ts;
    let total_hours = arrival_ts.signed_duration_since(departure_ts).num_seconds() as f64 / 3600.0;

    Some(Window {
        outbound_legs,
        return_legs,
        hike_start_secs,
        hike_end_secs,
        departure_ts,
        arrival_ts,
        total_hours,
    })
}

/// `spec.md` §4.5 "per-access-point plan (out-and-back or loop)".
#[allow(clippy::too_many_arguments)]
fn plan_access_point<S: ScheduleStore>(
    trail: &Arc<Trail>,
    ap: &TrailAccessPoint,
    router: &Router<S>,
    origin_stops: &[Arc<str>],
    origin_stop_set: &HashSet<Arc<str>>,
    earliest_dep_secs: u32,
    deadline_ts: NaiveDateTime,
    deadline_secs: u32,
    min_hiking_hours: f64,
    date: NaiveDate,
) -> Option<HikePlan> {
    let window = find_window(
        router,
        &ap.stop_id,
        &ap.stop_id,
        ap.walk_distance_m,
        ap.walk_distance_m,
        origin_stops,
        origin_stop_set,
        earliest_dep_secs,
        deadline_secs,
        date,
    )?;

    let window_hours = (window.hike_end_secs - window.hike_start_secs) / 3600.0;
    let required_h = naismith_hours(trail.distance_km, trail.elevation_gain_m);

    let (actual_hiking_hours, estimated_distance_km) = if trail.is_loop {
        if window_hours < required_h {
            return None;
        }
        (required_h, trail.distance_km)
    } else {
        let half_window = window_hours / 2.0;
        let effective_speed = if required_h > 0.0 {
            trail.distance_km / required_h
        } else {
            NAISMITH_SPEED_KMH
        };
        let one_way_km = (half_window * effective_speed).min(trail.distance_km);
        let estimated_distance_km = one_way_km * 2.0;
        let actual_hiking_hours = if effective_speed > 0.0 {
            estimated_distance_km / effective_speed
        } else {
            0.0
        };
        (actual_hiking_hours, estimated_distance_km)
    };

    if actual_hiking_hours < min_hiking_hours {
        return None;
    }

    let hiking_ratio = if window.total_hours > 0.0 {
        actual_hiking_hours / window.total_hours
    } else {
        0.0
    };

    let hike_segment = HikeSegment {
        entry_stop: ap.stop_id.clone(),
        exit_stop: None,
        walk_to_trail_m: ap.walk_distance_m,
        walk_from_trail_m: ap.walk_distance_m,
        hike_start_ts: crate::time::secs_f64_to_datetime(window.hike_start_secs, date),
        hike_end_ts: crate::time::secs_f64_to_datetime(window.hike_end_secs, date),
        hiking_hours: actual_hiking_hours,
        estimated_distance_km,
        is_loop: trail.is_loop,
        is_through_hike: false,
        colors: trail.colors.clone(),
        elevation_gain_m: 0.0,
        elevation_loss_m: 0.0,
    };

    Some(HikePlan {
        trail: trail.clone(),
        entry_access_point: ap.clone(),
        exit_access_point: None,
        outbound_legs: window.outbound_legs,
        hike_segment,
        return_legs: window.return_legs,
        departure_ts: window.departure_ts,
        arrival_ts: window.arrival_ts,
        total_hours: window.total_hours,
        hiking_ratio,
        deadline: deadline_ts,
        warnings: season_warnings(trail, date),
        score: hiking_ratio,
    })
}

/// `spec.md` §4.5 "through-hike plan".
#[allow(clippy::too_many_arguments)]
fn plan_through_hike<S: ScheduleStore>(
    trail: &Arc<Trail>,
    entry_ap: &TrailAccessPoint,
    exit_ap: &TrailAccessPoint,
    segment_km: f64,
    router: &Router<S>,
    origin_stops: &[Arc<str>],
    origin_stop_set: &HashSet<Arc<str>>,
    earliest_dep_secs: u32,
    deadline_ts: NaiveDateTime,
    deadline_secs: u32,
    min_hiking_hours: f64,
    date: NaiveDate,
) -> Option<HikePlan> {
    let window = find_window(
        router,
        &entry_ap.stop_id,
        &exit_ap.stop_id,
        entry_ap.walk_distance_m,
        exit_ap.walk_distance_m,
        origin_stops,
        origin_stop_set,
        earliest_dep_secs,
        deadline_secs,
        date,
    )?;

    let (seg_gain, seg_loss) = if trail.distance_km > 0.0 {
        let frac = segment_km / trail.distance_km;
        (trail.elevation_gain_m * frac, trail.elevation_loss_m * frac)
    } else {
        (0.0, 0.0)
    };
    let required_h = naismith_hours(segment_km, seg_gain);

    let window_hours = (window.hike_end_secs - window.hike_start_secs) / 3600.0;
    if window_hours < required_h {
        return None;
    }
    let actual_hiking_hours = required_h;
    if actual_hiking_hours < min_hiking_hours {
        return None;
    }

    let hiking_ratio = if window.total_hours > 0.0 {
        actual_hiking_hours / window.total_hours
    } else {
        0.0
    };

    let hike_segment = HikeSegment {
        entry_stop: entry_ap.stop_id.clone(),
        exit_stop: Some(exit_ap.stop_id.clone()),
        walk_to_trail_m: entry_ap.walk_distance_m,
        walk_from_trail_m: exit_ap.walk_distance_m,
        hike_start_ts: crate::time::secs_f64_to_datetime(window.hike_start_secs, date),
        hike_end_ts: crate::time::secs_f64_to_datetime(window.hike_end_secs, date),
        hiking_hours: actual_hiking_hours,
        estimated_distance_km: segment_km,
        is_loop: false,
        is_through_hike: true,
        colors: trail.colors.clone(),
        elevation_gain_m: (seg_gain * 10.0).round() / 10.0,
        elevation_loss_m: (seg_loss * 10.0).round() / 10.0,
    };

    Some(HikePlan {
        trail: trail.clone(),
        entry_access_point: entry_ap.clone(),
        exit_access_point: Some(exit_ap.clone()),
        outbound_legs: window.outbound_legs,
        hike_segment,
        return_legs: window.return_legs,
        departure_ts: window.departure_ts,
        arrival_ts: window.arrival_ts,
        total_hours: window.total_hours,
        hiking_ratio,
        deadline: deadline_ts,
        warnings: season_warnings(trail, date),
        score: hiking_ratio,
    })
}

/// Up to two plans per trail: the best out-and-back/loop plan, and (for
/// non-loop trails with ≥ 2 access points) the best through-hike plan.
#[allow(clippy::too_many_arguments)]
fn plan_single_trail<S: ScheduleStore>(
    trail: &Arc<Trail>,
    router: &Router<S>,
    origin_stops: &[Arc<str>],
    origin_stop_set: &HashSet<Arc<str>>,
    earliest_dep_secs: u32,
    deadline_ts: NaiveDateTime,
    deadline_secs: u32,
    min_hiking_hours: f64,
    date: NaiveDate,
) -> Vec<HikePlan> {
    let mut results = Vec::new();

    let best_oab = trail
        .access_points
        .iter()
        .filter_map(|ap| {
            plan_access_point(
                trail,
                ap,
                router,
                origin_stops,
                origin_stop_set,
                earliest_dep_secs,
                deadline_ts,
                deadline_secs,
                min_hiking_hours,
                date,
            )
        })
        .max_by(|a, b| a.hiking_ratio.total_cmp(&b.hiking_ratio));
    if let Some(plan) = best_oab {
        results.push(plan);
    }

    if !trail.is_loop && trail.access_points.len() >= 2 {
        let mut best_through: Option<HikePlan> = None;
        for (i, entry_ap) in trail.access_points.iter().enumerate() {
            for (j, exit_ap) in trail.access_points.iter().enumerate() {
                if i == j {
                    continue;
                }
                let segment_km = (exit_ap.trail_km_from_start - entry_ap.trail_km_from_start).abs();
                if !(THROUGH_HIKE_MIN_DISTANCE_KM..=THROUGH_HIKE_MAX_DISTANCE_KM).contains(&segment_km) {
                    continue;
                }
                let Some(plan) = plan_through_hike(
                    trail,
                    entry_ap,
                    exit_ap,
                    segment_km,
                    router,
                    origin_stops,
                    origin_stop_set,
                    earliest_dep_secs,
                    deadline_ts,
                    deadline_secs,
                    min_hiking_hours,
                    date,
                ) else {
                    continue;
                };
                let better = best_through
                    .as_ref()
                    .map(|b| plan.hiking_ratio > b.hiking_ratio)
                    .unwrap_or(true);
                if better {
                    best_through = Some(plan);
                }
            }
        }
        if let Some(plan) = best_through {
            results.push(plan);
        }
    }

    results
}

fn sort_key(plan: &HikePlan, sort_by: SortKey) -> f64 {
    match sort_by {
        SortKey::HikingRatio => plan.hiking_ratio,
        SortKey::TotalHours => plan.total_hours,
    }
}

/// `spec.md` §4.5's top-level `plan_hikes(query, context)` entry point.
/// `plan_hikes_for_origin` is a pure function of `(query, context)` and may
/// be called many times against the same `Context` with different origins.
pub fn plan_hikes_for_origin<S: ScheduleStore>(
    query: &HikeQuery,
    context: &Context<S>,
) -> Result<Vec<HikePlan>> {
    query.validate_or_err()?;

    let origin_coord = resolve_origin(&query.origin)?;
    let origin_stops = context
        .spatial_index
        .stops_near(origin_coord, context.config.stop_search_radius_m);
    if origin_stops.is_empty() {
        tracing::debug!(?query.origin, "no bus stops near origin");
        return Ok(Vec::new());
    }
    let origin_stop_set: HashSet<Arc<str>> = origin_stops.iter().cloned().collect();

    let earliest_dep_secs = query
        .earliest_departure
        .unwrap_or(DEFAULT_EARLIEST_DEPARTURE_HOUR * 3600);

    let router = Router::new(&context.store, context.date, context.config);

    let mut plans: Vec<HikePlan> = context
        .trails
        .iter()
        .flat_map(|trail| {
            plan_single_trail(
                trail,
                &router,
                &origin_stops,
                &origin_stop_set,
                earliest_dep_secs,
                context.deadline,
                context.deadline_secs,
                query.min_hiking_hours,
                context.date,
            )
        })
        .collect();

    plans.sort_by(|a, b| sort_key(b, query.sort_by).total_cmp(&sort_key(a, query.sort_by)));
    plans.truncate(query.max_results);

    tracing::debug!(found = plans.len(), "planning complete for origin");
    Ok(plans)
}

/// Helper for tests and callers that never reuse a `Context` across
/// multiple difficulty values: parses a difficulty string case-insensitively.
pub fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    match raw.to_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "moderate" => Some(Difficulty::Moderate),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}
