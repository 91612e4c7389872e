//! Pure data records shared by every component.

use crate::geo::Coordinate;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Stop,
    Station,
    Entrance,
    Node,
    Boarding,
    Platform,
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub stop_id: Arc<str>,
    pub stop_name: Arc<str>,
    pub lat: f64,
    pub lon: f64,
    pub location_type: LocationType,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub route_id: Arc<str>,
    pub short_name: Arc<str>,
    pub agency_name: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct Trip {
    pub trip_id: Arc<str>,
    pub route_id: Arc<str>,
}

#[derive(Debug, Clone, Copy)]
pub struct StopTime {
    pub stop_sequence: u32,
    pub arr_secs: u32,
    pub dep_secs: u32,
}

/// A walk-accessible transit stop paired with its projection onto a trail.
#[derive(Debug, Clone)]
pub struct TrailAccessPoint {
    pub stop_id: Arc<str>,
    pub stop_name: Arc<str>,
    pub walk_distance_m: f64,
    pub entry_lat: f64,
    pub entry_lon: f64,
    pub trail_km_from_start: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

#[derive(Debug, Clone)]
pub struct Trail {
    pub id: Arc<str>,
    pub name: Arc<str>,
    /// Provenance tag for this record, e.g. `"osm"`.
    pub source: Arc<str>,
    pub polyline: Vec<Coordinate>,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub min_elev_m: Option<f64>,
    pub max_elev_m: Option<f64>,
    pub elevation_profile: Vec<f64>,
    pub difficulty: Option<Difficulty>,
    pub colors: Vec<Arc<str>>,
    pub is_loop: bool,
    pub recommended_seasons: Vec<Arc<str>>,
    pub season_warnings: Vec<Arc<str>>,
    pub access_points: Vec<TrailAccessPoint>,
}

impl Trail {
    /// `is_loop` iff the great-circle distance between the first and last
    /// vertex is under 100 m.
    pub fn compute_is_loop(polyline: &[Coordinate]) -> bool {
        match (polyline.first(), polyline.last()) {
            (Some(a), Some(b)) => crate::geo::haversine_coord(*a, *b) < 100.0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BusLeg {
    pub line: Arc<str>,
    pub operator: Arc<str>,
    pub from_stop: Arc<str>,
    pub to_stop: Arc<str>,
    pub departure_ts: NaiveDateTime,
    pub arrival_ts: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct HikeSegment {
    pub entry_stop: Arc<str>,
    pub exit_stop: Option<Arc<str>>,
    pub walk_to_trail_m: f64,
    pub walk_from_trail_m: f64,
    pub hike_start_ts: NaiveDateTime,
    pub hike_end_ts: NaiveDateTime,
    pub hiking_hours: f64,
    pub estimated_distance_km: f64,
    pub is_loop: bool,
    pub is_through_hike: bool,
    pub colors: Vec<Arc<str>>,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
}

#[derive(Debug, Clone)]
pub struct HikePlan {
    pub trail: Arc<Trail>,
    pub entry_access_point: TrailAccessPoint,
    pub exit_access_point: Option<TrailAccessPoint>,
    pub outbound_legs: Vec<BusLeg>,
    pub hike_segment: HikeSegment,
    pub return_legs: Vec<BusLeg>,
    pub departure_ts: NaiveDateTime,
    pub arrival_ts: NaiveDateTime,
    pub total_hours: f64,
    pub hiking_ratio: f64,
    pub deadline: NaiveDateTime,
    pub warnings: Vec<Arc<str>>,
    /// Presentation-layer score. Equal to `hiking_ratio` at construction;
    /// kept as a distinct field because formatting code addresses it by
    /// this name.
    pub score: f64,
}

/// Which field the final ranking sorts on. `HikingRatio` is the default and
/// reproduces the ranking rule: stable sort descending, ties broken by
/// computation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    HikingRatio,
    TotalHours,
}

/// Either a known city name or a literal coordinate.
#[derive(Debug, Clone)]
pub enum Origin {
    City(String),
    Coordinate(f64, f64),
}

impl std::str::FromStr for Origin {
    type Err = std::convert::Infallible;

    /// `"lat,lon"` parses as a literal coordinate; anything else is taken as
    /// a city name, resolved later by `planner::resolve_origin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(coord) = s.parse::<crate::geo::Coordinate>() {
            return Ok(Origin::Coordinate(coord.lat, coord.lon));
        }
        Ok(Origin::City(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct HikeQuery {
    pub origin: Origin,
    pub date: NaiveDate,
    pub max_transfers: u8,
    pub safety_margin_hours: f64,
    pub max_walk_to_trail_m: f64,
    pub min_hiking_hours: f64,
    pub max_results: usize,
    pub earliest_departure: Option<u32>,
    pub colors: Option<Vec<String>>,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub loop_only: bool,
    pub linear_only: bool,
    pub max_elevation_gain_m: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub sort_by: SortKey,
}

impl HikeQuery {
    pub fn validate(&self) -> Result<(), String> {
        if self.loop_only && self.linear_only {
            return Err("loop_only and linear_only are mutually exclusive".into());
        }
        Ok(())
    }
}
