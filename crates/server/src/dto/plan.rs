//! Projects `trailbus`'s `HikePlan` tree to JSON. This is the "thin HTTP
//! façade that projects the core's plan objects to JSON" `spec.md` §1 calls
//! out of scope for the core crate — implemented here, one level up.

use chrono::NaiveDateTime;
use serde::Serialize;
use trailbus::models::{BusLeg, HikePlan, HikeSegment, TrailAccessPoint};

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct BusLegDto {
    pub line: String,
    pub operator: String,
    pub from_stop: String,
    pub to_stop: String,
    pub departure_ts: String,
    pub arrival_ts: String,
}

impl From<&BusLeg> for BusLegDto {
    fn from(leg: &BusLeg) -> Self {
        Self {
            line: leg.line.to_string(),
            operator: leg.operator.to_string(),
            from_stop: leg.from_stop.to_string(),
            to_stop: leg.to_stop.to_string(),
            departure_ts: fmt_ts(leg.departure_ts),
            arrival_ts: fmt_ts(leg.arrival_ts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessPointDto {
    pub stop_id: String,
    pub stop_name: String,
    pub walk_distance_m: f64,
    pub entry_lat: f64,
    pub entry_lon: f64,
    pub trail_km_from_start: f64,
}

impl From<&TrailAccessPoint> for AccessPointDto {
    fn from(ap: &TrailAccessPoint) -> Self {
        Self {
            stop_id: ap.stop_id.to_string(),
            stop_name: ap.stop_name.to_string(),
            walk_distance_m: ap.walk_distance_m,
            entry_lat: ap.entry_lat,
            entry_lon: ap.entry_lon,
            trail_km_from_start: ap.trail_km_from_start,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HikeSegmentDto {
    pub entry_stop: String,
    pub exit_stop: Option<String>,
    pub walk_to_trail_m: f64,
    pub walk_from_trail_m: f64,
    pub hike_start_ts: String,
    pub hike_end_ts: String,
    pub hiking_hours: f64,
    pub estimated_distance_km: f64,
    pub is_loop: bool,
    pub is_through_hike: bool,
    pub colors: Vec<String>,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
}

impl From<&HikeSegment> for HikeSegmentDto {
    fn from(seg: &HikeSegment) -> Self {
        Self {
            entry_stop: seg.entry_stop.to_string(),
            exit_stop: seg.exit_stop.as_ref().map(|s| s.to_string()),
            walk_to_trail_m: seg.walk_to_trail_m,
            walk_from_trail_m: seg.walk_from_trail_m,
            hike_start_ts: fmt_ts(seg.hike_start_ts),
            hike_end_ts: fmt_ts(seg.hike_end_ts),
            hiking_hours: seg.hiking_hours,
            estimated_distance_km: seg.estimated_distance_km,
            is_loop: seg.is_loop,
            is_through_hike: seg.is_through_hike,
            colors: seg.colors.iter().map(|c| c.to_string()).collect(),
            elevation_gain_m: seg.elevation_gain_m,
            elevation_loss_m: seg.elevation_loss_m,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HikePlanDto {
    pub trail_id: String,
    pub trail_name: String,
    pub distance_km: f64,
    pub is_loop: bool,
    pub entry_access_point: AccessPointDto,
    pub exit_access_point: Option<AccessPointDto>,
    pub outbound_legs: Vec<BusLegDto>,
    pub hike_segment: HikeSegmentDto,
    pub return_legs: Vec<BusLegDto>,
    pub departure_ts: String,
    pub arrival_ts: String,
    pub total_hours: f64,
    pub hiking_ratio: f64,
    pub deadline: String,
    pub warnings: Vec<String>,
    pub score: f64,
}

impl From<&HikePlan> for HikePlanDto {
    fn from(plan: &HikePlan) -> Self {
        Self {
            trail_id: plan.trail.id.to_string(),
            trail_name: plan.trail.name.to_string(),
            distance_km: plan.trail.distance_km,
            is_loop: plan.trail.is_loop,
            entry_access_point: (&plan.entry_access_point).into(),
            exit_access_point: plan.exit_access_point.as_ref().map(Into::into),
            outbound_legs: plan.outbound_legs.iter().map(Into::into).collect(),
            hike_segment: (&plan.hike_segment).into(),
            return_legs: plan.return_legs.iter().map(Into::into).collect(),
            departure_ts: fmt_ts(plan.departure_ts),
            arrival_ts: fmt_ts(plan.arrival_ts),
            total_hours: plan.total_hours,
            hiking_ratio: plan.hiking_ratio,
            deadline: fmt_ts(plan.deadline),
            warnings: plan.warnings.iter().map(|w| w.to_string()).collect(),
            score: plan.score,
        }
    }
}
