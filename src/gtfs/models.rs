//! Raw row shapes for the GTFS tables this crate reads. One type per table,
//! deserialized once at ingestion; `deny_unknown_fields` so a malformed feed
//! fails fast instead of silently dropping columns.

use crate::models::{LocationType, Route};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub location_type: Option<u8>,
    pub parent_station: Option<String>,
}

impl GtfsStop {
    pub fn location_type(&self) -> LocationType {
        match self.location_type {
            Some(1) => LocationType::Station,
            Some(2) => LocationType::Entrance,
            Some(3) => LocationType::Node,
            Some(4) => LocationType::Boarding,
            _ if self.parent_station.is_some() => LocationType::Platform,
            _ => LocationType::Stop,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsAgency {
    pub agency_id: Option<String>,
    pub agency_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsRoute {
    pub route_id: String,
    pub agency_id: Option<String>,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i32,
}

impl GtfsRoute {
    pub fn into_route(self, agency_name: &str) -> Route {
        Route {
            route_id: self.route_id.into(),
            short_name: self
                .route_short_name
                .or(self.route_long_name)
                .unwrap_or_default()
                .into(),
            agency_name: agency_name.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsCalendarDate {
    pub service_id: String,
    pub date: String,
    pub exception_type: u8,
}
