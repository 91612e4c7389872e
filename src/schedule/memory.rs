//! In-memory `ScheduleStore` backend: sorted vectors behind `Arc<str>` keys,
//! trivially `Send + Sync` for concurrent reads, per `spec.md` §5.

use super::{RouteInfo, ScheduleStore, StopDeparture, TripStopEntry, build::BuiltSchedule};
use crate::geo::Coordinate;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct MemoryStore {
    departures: HashMap<Arc<str>, Arc<[StopDeparture]>>,
    trip_stops: HashMap<Arc<str>, Arc<[TripStopEntry]>>,
    stop_name: HashMap<Arc<str>, Arc<str>>,
    trip_route: HashMap<Arc<str>, Arc<str>>,
    route_info: HashMap<Arc<str>, RouteInfo>,
    stop_coordinate: HashMap<Arc<str>, Coordinate>,
    stop_ids: Vec<Arc<str>>,
}

impl MemoryStore {
    /// Builds a date-specific store directly from in-memory GTFS tables.
    pub fn build(feed: &crate::gtfs::GtfsFeed, date: NaiveDate) -> Result<Self, super::Error> {
        let built = super::build::build(feed, date)?;
        Ok(Self::from_built(built))
    }

    fn from_built(built: BuiltSchedule) -> Self {
        let stop_coordinate = built
            .stops
            .iter()
            .map(|(id, s)| (id.clone(), s.coordinate))
            .collect();
        Self {
            departures: built
                .departures
                .into_iter()
                .map(|(k, v)| (k, Arc::<[StopDeparture]>::from(v)))
                .collect(),
            trip_stops: built
                .trip_stops
                .into_iter()
                .map(|(k, v)| (k, Arc::<[TripStopEntry]>::from(v)))
                .collect(),
            stop_name: built.stop_name,
            trip_route: built.trip_route,
            route_info: built.route_info,
            stop_coordinate,
            stop_ids: built.stop_ids,
        }
    }
}

impl ScheduleStore for MemoryStore {
    fn get_departures(&self, stop_id: &str) -> Option<Arc<[StopDeparture]>> {
        self.departures.get(stop_id).cloned()
    }

    fn get_trip_stops(&self, trip_id: &str) -> Option<Arc<[TripStopEntry]>> {
        self.trip_stops.get(trip_id).cloned()
    }

    fn get_stop_name(&self, stop_id: &str) -> Option<Arc<str>> {
        self.stop_name.get(stop_id).cloned()
    }

    fn get_trip_route(&self, trip_id: &str) -> Option<Arc<str>> {
        self.trip_route.get(trip_id).cloned()
    }

    fn get_route_info(&self, route_id: &str) -> Option<RouteInfo> {
        self.route_info.get(route_id).cloned()
    }

    fn stop_coordinate(&self, stop_id: &str) -> Option<Coordinate> {
        self.stop_coordinate.get(stop_id).copied()
    }

    fn stop_ids(&self) -> &[Arc<str>] {
        &self.stop_ids
    }
}
