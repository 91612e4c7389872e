//! Date-filtered schedule: the `ScheduleStore` interface and its two
//! interchangeable backends.

mod build;
mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::geo::Coordinate;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("required GTFS table missing or empty: {0}")]
    MissingTable(&'static str),
    #[error("io error building on-disk store: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error building on-disk store: {0}")]
    Codec(#[from] postcard::Error),
}

/// A single scheduled departure from a stop, part of the `departures` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Departure {
    pub dep_secs: u32,
    pub seq: u32,
}

/// A single stop visit within a trip, part of the `trip_stops` index.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TripStopEntry {
    pub stop_id: Arc<str>,
    pub arr_secs: u32,
    pub dep_secs: u32,
    pub seq: u32,
}

/// `Departure` additionally carries the trip id it belongs to; this is the
/// shape returned by `get_departures`, where `trip_id` does not repeat the
/// key the caller already looked up with.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StopDeparture {
    pub trip_id: Arc<str>,
    pub dep_secs: u32,
    pub seq: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RouteInfo {
    pub route_id: Arc<str>,
    pub short_name: Arc<str>,
    pub agency_name: Arc<str>,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct StopSummary {
    pub index: u32,
    pub coordinate: Coordinate,
}

/// The interface the router is generic over. Both backends implement it;
/// unknown ids return `None` rather than failing — lookups never raise.
pub trait ScheduleStore {
    fn get_departures(&self, stop_id: &str) -> Option<Arc<[StopDeparture]>>;
    fn get_trip_stops(&self, trip_id: &str) -> Option<Arc<[TripStopEntry]>>;
    fn get_stop_name(&self, stop_id: &str) -> Option<Arc<str>>;
    fn get_trip_route(&self, trip_id: &str) -> Option<Arc<str>>;
    fn get_route_info(&self, route_id: &str) -> Option<RouteInfo>;
    fn stop_coordinate(&self, stop_id: &str) -> Option<Coordinate>;
    /// All stops known to the store, for spatial join and origin search.
    fn stop_ids(&self) -> &[Arc<str>];
}
