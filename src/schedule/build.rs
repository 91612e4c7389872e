//! Date filtering and index construction shared by both `ScheduleStore`
//! backends: drop inactive trips/stop_times for the query date, then build
//! the `departures` and `trip_stops` indexes plus the small presentation
//! lookups, sorted exactly per `spec.md` §3.

use super::{Departure, RouteInfo, StopDeparture, StopSummary, TripStopEntry};
use crate::geo::Coordinate;
use crate::gtfs::GtfsFeed;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The date-filtered, index-built schedule, independent of storage backend.
/// `MemoryStore` keeps this as-is; `DiskStore` serializes it to a single
/// file and rehydrates slices on demand.
pub struct BuiltSchedule {
    pub departures: HashMap<Arc<str>, Vec<StopDeparture>>,
    pub trip_stops: HashMap<Arc<str>, Vec<TripStopEntry>>,
    pub stop_name: HashMap<Arc<str>, Arc<str>>,
    pub trip_route: HashMap<Arc<str>, Arc<str>>,
    pub route_info: HashMap<Arc<str>, RouteInfo>,
    pub stops: HashMap<Arc<str>, StopSummary>,
    pub stop_ids: Vec<Arc<str>>,
}

/// Filters `feed` to the services active on `date` and builds every index
/// `spec.md` §3 requires. Grounded on
/// `original_source/src/ingest/gtfs.py::get_active_service_ids` for the
/// filtering rule and `src/query/transit_router.py::TransitRouter.__init__`
/// for the index shapes (sorted `stop_departures`/`trip_stop_sequence`).
pub fn build(feed: &GtfsFeed, date: NaiveDate) -> Result<BuiltSchedule, super::Error> {
    if feed.stops.is_empty() {
        return Err(super::Error::MissingTable("stops"));
    }
    if feed.trips.is_empty() {
        return Err(super::Error::MissingTable("trips"));
    }
    if feed.stop_times.is_empty() {
        return Err(super::Error::MissingTable("stop_times"));
    }

    let active_services = crate::gtfs::active_service_ids(&feed.calendar, &feed.calendar_dates, date);

    let active_trips: HashSet<Arc<str>> = feed
        .trips
        .iter()
        .filter(|t| active_services.contains(t.service_id.as_str()))
        .map(|t| Arc::<str>::from(t.trip_id.as_str()))
        .collect();

    let trip_route: HashMap<Arc<str>, Arc<str>> = feed
        .trips
        .iter()
        .filter(|t| active_trips.contains(t.trip_id.as_str()))
        .map(|t| (Arc::<str>::from(t.trip_id.as_str()), Arc::<str>::from(t.route_id.as_str())))
        .collect();

    let agency_name: HashMap<Option<&str>, &str> = feed
        .agencies
        .iter()
        .map(|a| (a.agency_id.as_deref(), a.agency_name.as_str()))
        .collect();
    // Feeds with a single agency often omit agency_id on the route row;
    // fall back to the lone agency in that case.
    let sole_agency = (feed.agencies.len() == 1)
        .then(|| feed.agencies[0].agency_name.as_str());

    let route_info: HashMap<Arc<str>, RouteInfo> = feed
        .routes
        .iter()
        .map(|r| {
            let agency = agency_name
                .get(&r.agency_id.as_deref())
                .copied()
                .or(sole_agency)
                .unwrap_or("");
            (
                Arc::<str>::from(r.route_id.as_str()),
                RouteInfo {
                    route_id: r.route_id.as_str().into(),
                    short_name: r
                        .route_short_name
                        .clone()
                        .or_else(|| r.route_long_name.clone())
                        .unwrap_or_default()
                        .into(),
                    agency_name: agency.into(),
                },
            )
        })
        .collect();

    let mut departures: HashMap<Arc<str>, Vec<StopDeparture>> = HashMap::new();
    let mut trip_stops: HashMap<Arc<str>, Vec<TripStopEntry>> = HashMap::new();

    for st in &feed.stop_times {
        if !active_trips.contains(st.trip_id.as_str()) {
            continue;
        }
        let trip_id: Arc<str> = st.trip_id.as_str().into();
        let stop_id: Arc<str> = st.stop_id.as_str().into();
        let Some(arr_secs) = crate::time::Secs::from_hms(&st.arrival_time) else {
            continue;
        };
        let Some(dep_secs) = crate::time::Secs::from_hms(&st.departure_time) else {
            continue;
        };

        departures.entry(stop_id.clone()).or_default().push(StopDeparture {
            trip_id: trip_id.clone(),
            dep_secs: dep_secs.0,
            seq: st.stop_sequence,
        });
        trip_stops.entry(trip_id).or_default().push(TripStopEntry {
            stop_id,
            arr_secs: arr_secs.0,
            dep_secs: dep_secs.0,
            seq: st.stop_sequence,
        });
    }

    // Each stop's/trip's slice sorts independently, so the per-key work
    // fans out across threads the same way the ingestion side of the
    // reference stack parallelises its own per-trip/per-stop sorts.
    departures
        .values_mut()
        .collect::<Vec<_>>()
        .into_par_iter()
        .for_each(|v| v.par_sort_by_key(|d| d.dep_secs));
    trip_stops
        .values_mut()
        .collect::<Vec<_>>()
        .into_par_iter()
        .for_each(|v| v.par_sort_by_key(|s| s.seq));

    let stop_name: HashMap<Arc<str>, Arc<str>> = feed
        .stops
        .iter()
        .map(|s| (Arc::<str>::from(s.stop_id.as_str()), Arc::<str>::from(s.stop_name.as_str())))
        .collect();

    let stops: HashMap<Arc<str>, StopSummary> = feed
        .stops
        .iter()
        .enumerate()
        .map(|(i, s)| {
            (
                Arc::<str>::from(s.stop_id.as_str()),
                StopSummary {
                    index: i as u32,
                    coordinate: Coordinate::new(s.stop_lat, s.stop_lon),
                },
            )
        })
        .collect();
    let stop_ids: Vec<Arc<str>> = feed.stops.iter().map(|s| Arc::<str>::from(s.stop_id.as_str())).collect();

    Ok(BuiltSchedule {
        departures,
        trip_stops,
        stop_name,
        trip_route,
        route_info,
        stops,
        stop_ids,
    })
}

/// Also exposed from `Departure` for backends that want the bare
/// `(dep_secs, seq)` pair without the repeated `trip_id`.
impl From<&StopDeparture> for Departure {
    fn from(d: &StopDeparture) -> Self {
        Departure { dep_secs: d.dep_secs, seq: d.seq }
    }
}
