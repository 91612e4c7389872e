//! On-disk `ScheduleStore` backend: the persisted single-file format of
//! `spec.md` §6, with per-stop/per-trip slices deserialized on demand into a
//! bounded cache that is cleared wholesale on overflow — the
//! "low-code, low-memory" policy of `spec.md` §9.

use super::{RouteInfo, ScheduleStore, StopDeparture, StopSummary, TripStopEntry, build::BuiltSchedule};
use crate::config::DISK_STORE_CACHE_CAP;
use crate::geo::Coordinate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Scalar tables plus the byte-offset indexes into the data section that
/// follows the header in the persisted file. This is the "two secondary
/// index tables `(stop_id, departure_secs)` and `(trip_id, stop_sequence)`"
/// of `spec.md` §6, restated as offset/length pairs rather than a SQL
/// index, since the data itself is pre-sorted at build time.
#[derive(Serialize, Deserialize)]
struct Header {
    stop_name: HashMap<Arc<str>, Arc<str>>,
    trip_route: HashMap<Arc<str>, Arc<str>>,
    route_info: HashMap<Arc<str>, RouteInfo>,
    stops: HashMap<Arc<str>, StopSummary>,
    stop_ids: Vec<Arc<str>>,
    departures_index: HashMap<Arc<str>, (u64, u32)>,
    trip_stops_index: HashMap<Arc<str>, (u64, u32)>,
}

pub struct DiskStore {
    header: Header,
    file: RefCell<File>,
    data_offset: u64,
    departures_cache: RefCell<HashMap<Arc<str>, Arc<[StopDeparture]>>>,
    trip_stops_cache: RefCell<HashMap<Arc<str>, Arc<[TripStopEntry]>>>,
}

impl DiskStore {
    /// Builds a date-specific store from in-memory GTFS tables and persists
    /// it to `path`, writing through a temp file and an atomic rename so a
    /// reader never observes a partially written store (`spec.md` §5).
    pub fn build<P: AsRef<Path>>(
        feed: &crate::gtfs::GtfsFeed,
        date: NaiveDate,
        path: P,
    ) -> Result<Self, super::Error> {
        let built = super::build::build(feed, date)?;
        Self::write(built, path.as_ref())?;
        Self::open(path)
    }

    fn write(built: BuiltSchedule, path: &Path) -> Result<(), super::Error> {
        let mut blob = Vec::new();
        let mut departures_index = HashMap::new();
        for (stop_id, deps) in &built.departures {
            let bytes = postcard::to_allocvec(deps)?;
            departures_index.insert(stop_id.clone(), (blob.len() as u64, bytes.len() as u32));
            blob.extend_from_slice(&bytes);
        }
        let mut trip_stops_index = HashMap::new();
        for (trip_id, stops) in &built.trip_stops {
            let bytes = postcard::to_allocvec(stops)?;
            trip_stops_index.insert(trip_id.clone(), (blob.len() as u64, bytes.len() as u32));
            blob.extend_from_slice(&bytes);
        }

        let header = Header {
            stop_name: built.stop_name,
            trip_route: built.trip_route,
            route_info: built.route_info,
            stops: built.stops,
            stop_ids: built.stop_ids,
            departures_index,
            trip_stops_index,
        };
        let header_bytes = postcard::to_allocvec(&header)?;

        let tmp_path: PathBuf = path.with_extension("tmp");
        {
            let mut f = File::create(&tmp_path)?;
            f.write_all(&(header_bytes.len() as u64).to_le_bytes())?;
            f.write_all(&header_bytes)?;
            f.write_all(&blob)?;
            f.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Opens an already-persisted store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, super::Error> {
        let mut file = File::open(path.as_ref())?;
        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let header_len = u64::from_le_bytes(len_bytes) as usize;
        let mut header_bytes = vec![0u8; header_len];
        file.read_exact(&mut header_bytes)?;
        let header: Header = postcard::from_bytes(&header_bytes)?;
        let data_offset = 8 + header_len as u64;

        Ok(Self {
            header,
            file: RefCell::new(file),
            data_offset,
            departures_cache: RefCell::new(HashMap::new()),
            trip_stops_cache: RefCell::new(HashMap::new()),
        })
    }

    fn read_blob(&self, offset: u64, len: u32) -> Result<Vec<u8>, std::io::Error> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(self.data_offset + offset))?;
        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl ScheduleStore for DiskStore {
    fn get_departures(&self, stop_id: &str) -> Option<Arc<[StopDeparture]>> {
        if let Some(cached) = self.departures_cache.borrow().get(stop_id) {
            return Some(cached.clone());
        }
        let (offset, len) = *self.header.departures_index.get(stop_id)?;
        let bytes = self.read_blob(offset, len).ok()?;
        let rows: Vec<StopDeparture> = postcard::from_bytes(&bytes).ok()?;
        let rows: Arc<[StopDeparture]> = rows.into();

        let mut cache = self.departures_cache.borrow_mut();
        if cache.len() >= DISK_STORE_CACHE_CAP {
            cache.clear();
        }
        cache.insert(stop_id.into(), rows.clone());
        Some(rows)
    }

    fn get_trip_stops(&self, trip_id: &str) -> Option<Arc<[TripStopEntry]>> {
        if let Some(cached) = self.trip_stops_cache.borrow().get(trip_id) {
            return Some(cached.clone());
        }
        let (offset, len) = *self.header.trip_stops_index.get(trip_id)?;
        let bytes = self.read_blob(offset, len).ok()?;
        let rows: Vec<TripStopEntry> = postcard::from_bytes(&bytes).ok()?;
        let rows: Arc<[TripStopEntry]> = rows.into();

        let mut cache = self.trip_stops_cache.borrow_mut();
        if cache.len() >= DISK_STORE_CACHE_CAP {
            cache.clear();
        }
        cache.insert(trip_id.into(), rows.clone());
        Some(rows)
    }

    fn get_stop_name(&self, stop_id: &str) -> Option<Arc<str>> {
        self.header.stop_name.get(stop_id).cloned()
    }

    fn get_trip_route(&self, trip_id: &str) -> Option<Arc<str>> {
        self.header.trip_route.get(trip_id).cloned()
    }

    fn get_route_info(&self, route_id: &str) -> Option<RouteInfo> {
        self.header.route_info.get(route_id).cloned()
    }

    fn stop_coordinate(&self, stop_id: &str) -> Option<Coordinate> {
        self.header.stops.get(stop_id).map(|s| s.coordinate)
    }

    fn stop_ids(&self) -> &[Arc<str>] {
        &self.header.stop_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::GtfsFeed;
    use crate::gtfs::models::*;

    fn sample_feed() -> GtfsFeed {
        GtfsFeed {
            stops: vec![GtfsStop {
                stop_id: "A".into(),
                stop_name: "Stop A".into(),
                stop_lat: 31.80,
                stop_lon: 34.80,
                location_type: None,
                parent_station: None,
            }],
            agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
            routes: vec![GtfsRoute {
                route_id: "R1".into(),
                agency_id: None,
                route_short_name: Some("1".into()),
                route_long_name: None,
                route_type: 3,
            }],
            trips: vec![GtfsTrip {
                route_id: "R1".into(),
                service_id: "WK".into(),
                trip_id: "T1".into(),
            }],
            stop_times: vec![GtfsStopTime {
                trip_id: "T1".into(),
                arrival_time: "07:00:00".into(),
                departure_time: "07:00:00".into(),
                stop_id: "A".into(),
                stop_sequence: 1,
            }],
            calendar: vec![GtfsCalendar {
                service_id: "WK".into(),
                monday: 1,
                tuesday: 1,
                wednesday: 1,
                thursday: 1,
                friday: 1,
                saturday: 0,
                sunday: 0,
                start_date: "20260101".into(),
                end_date: "20261231".into(),
            }],
            calendar_dates: vec![],
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("trailbus-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("schedule.bin");
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let store = DiskStore::build(&sample_feed(), date, &path).unwrap();
        let deps = store.get_departures("A").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].trip_id.as_ref(), "T1");
        assert!(store.get_departures("missing").is_none());
        fs::remove_file(&path).ok();
        fs::remove_dir(&dir).ok();
    }
}
