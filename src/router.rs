//! Earliest-arrival (outbound) and latest-departure (return) search with at
//! most one transfer, under the pruning budgets of `spec.md` §4.3/§6.
//!
//! Grounded directly on `original_source/src/query/transit_router.py`'s
//! `find_outbound`/`find_return`: bisect the sorted `departures` index for
//! the first candidate, scan forward (outbound) or backward (return),
//! apply the "can't improve past `best`" early-terminate, and open at most
//! one connecting leg per intermediate stop. This is deliberately not a
//! general multi-round shortest-path search (`spec.md` §1 Non-goals, §9
//! "why ≤ 1 transfer") — the control flow below is the original's, not the
//! reference repo's RAPTOR machinery.

use crate::config::Config;
use crate::models::BusLeg;
use crate::schedule::ScheduleStore;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

/// One scheduled visit used while assembling a leg: `(trip_id, stop_id,
/// dep_or_arr_secs, stop_id, secs)` raw tuples, turned into `BusLeg`s only
/// once a full itinerary is confirmed.
struct RawLeg {
    trip_id: Arc<str>,
    from_stop: Arc<str>,
    from_secs: u32,
    to_stop: Arc<str>,
    to_secs: u32,
}

/// Borrows the store read-only; never owns it, matching `spec.md` §9's
/// "Cyclic references" note (`Store` never references the router back).
pub struct Router<'a, S: ScheduleStore> {
    store: &'a S,
    config: Config,
    date: NaiveDate,
}

impl<'a, S: ScheduleStore> Router<'a, S> {
    pub fn new(store: &'a S, date: NaiveDate, config: Config) -> Self {
        Self { store, config, date }
    }

    fn make_leg(&self, raw: &RawLeg) -> BusLeg {
        let route_id = self.store.get_trip_route(&raw.trip_id);
        let route_info = route_id.as_deref().and_then(|r| self.store.get_route_info(r));
        let (line, operator) = match route_info {
            Some(info) => (info.short_name, info.agency_name),
            None => (Arc::<str>::from(""), Arc::<str>::from("")),
        };
        BusLeg {
            line,
            operator,
            from_stop: raw.from_stop.clone(),
            to_stop: raw.to_stop.clone(),
            departure_ts: crate::time::Secs(raw.from_secs).to_datetime(self.date),
            arrival_ts: crate::time::Secs(raw.to_secs).to_datetime(self.date),
        }
    }

    fn to_legs(&self, raw: Vec<RawLeg>) -> Vec<BusLeg> {
        raw.iter().map(|r| self.make_leg(r)).collect()
    }

    /// §4.3.1: earliest-arrival outbound search, zero or one transfer.
    pub fn find_outbound(
        &self,
        origin_stops: &[Arc<str>],
        dest_stops: &HashSet<Arc<str>>,
        earliest_dep_secs: u32,
    ) -> Option<Vec<BusLeg>> {
        let mut best_arrival = u32::MAX;
        let mut best: Option<Vec<RawLeg>> = None;

        // Phase 1: direct.
        for origin in origin_stops {
            let Some(deps) = self.store.get_departures(origin) else { continue };
            let idx = deps.partition_point(|d| d.dep_secs < earliest_dep_secs);
            for dep in &deps[idx..] {
                if dep.dep_secs >= best_arrival {
                    break;
                }
                let Some(trip_stops) = self.store.get_trip_stops(&dep.trip_id) else { continue };
                for hop in trip_stops.iter().filter(|h| h.seq > dep.seq) {
                    if dest_stops.contains(&hop.stop_id) && hop.arr_secs < best_arrival {
                        best_arrival = hop.arr_secs;
                        best = Some(vec![RawLeg {
                            trip_id: dep.trip_id.clone(),
                            from_stop: origin.clone(),
                            from_secs: dep.dep_secs,
                            to_stop: hop.stop_id.clone(),
                            to_secs: hop.arr_secs,
                        }]);
                        break;
                    }
                }
            }
        }

        // Phase 2: one transfer.
        for origin in origin_stops {
            let Some(deps) = self.store.get_departures(origin) else { continue };
            let idx = deps.partition_point(|d| d.dep_secs < earliest_dep_secs);
            for dep in &deps[idx..] {
                if dep.dep_secs >= best_arrival {
                    break;
                }
                let Some(trip_stops) = self.store.get_trip_stops(&dep.trip_id) else { continue };

                let mut intermediates_checked = 0usize;
                for hop in trip_stops.iter().filter(|h| h.seq > dep.seq) {
                    if dest_stops.contains(&hop.stop_id) {
                        // Already handled (or would be) in phase 1.
                        break;
                    }
                    intermediates_checked += 1;
                    if intermediates_checked > self.config.max_intermediate_stops {
                        break;
                    }
                    if hop.arr_secs >= best_arrival {
                        break;
                    }

                    let Some(conn_deps) = self.store.get_departures(&hop.stop_id) else { continue };
                    let transfer_ready = hop.arr_secs.saturating_add(self.config.min_transfer_secs);
                    let conn_idx = conn_deps.partition_point(|d| d.dep_secs < transfer_ready);

                    let mut connections_checked = 0usize;
                    for conn in &conn_deps[conn_idx..] {
                        if conn.dep_secs >= best_arrival {
                            break;
                        }
                        if conn.trip_id == dep.trip_id {
                            continue;
                        }
                        connections_checked += 1;
                        if connections_checked > self.config.max_connecting_departures {
                            break;
                        }
                        let Some(conn_stops) = self.store.get_trip_stops(&conn.trip_id) else { continue };
                        for chop in conn_stops.iter().filter(|h| h.seq > conn.seq) {
                            if dest_stops.contains(&chop.stop_id) && chop.arr_secs < best_arrival {
                                best_arrival = chop.arr_secs;
                                best = Some(vec![
                                    RawLeg {
                                        trip_id: dep.trip_id.clone(),
                                        from_stop: origin.clone(),
                                        from_secs: dep.dep_secs,
                                        to_stop: hop.stop_id.clone(),
                                        to_secs: hop.arr_secs,
                                    },
                                    RawLeg {
                                        trip_id: conn.trip_id.clone(),
                                        from_stop: hop.stop_id.clone(),
                                        from_secs: conn.dep_secs,
                                        to_stop: chop.stop_id.clone(),
                                        to_secs: chop.arr_secs,
                                    },
                                ]);
                                break;
                            }
                        }
                    }
                }
            }
        }

        best.map(|raw| self.to_legs(raw))
    }

    /// §4.3.2: latest-departure return search, zero or one transfer.
    pub fn find_return(
        &self,
        trail_stops: &[Arc<str>],
        origin_stops: &HashSet<Arc<str>>,
        deadline_secs: u32,
    ) -> Option<Vec<BusLeg>> {
        let mut best_dep: i64 = -1;
        let mut best: Option<Vec<RawLeg>> = None;

        // Phase 1: direct.
        for trail_stop in trail_stops {
            let Some(deps) = self.store.get_departures(trail_stop) else { continue };
            let mut checked = 0usize;
            for dep in deps.iter().rev() {
                if dep.dep_secs > deadline_secs {
                    continue;
                }
                if (dep.dep_secs as i64) <= best_dep {
                    break;
                }
                checked += 1;
                if checked > self.config.max_return_departures {
                    break;
                }
                let Some(trip_stops) = self.store.get_trip_stops(&dep.trip_id) else { continue };
                for hop in trip_stops.iter().filter(|h| h.seq > dep.seq) {
                    if origin_stops.contains(&hop.stop_id) && hop.arr_secs <= deadline_secs {
                        if dep.dep_secs as i64 > best_dep {
                            best_dep = dep.dep_secs as i64;
                            best = Some(vec![RawLeg {
                                trip_id: dep.trip_id.clone(),
                                from_stop: trail_stop.clone(),
                                from_secs: dep.dep_secs,
                                to_stop: hop.stop_id.clone(),
                                to_secs: hop.arr_secs,
                            }]);
                        }
                        break;
                    }
                }
            }
        }

        // Phase 2: one transfer.
        for trail_stop in trail_stops {
            let Some(deps) = self.store.get_departures(trail_stop) else { continue };
            let mut checked = 0usize;
            for dep in deps.iter().rev() {
                if dep.dep_secs > deadline_secs {
                    continue;
                }
                if (dep.dep_secs as i64) <= best_dep {
                    break;
                }
                checked += 1;
                if checked > self.config.max_return_departures {
                    break;
                }
                let Some(trip_stops) = self.store.get_trip_stops(&dep.trip_id) else { continue };

                let mut intermediates_checked = 0usize;
                for hop in trip_stops.iter().filter(|h| h.seq > dep.seq) {
                    if origin_stops.contains(&hop.stop_id) {
                        break;
                    }
                    intermediates_checked += 1;
                    if intermediates_checked > self.config.max_intermediate_stops {
                        break;
                    }
                    if hop.arr_secs > deadline_secs {
                        break;
                    }

                    let Some(conn_deps) = self.store.get_departures(&hop.stop_id) else { continue };
                    let transfer_ready = hop.arr_secs.saturating_add(self.config.min_transfer_secs);
                    let conn_idx = conn_deps.partition_point(|d| d.dep_secs < transfer_ready);

                    let mut connections_checked = 0usize;
                    for conn in &conn_deps[conn_idx..] {
                        if conn.dep_secs > deadline_secs {
                            break;
                        }
                        if conn.trip_id == dep.trip_id {
                            continue;
                        }
                        connections_checked += 1;
                        if connections_checked > self.config.max_connecting_departures {
                            break;
                        }
                        let Some(conn_stops) = self.store.get_trip_stops(&conn.trip_id) else { continue };
                        for chop in conn_stops.iter().filter(|h| h.seq > conn.seq) {
                            if origin_stops.contains(&chop.stop_id) && chop.arr_secs <= deadline_secs {
                                if dep.dep_secs as i64 > best_dep {
                                    best_dep = dep.dep_secs as i64;
                                    best = Some(vec![
                                        RawLeg {
                                            trip_id: dep.trip_id.clone(),
                                            from_stop: trail_stop.clone(),
                                            from_secs: dep.dep_secs,
                                            to_stop: hop.stop_id.clone(),
                                            to_secs: hop.arr_secs,
                                        },
                                        RawLeg {
                                            trip_id: conn.trip_id.clone(),
                                            from_stop: hop.stop_id.clone(),
                                            from_secs: conn.dep_secs,
                                            to_stop: chop.stop_id.clone(),
                                            to_secs: chop.arr_secs,
                                        },
                                    ]);
                                }
                                break;
                            }
                        }
                    }
                }
            }
        }

        best.map(|raw| self.to_legs(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{MemoryStore, RouteInfo};
    use crate::gtfs::GtfsFeed;
    use crate::gtfs::models::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 28).unwrap() // Tuesday
    }

    fn calendar_row() -> GtfsCalendar {
        GtfsCalendar {
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
        }
    }

    fn stop(id: &str, lat: f64, lon: f64) -> GtfsStop {
        GtfsStop {
            stop_id: id.into(),
            stop_name: id.into(),
            stop_lat: lat,
            stop_lon: lon,
            location_type: None,
            parent_station: None,
        }
    }

    fn stop_time(trip: &str, stop: &str, seq: u32, arr: &str, dep: &str) -> GtfsStopTime {
        GtfsStopTime {
            trip_id: trip.into(),
            arrival_time: arr.into(),
            departure_time: dep.into(),
            stop_id: stop.into(),
            stop_sequence: seq,
        }
    }

    #[test]
    fn direct_outbound_finds_single_leg() {
        let feed = GtfsFeed {
            stops: vec![stop("A", 31.8, 34.8), stop("B", 31.8, 34.8), stop("C", 31.8, 34.8)],
            agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
            routes: vec![GtfsRoute {
                route_id: "R1".into(),
                agency_id: None,
                route_short_name: Some("1".into()),
                route_long_name: None,
                route_type: 3,
            }],
            trips: vec![GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "t1".into() }],
            stop_times: vec![
                stop_time("t1", "A", 1, "07:00:00", "07:00:00"),
                stop_time("t1", "B", 2, "07:30:00", "07:30:00"),
                stop_time("t1", "C", 3, "08:00:00", "08:00:00"),
            ],
            calendar: vec![calendar_row()],
            calendar_dates: vec![],
        };
        let store = MemoryStore::build(&feed, date()).unwrap();
        let router = Router::new(&store, date(), Config::default());
        let origin = vec![Arc::<str>::from("A")];
        let dest: HashSet<Arc<str>> = ["C".into()].into_iter().collect();
        let legs = router.find_outbound(&origin, &dest, 6 * 3600).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].from_stop.as_ref(), "A");
        assert_eq!(legs[0].to_stop.as_ref(), "C");
        assert_eq!(legs[0].departure_ts.time(), crate::time::Secs::from_hms("07:00:00").unwrap().to_datetime(date()).time());
        assert_eq!(legs[0].arrival_ts.time(), crate::time::Secs::from_hms("08:00:00").unwrap().to_datetime(date()).time());
    }

    #[test]
    fn one_transfer_outbound() {
        let feed = GtfsFeed {
            stops: vec![stop("A", 31.8, 34.8), stop("B", 31.8, 34.8), stop("C", 31.8, 34.8)],
            agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
            routes: vec![
                GtfsRoute { route_id: "R1".into(), agency_id: None, route_short_name: Some("1".into()), route_long_name: None, route_type: 3 },
                GtfsRoute { route_id: "R2".into(), agency_id: None, route_short_name: Some("2".into()), route_long_name: None, route_type: 3 },
            ],
            trips: vec![
                GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "t1".into() },
                GtfsTrip { route_id: "R2".into(), service_id: "WK".into(), trip_id: "t2".into() },
            ],
            stop_times: vec![
                stop_time("t1", "A", 1, "07:00:00", "07:00:00"),
                stop_time("t1", "B", 2, "07:30:00", "07:30:00"),
                stop_time("t2", "B", 1, "07:32:00", "07:32:00"),
                stop_time("t2", "C", 2, "08:00:00", "08:00:00"),
            ],
            calendar: vec![calendar_row()],
            calendar_dates: vec![],
        };
        let store = MemoryStore::build(&feed, date()).unwrap();
        let router = Router::new(&store, date(), Config::default());
        let origin = vec![Arc::<str>::from("A")];
        let dest: HashSet<Arc<str>> = ["C".into()].into_iter().collect();
        let legs = router.find_outbound(&origin, &dest, 6 * 3600).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].from_stop.as_ref(), "A");
        assert_eq!(legs[1].to_stop.as_ref(), "C");
    }

    #[test]
    fn return_respects_deadline() {
        let feed = GtfsFeed {
            stops: vec![stop("C", 31.8, 34.8), stop("A", 31.8, 34.8)],
            agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
            routes: vec![GtfsRoute {
                route_id: "R1".into(),
                agency_id: None,
                route_short_name: Some("1".into()),
                route_long_name: None,
                route_type: 3,
            }],
            trips: vec![GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "t2".into() }],
            stop_times: vec![
                stop_time("t2", "C", 1, "15:00:00", "15:00:00"),
                stop_time("t2", "A", 2, "16:00:00", "16:00:00"),
            ],
            calendar: vec![calendar_row()],
            calendar_dates: vec![],
        };
        let store = MemoryStore::build(&feed, date()).unwrap();
        let router = Router::new(&store, date(), Config::default());
        let trail = vec![Arc::<str>::from("C")];
        let origin: HashSet<Arc<str>> = ["A".into()].into_iter().collect();

        assert!(router.find_return(&trail, &origin, 14 * 3600).is_none());
        let legs = router.find_return(&trail, &origin, 18 * 3600).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].from_stop.as_ref(), "C");
        assert_eq!(legs[0].to_stop.as_ref(), "A");
    }

    #[allow(dead_code)]
    fn _unused_route_info(_: RouteInfo) {}
}
