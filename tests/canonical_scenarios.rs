//! Integration tests for the six canonical scenarios and the plan-level
//! invariants of `spec.md` §8, built against small synthetic GTFS feeds and
//! trail fixtures through the public crate API only.

use chrono::NaiveDate;
use trailbus::config::Config;
use trailbus::context::Context;
use trailbus::deadline::DefaultDeadlineSupplier;
use trailbus::geo::Coordinate;
use trailbus::gtfs::models::{
    GtfsAgency, GtfsCalendar, GtfsRoute, GtfsStop, GtfsStopTime, GtfsTrip,
};
use trailbus::gtfs::GtfsFeed;
use trailbus::models::{Difficulty, HikeQuery, Origin, SortKey, Trail};
use trailbus::planner::plan_hikes_for_origin;
use trailbus::router::Router;
use trailbus::schedule::MemoryStore;
use trailbus::trail::TrailSource;
use std::collections::HashSet;
use std::sync::Arc;

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 7, 28).unwrap()
}

fn weekday_calendar(service_id: &str) -> GtfsCalendar {
    GtfsCalendar {
        service_id: service_id.into(),
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

fn stop(id: &str, name: &str, lat: f64, lon: f64) -> GtfsStop {
    GtfsStop {
        stop_id: id.into(),
        stop_name: name.into(),
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

fn route(id: &str, short_name: &str) -> GtfsRoute {
    GtfsRoute {
        route_id: id.into(),
        agency_id: None,
        route_short_name: Some(short_name.into()),
        route_long_name: None,
        route_type: 3,
    }
}

/// Scenario 1: direct outbound. t1: A(07:00) -> B(07:30) -> C(08:00).
#[test]
fn scenario_1_direct_outbound() {
    let feed = GtfsFeed {
        stops: vec![
            stop("A", "A", 31.80, 34.80),
            stop("B", "B", 31.80, 34.80),
            stop("C", "C", 31.80, 34.80),
        ],
        agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
        routes: vec![route("R1", "1")],
        trips: vec![GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "t1".into() }],
        stop_times: vec![
            stop_time("t1", "A", 1, "07:00:00", "07:00:00"),
            stop_time("t1", "B", 2, "07:30:00", "07:30:00"),
            stop_time("t1", "C", 3, "08:00:00", "08:00:00"),
        ],
        calendar: vec![weekday_calendar("WK")],
        calendar_dates: vec![],
    };
    let date = tuesday();
    let store = MemoryStore::build(&feed, date).unwrap();
    let router = Router::new(&store, date, Config::default());

    let origin = vec![Arc::<str>::from("A")];
    let dest: HashSet<Arc<str>> = ["C".into()].into_iter().collect();
    let legs = router.find_outbound(&origin, &dest, 6 * 3600).unwrap();

    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0].from_stop.as_ref(), "A");
    assert_eq!(legs[0].to_stop.as_ref(), "C");
    assert_eq!(legs[0].departure_ts.time().to_string(), "07:00:00");
    assert_eq!(legs[0].arrival_ts.time().to_string(), "08:00:00");
}

/// Scenario 2: one-transfer outbound, honouring the minimum transfer slack.
#[test]
fn scenario_2_one_transfer_outbound() {
    let feed = GtfsFeed {
        stops: vec![
            stop("A", "A", 31.80, 34.80),
            stop("B", "B", 31.80, 34.80),
            stop("C", "C", 31.80, 34.80),
        ],
        agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
        routes: vec![route("R1", "1"), route("R2", "2")],
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
        calendar: vec![weekday_calendar("WK")],
        calendar_dates: vec![],
    };
    let date = tuesday();
    let store = MemoryStore::build(&feed, date).unwrap();
    let router = Router::new(&store, date, Config::default());

    let origin = vec![Arc::<str>::from("A")];
    let dest: HashSet<Arc<str>> = ["C".into()].into_iter().collect();
    let legs = router.find_outbound(&origin, &dest, 6 * 3600).unwrap();

    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].from_stop.as_ref(), "A");
    assert_eq!(legs[0].to_stop.as_ref(), "B");
    assert_eq!(legs[1].from_stop.as_ref(), "B");
    assert_eq!(legs[1].to_stop.as_ref(), "C");
    assert_eq!(legs[0].departure_ts.time().to_string(), "07:00:00");
    assert_eq!(legs[1].arrival_ts.time().to_string(), "08:00:00");
    // transfer slack: 07:30 alight, 07:32 board, honours >= 60s MIN_TRANSFER_SECS
    let gap = legs[1]
        .departure_ts
        .signed_duration_since(legs[0].arrival_ts)
        .num_seconds();
    assert!(gap >= 60);
}

/// Scenario 3: return respects the deadline.
#[test]
fn scenario_3_return_respects_deadline() {
    let feed = GtfsFeed {
        stops: vec![stop("C", "C", 31.80, 34.80), stop("A", "A", 31.80, 34.80)],
        agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
        routes: vec![route("R1", "1")],
        trips: vec![GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "t2".into() }],
        stop_times: vec![
            stop_time("t2", "C", 1, "15:00:00", "15:00:00"),
            stop_time("t2", "A", 2, "16:00:00", "16:00:00"),
        ],
        calendar: vec![weekday_calendar("WK")],
        calendar_dates: vec![],
    };
    let date = tuesday();
    let store = MemoryStore::build(&feed, date).unwrap();
    let router = Router::new(&store, date, Config::default());

    let trail_stops = vec![Arc::<str>::from("C")];
    let origin_stops: HashSet<Arc<str>> = ["A".into()].into_iter().collect();

    assert!(router.find_return(&trail_stops, &origin_stops, 14 * 3600).is_none());

    let legs = router.find_return(&trail_stops, &origin_stops, 18 * 3600).unwrap();
    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0].from_stop.as_ref(), "C");
    assert_eq!(legs[0].to_stop.as_ref(), "A");
    assert_eq!(legs[0].departure_ts.time().to_string(), "15:00:00");
    assert_eq!(legs[0].arrival_ts.time().to_string(), "16:00:00");
}

/// Scenario 4: spatial join accepts a ~55 m stop and rejects a ~2 km one.
#[test]
fn scenario_4_spatial_join_accepts_near_rejects_far() {
    use trailbus::spatial::SpatialIndex;

    let feed = GtfsFeed {
        stops: vec![
            stop("near", "Near Stop", 31.81, 34.8005),
            stop("far", "Far Stop", 31.81, 34.82),
        ],
        agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
        routes: vec![route("R1", "1")],
        trips: vec![GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "t1".into() }],
        stop_times: vec![
            stop_time("t1", "near", 1, "07:00:00", "07:00:00"),
            stop_time("t1", "far", 2, "07:30:00", "07:30:00"),
        ],
        calendar: vec![weekday_calendar("WK")],
        calendar_dates: vec![],
    };
    let date = tuesday();
    let store = MemoryStore::build(&feed, date).unwrap();
    let index = SpatialIndex::build(&store);

    let polyline = vec![Coordinate::new(31.80, 34.80), Coordinate::new(31.82, 34.80)];
    let points = index.access_points_for_polyline(&polyline, 2.224, 500.0);

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].stop_id.as_ref(), "near");
    assert!(points[0].walk_distance_m > 0.0 && points[0].walk_distance_m < 500.0);
    assert!(points[0].trail_km_from_start > 0.0 && points[0].trail_km_from_start < 2.224);
}

/// Scenario 5: deduplication keeps the shorter walk within the threshold.
#[test]
fn scenario_5_dedup_keeps_shorter_walk() {
    use trailbus::models::TrailAccessPoint;
    use trailbus::spatial::dedup_access_points;

    let far_walk = TrailAccessPoint {
        stop_id: "a".into(),
        stop_name: "a".into(),
        walk_distance_m: 200.0,
        entry_lat: 31.8,
        entry_lon: 34.8,
        trail_km_from_start: 1.00,
    };
    let near_walk = TrailAccessPoint {
        stop_id: "b".into(),
        stop_name: "b".into(),
        walk_distance_m: 100.0,
        entry_lat: 31.8,
        entry_lon: 34.8,
        trail_km_from_start: 1.05,
    };
    let kept = dedup_access_points(vec![far_walk, near_walk], trailbus::config::DEDUP_TRAIL_DISTANCE_M);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].stop_id.as_ref(), "b");
}

struct FixtureTrailSource {
    trails: Vec<Trail>,
}

impl TrailSource for FixtureTrailSource {
    fn trails_for(&self, _date: NaiveDate) -> Result<Vec<Trail>, trailbus::trail::Error> {
        Ok(self.trails.clone())
    }
}

fn empty_trail(id: &str, distance_km: f64, polyline: Vec<Coordinate>) -> Trail {
    Trail {
        id: id.into(),
        name: format!("Trail {id}").into(),
        source: "fixture".into(),
        polyline,
        distance_km,
        elevation_gain_m: 0.0,
        elevation_loss_m: 0.0,
        min_elev_m: None,
        max_elev_m: None,
        elevation_profile: vec![],
        difficulty: Some(Difficulty::Easy),
        colors: vec![],
        is_loop: false,
        recommended_seasons: vec![],
        season_warnings: vec![],
        access_points: vec![],
    }
}

fn base_query(origin: Origin, date: NaiveDate) -> HikeQuery {
    HikeQuery {
        origin,
        date,
        max_transfers: 1,
        safety_margin_hours: 2.0,
        max_walk_to_trail_m: 1000.0,
        min_hiking_hours: 0.05,
        max_results: 20,
        earliest_departure: None,
        colors: None,
        min_distance_km: None,
        max_distance_km: None,
        loop_only: false,
        linear_only: false,
        max_elevation_gain_m: None,
        difficulty: None,
        sort_by: SortKey::HikingRatio,
    }
}

/// Builds a full feed: an origin stop `O` near `(31.80, 34.70)` with a
/// morning trip out to a trail stop and an evening trip back, for an
/// out-and-back trail starting at that stop.
fn feed_with_outbound_and_return(
    trail_stop: &str,
    out_dep: &str,
    out_arr: &str,
    ret_dep: &str,
    ret_arr: &str,
) -> GtfsFeed {
    GtfsFeed {
        stops: vec![
            stop("O", "Origin Station", 31.80, 34.70),
            stop(trail_stop, trail_stop, 31.80, 34.80),
        ],
        agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
        routes: vec![route("OUT", "1"), route("RET", "2")],
        trips: vec![
            GtfsTrip { route_id: "OUT".into(), service_id: "WK".into(), trip_id: "out".into() },
            GtfsTrip { route_id: "RET".into(), service_id: "WK".into(), trip_id: "ret".into() },
        ],
        stop_times: vec![
            stop_time("out", "O", 1, out_dep, out_dep),
            stop_time("out", trail_stop, 2, out_arr, out_arr),
            stop_time("ret", trail_stop, 1, ret_dep, ret_dep),
            stop_time("ret", "O", 2, ret_arr, ret_arr),
        ],
        calendar: vec![weekday_calendar("WK")],
        calendar_dates: vec![],
    }
}

/// Scenario 6 + plan invariants: full `plan_hikes_for_origin` pipeline
/// produces a `HikePlan` satisfying every invariant of `spec.md` §8, and
/// ranking sorts descending by `hiking_ratio` with `max_results` truncation.
#[test]
fn scenario_6_plan_ranking_and_invariants() {
    let date = tuesday();
    let feed = feed_with_outbound_and_return("T", "06:00:00", "06:30:00", "16:00:00", "16:30:00");
    let store = MemoryStore::build(&feed, date).unwrap();

    // Both trailheads sit a short, nonzero walk from stop T (not exactly on
    // top of it) so the walk-time contribution to the hike window is
    // strictly positive, matching every plan's walk-adjusted invariants.
    // The two trails differ in length so their hiking_ratio differs too.
    let polyline_short = vec![
        Coordinate::new(31.8005, 34.8004),
        Coordinate::new(31.805, 34.80),
    ];
    let polyline_long = vec![
        Coordinate::new(31.8005, 34.8004),
        Coordinate::new(31.85, 34.80),
    ];

    let mut short_trail = empty_trail("short", 0.6, polyline_short);
    short_trail.is_loop = false;
    let mut long_trail = empty_trail("long", 5.5, polyline_long);
    long_trail.is_loop = false;

    let trail_source = FixtureTrailSource { trails: vec![short_trail, long_trail] };
    let deadline_supplier = DefaultDeadlineSupplier::default();
    let query = base_query(Origin::Coordinate(31.80, 34.70), date);

    let context = Context::prepare(store, &trail_source, &deadline_supplier, &query, Config::default())
        .expect("context prepares");
    assert_eq!(context.trails.len(), 2, "both trails should gain the shared stop as an access point");

    let mut query_all = query.clone();
    query_all.max_results = 20;
    let plans = plan_hikes_for_origin(&query_all, &context).expect("planning succeeds");
    assert_eq!(plans.len(), 2, "each trail yields one out-and-back plan");

    // Descending ratio order.
    assert!(plans[0].hiking_ratio >= plans[1].hiking_ratio);

    // max_results truncates to the single best plan.
    let mut query_top1 = query.clone();
    query_top1.max_results = 1;
    let top1 = plan_hikes_for_origin(&query_top1, &context).unwrap();
    assert_eq!(top1.len(), 1);
    assert_eq!(top1[0].trail.id, plans[0].trail.id);

    for plan in &plans {
        // Invariant 1 & 2: hike window strictly inside the walk-adjusted
        // bus window.
        assert!(plan.hike_segment.hike_start_ts > plan.outbound_legs.last().unwrap().arrival_ts);
        assert!(plan.return_legs[0].departure_ts > plan.hike_segment.hike_end_ts);
        // Invariant 3: arrival no later than the deadline.
        assert!(plan.return_legs.last().unwrap().arrival_ts <= plan.deadline);
        // Invariant 4: ratio strictly above zero, at most one.
        assert!(plan.hiking_ratio > 0.0 && plan.hiking_ratio <= 1.0);
        // Invariant 5: every leg departs strictly before it arrives.
        for leg in plan.outbound_legs.iter().chain(plan.return_legs.iter()) {
            assert!(leg.departure_ts < leg.arrival_ts);
        }
    }
}

/// Invariant 6: a through-hike plan sets `exit_access_point`, marks the
/// hike segment as a through-hike with distinct entry/exit stops, and
/// keeps the segment length within the through-hike distance band.
#[test]
fn through_hike_invariants() {
    let date = tuesday();
    // Two trail-side stops straddling a 10 km trail, each with its own
    // outbound/return service so the through-hike can enter at one and
    // exit at the other.
    let feed = GtfsFeed {
        stops: vec![
            stop("O", "Origin Station", 31.80, 34.70),
            stop("IN", "Trailhead In", 31.80, 34.80),
            stop("OUT", "Trailhead Out", 31.89, 34.80),
        ],
        agencies: vec![GtfsAgency { agency_id: None, agency_name: "Egged".into() }],
        routes: vec![route("R1", "1"), route("R2", "2")],
        trips: vec![
            GtfsTrip { route_id: "R1".into(), service_id: "WK".into(), trip_id: "out".into() },
            GtfsTrip { route_id: "R2".into(), service_id: "WK".into(), trip_id: "ret".into() },
        ],
        stop_times: vec![
            stop_time("out", "O", 1, "06:00:00", "06:00:00"),
            stop_time("out", "IN", 2, "06:30:00", "06:30:00"),
            stop_time("ret", "OUT", 1, "15:00:00", "15:00:00"),
            stop_time("ret", "O", 2, "15:45:00", "15:45:00"),
        ],
        calendar: vec![weekday_calendar("WK")],
        calendar_dates: vec![],
    };
    let store = MemoryStore::build(&feed, date).unwrap();

    let polyline = vec![Coordinate::new(31.80, 34.80), Coordinate::new(31.89, 34.80)];
    let mut trail = empty_trail("through", 10.0, polyline);
    trail.elevation_gain_m = 300.0;
    trail.elevation_loss_m = 300.0;

    let trail_source = FixtureTrailSource { trails: vec![trail] };
    let deadline_supplier = DefaultDeadlineSupplier::default();
    let mut query = base_query(Origin::Coordinate(31.80, 34.70), date);
    query.min_hiking_hours = 0.1;

    let context = Context::prepare(store, &trail_source, &deadline_supplier, &query, Config::default())
        .expect("context prepares");
    let plans = plan_hikes_for_origin(&query, &context).expect("planning succeeds");

    let through = plans
        .iter()
        .find(|p| p.hike_segment.is_through_hike)
        .expect("a through-hike plan is produced");

    assert!(through.exit_access_point.is_some());
    let exit_stop = through.hike_segment.exit_stop.as_ref().unwrap();
    assert_ne!(&through.hike_segment.entry_stop, exit_stop);

    let segment_km = through.hike_segment.estimated_distance_km;
    assert!(segment_km >= trailbus::config::THROUGH_HIKE_MIN_DISTANCE_KM - 1e-6);
    assert!(segment_km <= trailbus::config::THROUGH_HIKE_MAX_DISTANCE_KM + 1e-6);
}

/// Algebraic property: `find_outbound` is monotonic in `earliest_dep_secs`.
#[test]
fn find_outbound_is_monotonic() {
    let feed = feed_with_outbound_and_return("T", "06:00:00", "06:30:00", "16:00:00", "16:30:00");
    let date = tuesday();
    let store = MemoryStore::build(&feed, date).unwrap();
    let router = Router::new(&store, date, Config::default());
    let origin = vec![Arc::<str>::from("O")];
    let dest: HashSet<Arc<str>> = ["T".into()].into_iter().collect();

    let early = router.find_outbound(&origin, &dest, 0).unwrap();
    let later = router.find_outbound(&origin, &dest, 6 * 3600 + 1).unwrap_or_else(|| {
        // past this trip's only departure, there is no itinerary at all;
        // treat "no itinerary" as "infinitely late" for the comparison.
        vec![]
    });
    if later.is_empty() {
        // increasing earliest_dep_secs cannot produce an earlier arrival
        // than before, and here it found nothing at all, which is
        // consistent with monotonicity (never an improvement).
        return;
    }
    assert!(later.last().unwrap().arrival_ts >= early.last().unwrap().arrival_ts);
}

/// Algebraic property: `find_return` is monotonic in `deadline_secs`.
#[test]
fn find_return_is_monotonic() {
    let feed = feed_with_outbound_and_return("T", "06:00:00", "06:30:00", "16:00:00", "16:30:00");
    let date = tuesday();
    let store = MemoryStore::build(&feed, date).unwrap();
    let router = Router::new(&store, date, Config::default());
    let trail_stops = vec![Arc::<str>::from("T")];
    let origin: HashSet<Arc<str>> = ["O".into()].into_iter().collect();

    // The return trip departs at 16:00 (57600s). A deadline earlier than
    // that admits no plan; a later one does — raising `deadline_secs` (the
    // latest acceptable arrival) never makes a found plan disappear.
    let tight = router.find_return(&trail_stops, &origin, 12 * 3600);
    let loose = router.find_return(&trail_stops, &origin, 20 * 3600);

    match (tight, loose) {
        (Some(t), Some(l)) => assert!(l.first().unwrap().departure_ts >= t.first().unwrap().departure_ts),
        (None, Some(_)) => {}
        (Some(_), None) => panic!("loosening the deadline should never turn a plan absent"),
        (None, None) => {}
    }
}

/// Dedup is idempotent: running it twice on its own output changes nothing.
#[test]
fn dedup_is_idempotent() {
    use trailbus::models::TrailAccessPoint;
    use trailbus::spatial::dedup_access_points;

    let points = vec![
        TrailAccessPoint {
            stop_id: "a".into(),
            stop_name: "a".into(),
            walk_distance_m: 400.0,
            entry_lat: 31.8,
            entry_lon: 34.8,
            trail_km_from_start: 0.0,
        },
        TrailAccessPoint {
            stop_id: "b".into(),
            stop_name: "b".into(),
            walk_distance_m: 50.0,
            entry_lat: 31.8,
            entry_lon: 34.8,
            trail_km_from_start: 2.0,
        },
    ];
    let once = dedup_access_points(points, trailbus::config::DEDUP_TRAIL_DISTANCE_M);
    let twice = dedup_access_points(once.clone(), trailbus::config::DEDUP_TRAIL_DISTANCE_M);
    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(twice.iter()) {
        assert_eq!(a.stop_id, b.stop_id);
    }
}

