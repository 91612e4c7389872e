//! Named constants from the external-interface contract, plus a small
//! deployment-overridable `Config`.

/// Maximum walk distance from a stop to a trail polyline for the stop to count
/// as an access point.
pub const MAX_WALK_TO_TRAIL_M: f64 = 1000.0;
/// Radius around an origin within which we look for departure stops.
pub const STOP_SEARCH_RADIUS_M: f64 = 500.0;
/// Minimum along-trail separation between two retained access points.
pub const DEDUP_TRAIL_DISTANCE_M: f64 = 200.0;
/// Trails longer than this are skipped entirely (mega-trails).
pub const MAX_TRAIL_DISTANCE_KM: f64 = 30.0;
/// Minimum time between alighting and the next boarding at a transfer stop.
pub const MIN_TRANSFER_SECS: u32 = 60;
/// Pruning cap: intermediate stops scanned per trip in the one-transfer phase.
pub const MAX_INTERMEDIATE_STOPS: usize = 30;
/// Pruning cap: connecting departures tried per intermediate stop.
pub const MAX_CONNECTING_DEPARTURES: usize = 10;
/// Pruning cap: candidate return departures tried per trail stop.
pub const MAX_RETURN_DEPARTURES: usize = 10;

/// Naismith's rule: flat-ground hiking speed.
pub const NAISMITH_SPEED_KMH: f64 = 4.0;
/// Naismith's rule: metres of climb added per hour.
pub const NAISMITH_CLIMB_FACTOR: f64 = 600.0;
/// Walking speed between a bus stop and a trail entry point.
pub const WALK_SPEED_KMH: f64 = 4.5;

pub const THROUGH_HIKE_MIN_DISTANCE_KM: f64 = 3.0;
pub const THROUGH_HIKE_MAX_DISTANCE_KM: f64 = 20.0;

pub const MIN_HIKING_HOURS: f64 = 1.0;
pub const MAX_TRANSFERS: u8 = 1;

pub const SAFETY_MARGIN_HOURS: f64 = 2.0;
pub const DEFAULT_LATEST_RETURN_HOUR: u32 = 18;
pub const DEFAULT_EARLIEST_DEPARTURE_HOUR: u32 = 6;

pub const SRTM_SAMPLE_INTERVAL_M: f64 = 50.0;

/// Months (1-indexed) during which trail season warnings are surfaced.
pub const RAINY_MONTHS: [u32; 5] = [11, 12, 1, 2, 3];

/// Bound on the on-disk store's per-stop/per-trip lookup cache.
pub const DISK_STORE_CACHE_CAP: usize = 20_000;

/// A handful of values a deployment might reasonably override; every field
/// defaults to the constant above with the same name. Values that are
/// properly per-request (walk budget, safety margin, minimum hiking hours)
/// live on `HikeQuery` instead, not here.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub stop_search_radius_m: f64,
    pub dedup_trail_distance_m: f64,
    pub max_trail_distance_km: f64,
    pub min_transfer_secs: u32,
    pub max_intermediate_stops: usize,
    pub max_connecting_departures: usize,
    pub max_return_departures: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stop_search_radius_m: STOP_SEARCH_RADIUS_M,
            dedup_trail_distance_m: DEDUP_TRAIL_DISTANCE_M,
            max_trail_distance_km: MAX_TRAIL_DISTANCE_KM,
            min_transfer_secs: MIN_TRANSFER_SECS,
            max_intermediate_stops: MAX_INTERMEDIATE_STOPS,
            max_connecting_departures: MAX_CONNECTING_DEPARTURES,
            max_return_departures: MAX_RETURN_DEPARTURES,
        }
    }
}
