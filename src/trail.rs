//! Trail data supply: `spec.md` §6's persisted trail JSON index, grounded on
//! `original_source/src/ingest/osm_trails.py` for the record shape and
//! `src/models.py::Trail`/`TrailAccessPoint` for field names.
//!
//! The network OSM-overlay fetch (`fetch_hiking_trails`/Overpass API) is out
//! of scope per `spec.md` §1; what's implemented is the `TrailSource`
//! contract and a file-backed reader of the already-fetched, already-JSON
//! trail index.

use crate::geo::Coordinate;
use crate::models::{Difficulty, Trail, TrailAccessPoint};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error reading trail index: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed trail index: {0}")]
    Json(#[from] serde_json::Error),
}

/// Yields the trail catalogue for a query date. Trail geometry and metadata
/// don't actually vary by date in this implementation (only the transit
/// schedule does); the date parameter exists because a future supplier —
/// e.g. one that excludes trails closed for seasonal maintenance on a given
/// day — would need it, matching the signature `spec.md` §6 specifies.
pub trait TrailSource {
    fn trails_for(&self, date: NaiveDate) -> Result<Vec<Trail>, Error>;
}

/// One entry of the persisted trail index's `trails` array.
#[derive(Debug, Deserialize)]
struct TrailRecord {
    id: String,
    name: String,
    source: String,
    distance_km: f64,
    #[serde(default)]
    elevation_gain_m: f64,
    #[serde(default)]
    elevation_loss_m: f64,
    min_elevation_m: Option<f64>,
    max_elevation_m: Option<f64>,
    difficulty: Option<String>,
    #[serde(default)]
    colors: Vec<String>,
    is_loop: Option<bool>,
    #[serde(default)]
    recommended_seasons: Vec<String>,
    #[serde(default)]
    season_warnings: Vec<String>,
    #[serde(default)]
    elevation_profile: Vec<f64>,
    geometry: Vec<[f64; 2]>,
    #[serde(default)]
    access_points: Vec<TrailAccessPointRecord>,
}

#[derive(Debug, Deserialize)]
struct TrailAccessPointRecord {
    stop_id: String,
    stop_name: String,
    walk_distance_m: f64,
    trail_entry_lat: f64,
    trail_entry_lon: f64,
    trail_km_from_start: f64,
}

/// The `{generated_at, n_trails, trails: [...]}` wrapper of `spec.md` §6.
#[derive(Debug, Deserialize)]
struct TrailIndex {
    #[allow(dead_code)]
    generated_at: String,
    #[allow(dead_code)]
    n_trails: usize,
    trails: Vec<TrailRecord>,
}

fn parse_difficulty(raw: Option<&str>) -> Option<Difficulty> {
    match raw?.to_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "moderate" => Some(Difficulty::Moderate),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

impl From<TrailRecord> for Trail {
    fn from(record: TrailRecord) -> Self {
        let polyline: Vec<Coordinate> = record
            .geometry
            .iter()
            .map(|[lat, lon]| Coordinate::new(*lat, *lon))
            .collect();
        let is_loop = record.is_loop.unwrap_or_else(|| Trail::compute_is_loop(&polyline));
        let access_points = record
            .access_points
            .into_iter()
            .map(|p| TrailAccessPoint {
                stop_id: Arc::from(p.stop_id.as_str()),
                stop_name: Arc::from(p.stop_name.as_str()),
                walk_distance_m: p.walk_distance_m,
                entry_lat: p.trail_entry_lat,
                entry_lon: p.trail_entry_lon,
                trail_km_from_start: p.trail_km_from_start,
            })
            .collect();

        Trail {
            id: Arc::from(record.id.as_str()),
            name: Arc::from(record.name.as_str()),
            source: Arc::from(record.source.as_str()),
            polyline,
            distance_km: record.distance_km,
            elevation_gain_m: record.elevation_gain_m,
            elevation_loss_m: record.elevation_loss_m,
            min_elev_m: record.min_elevation_m,
            max_elev_m: record.max_elevation_m,
            elevation_profile: record.elevation_profile,
            difficulty: parse_difficulty(record.difficulty.as_deref()),
            colors: record.colors.iter().map(|c| Arc::from(c.as_str())).collect(),
            is_loop,
            recommended_seasons: record.recommended_seasons.iter().map(|s| Arc::from(s.as_str())).collect(),
            season_warnings: record.season_warnings.iter().map(|s| Arc::from(s.as_str())).collect(),
            access_points,
        }
    }
}

/// Reads the persisted trail index from a JSON file on disk.
pub struct FileTrailSource {
    path: std::path::PathBuf,
}

impl FileTrailSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl TrailSource for FileTrailSource {
    fn trails_for(&self, _date: NaiveDate) -> Result<Vec<Trail>, Error> {
        let bytes = std::fs::read(&self.path)?;
        let index: TrailIndex = serde_json::from_slice(&bytes)?;
        Ok(index.trails.into_iter().map(Trail::from).collect())
    }
}
