//! Elevation sampling contract: `spec.md` §6's raster/null-sentinel/sampling
//! rules, grounded on `original_source/src/ingest/elevation.py`'s
//! `ElevationSampler.sample_point`/`sample_trail`.
//!
//! No `.hgt`/GeoTIFF reader is implemented here — reading SRTM tiles is out
//! of scope per `spec.md` §1. What's implemented is the trait boundary and
//! the sampling arithmetic any real raster-backed source would plug into.

use crate::config::SRTM_SAMPLE_INTERVAL_M;
use crate::geo::{self, Coordinate};

/// Samples elevation in meters at a single point, or `None` if unavailable
/// (no tile covering the point, nodata value, reader not wired up).
pub trait ElevationSource {
    fn sample_point(&self, lat: f64, lon: f64) -> Option<f64>;
}

/// "Flat terrain" no-op source: every point is unavailable. Used where no
/// elevation raster is configured — trails keep whatever elevation figures
/// their persisted index already carries (`spec.md` §6).
pub struct NullElevationSource;

impl ElevationSource for NullElevationSource {
    fn sample_point(&self, _lat: f64, _lon: f64) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct ElevationStats {
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub max_elevation_m: f64,
    pub min_elevation_m: f64,
    pub elevation_profile: Vec<f64>,
}

/// Samples `source` at evenly spaced points along `polyline` (at least 2
/// samples, spaced roughly `SRTM_SAMPLE_INTERVAL_M` apart) and reduces the
/// readings into gain/loss/min/max, exactly as
/// `ElevationSampler.sample_trail` does. Points the source can't answer for
/// are skipped rather than zero-filled; fewer than two successful samples
/// yields all-zero stats with an empty profile.
pub fn sample_trail(
    source: &dyn ElevationSource,
    polyline: &[Coordinate],
    distance_km: f64,
) -> ElevationStats {
    let distance_m = distance_km * 1000.0;
    let n_samples = ((distance_m / SRTM_SAMPLE_INTERVAL_M) as usize).max(2);

    let mut elevations = Vec::new();
    for i in 0..=n_samples {
        let fraction = i as f64 / n_samples as f64;
        let point = geo::point_at_fraction(polyline, fraction);
        if let Some(elev) = source.sample_point(point.lat, point.lon) {
            elevations.push(elev);
        }
    }

    if elevations.len() < 2 {
        return ElevationStats::default();
    }

    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in elevations.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gain += delta;
        } else {
            loss += -delta;
        }
    }

    let max_elevation_m = elevations.iter().cloned().fold(f64::MIN, f64::max);
    let min_elevation_m = elevations.iter().cloned().fold(f64::MAX, f64::min);

    ElevationStats {
        elevation_gain_m: (gain * 10.0).round() / 10.0,
        elevation_loss_m: (loss * 10.0).round() / 10.0,
        max_elevation_m: (max_elevation_m * 10.0).round() / 10.0,
        min_elevation_m: (min_elevation_m * 10.0).round() / 10.0,
        elevation_profile: elevations,
    }
}
