//! Great-circle distance and polyline utilities.

use std::str::FromStr;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Equatorial degrees-to-metres conversion used for the spatial index's
/// search buffer. Intentionally approximate and intentionally kept: see
/// `spatial` module docs.
pub const DEGREES_PER_METER: f64 = 1.0 / 111_000.0;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lon\", got {s:?}"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude in {s:?}"))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude in {s:?}"))?;
        Ok(Self { lat, lon })
    }
}

/// Great-circle distance between two coordinates, in meters. Symmetric,
/// zero iff the coordinates are equal.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

pub fn haversine_coord(a: Coordinate, b: Coordinate) -> f64 {
    haversine(a.lat, a.lon, b.lat, b.lon)
}

/// Sum of consecutive-vertex great-circle distances along a polyline, in km.
/// This is `spec.md`'s definition of `Trail.distance_km`.
pub fn polyline_length_km(polyline: &[Coordinate]) -> f64 {
    polyline
        .windows(2)
        .map(|w| haversine_coord(w[0], w[1]) / 1000.0)
        .sum()
}

/// Projects `point` onto the closest point of segment `(a, b)`, in a local
/// equirectangular approximation (adequate at the sub-kilometre scale a
/// single polyline segment spans).
fn nearest_point_on_segment(a: Coordinate, b: Coordinate, point: Coordinate) -> Coordinate {
    let lat0 = a.lat.to_radians();
    let to_xy = |c: Coordinate| -> (f64, f64) {
        (
            (c.lon - a.lon).to_radians() * lat0.cos(),
            (c.lat - a.lat).to_radians(),
        )
    };
    let from_xy = |x: f64, y: f64| -> Coordinate {
        Coordinate::new(a.lat + y.to_degrees(), a.lon + (x / lat0.cos()).to_degrees())
    };

    let (ax, ay) = (0.0, 0.0);
    let (bx, by) = to_xy(b);
    let (px, py) = to_xy(point);

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    from_xy(ax + t * dx, ay + t * dy)
}

/// Finds the closest point on the whole polyline to `point`, and its
/// arc-length fraction (`0.0` at the first vertex, `1.0` at the last) along
/// the polyline.
///
/// Mirrors Shapely's `nearest_points` + `project(normalized=True)` pair used
/// by the source this was ported from: projection happens in local
/// (approximately planar) coordinates per segment, but the returned fraction
/// is a fraction of the polyline's *great-circle* length, so it is correct
/// to multiply it by `distance_km` to get a km-from-start value.
pub fn nearest_point_on_polyline(polyline: &[Coordinate], point: Coordinate) -> (Coordinate, f64) {
    assert!(polyline.len() >= 2, "polyline must have at least 2 points");

    let segment_lengths: Vec<f64> = polyline
        .windows(2)
        .map(|w| haversine_coord(w[0], w[1]))
        .collect();
    let total_length: f64 = segment_lengths.iter().sum();

    let mut best_point = polyline[0];
    let mut best_dist = f64::MAX;
    let mut best_length_from_start = 0.0;
    let mut length_so_far = 0.0;

    for (i, w) in polyline.windows(2).enumerate() {
        let (a, b) = (w[0], w[1]);
        let candidate = nearest_point_on_segment(a, b, point);
        let dist = haversine_coord(candidate, point);
        if dist < best_dist {
            best_dist = dist;
            best_point = candidate;
            let partial = haversine_coord(a, candidate);
            best_length_from_start = length_so_far + partial;
        }
        length_so_far += segment_lengths[i];
    }

    let fraction = if total_length > 0.0 {
        (best_length_from_start / total_length).clamp(0.0, 1.0)
    } else {
        0.0
    };

    (best_point, fraction)
}

/// The point `fraction` (`0.0..=1.0`) of the way along `polyline`'s total
/// arc length, linearly interpolated within whichever segment that falls
/// in. Used for elevation sampling, the counterpart to
/// `nearest_point_on_polyline`'s "point -> fraction" direction.
pub fn point_at_fraction(polyline: &[Coordinate], fraction: f64) -> Coordinate {
    assert!(polyline.len() >= 2, "polyline must have at least 2 points");
    let fraction = fraction.clamp(0.0, 1.0);

    let segment_lengths: Vec<f64> = polyline
        .windows(2)
        .map(|w| haversine_coord(w[0], w[1]))
        .collect();
    let total_length: f64 = segment_lengths.iter().sum();
    if total_length == 0.0 {
        return polyline[0];
    }
    let target = fraction * total_length;

    let mut covered = 0.0;
    for (w, seg_len) in polyline.windows(2).zip(&segment_lengths) {
        if covered + seg_len >= target || seg_len == &0.0 {
            let t = if *seg_len > 0.0 { (target - covered) / seg_len } else { 0.0 };
            let (a, b) = (w[0], w[1]);
            return Coordinate::new(a.lat + t * (b.lat - a.lat), a.lon + t * (b.lon - a.lon));
        }
        covered += seg_len;
    }
    *polyline.last().unwrap()
}
