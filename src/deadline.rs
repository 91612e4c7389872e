//! Latest-return deadline: `spec.md` §4.6's weekday/Friday/Saturday rule,
//! grounded on `original_source/src/ingest/shabbat.py::get_deadline`.
//!
//! The Hebcal HTTP call itself is out of scope per `spec.md` §1; what's
//! implemented is the `CandleLightingSource` trait boundary, the weekday and
//! Friday arithmetic around it, and `_conservative_candle_estimate`'s
//! fallback — used here whenever no real source is wired up, not only when
//! one fails.

use crate::config::{DEFAULT_LATEST_RETURN_HOUR, SAFETY_MARGIN_HOURS};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Saturday hiking is not supported")]
    SaturdayNotSupported,
}

/// Fetches the Friday candle-lighting time for a date, in naive Israel
/// local time. Implementations may call out to Hebcal; the conservative
/// fallback below is used when none is configured or the call fails.
pub trait CandleLightingSource {
    fn candle_lighting(&self, date: NaiveDate) -> Option<NaiveDateTime>;
}

/// Months (1-indexed) on the early-sunset half of the year, per
/// `shabbat.py`'s `_WINTER_MONTHS`.
const WINTER_MONTHS: [u32; 6] = [1, 2, 3, 10, 11, 12];

fn conservative_candle_estimate(date: NaiveDate) -> NaiveDateTime {
    let fallback_time = if WINTER_MONTHS.contains(&date.month()) {
        NaiveTime::from_hms_opt(16, 30, 0).unwrap()
    } else {
        NaiveTime::from_hms_opt(19, 0, 0).unwrap()
    };
    date.and_time(fallback_time)
}

/// A `CandleLightingSource` that never has real data and always falls back
/// to the conservative estimate — the "HTTP call out of scope" stand-in.
pub struct NoCandleLightingSource;

impl CandleLightingSource for NoCandleLightingSource {
    fn candle_lighting(&self, _date: NaiveDate) -> Option<NaiveDateTime> {
        None
    }
}

/// Computes the latest-return deadline for a date, with a per-date cache of
/// resolved candle-lighting times (`shabbat.py`'s module-level `_candle_cache`,
/// restated as an instance field since this crate has no module-level
/// mutable state).
pub trait DeadlineSupplier {
    fn deadline(&self, date: NaiveDate, safety_margin_hours: f64) -> Result<NaiveDateTime, Error>;
}

pub struct DefaultDeadlineSupplier<C: CandleLightingSource> {
    candles: C,
    cache: RefCell<HashMap<NaiveDate, NaiveDateTime>>,
}

impl<C: CandleLightingSource> DefaultDeadlineSupplier<C> {
    pub fn new(candles: C) -> Self {
        Self { candles, cache: RefCell::new(HashMap::new()) }
    }

    fn candle_lighting_cached(&self, date: NaiveDate) -> NaiveDateTime {
        if let Some(dt) = self.cache.borrow().get(&date) {
            return *dt;
        }
        let dt = self.candles.candle_lighting(date).unwrap_or_else(|| conservative_candle_estimate(date));
        self.cache.borrow_mut().insert(date, dt);
        dt
    }
}

impl Default for DefaultDeadlineSupplier<NoCandleLightingSource> {
    fn default() -> Self {
        Self::new(NoCandleLightingSource)
    }
}

impl<C: CandleLightingSource> DeadlineSupplier for DefaultDeadlineSupplier<C> {
    fn deadline(&self, date: NaiveDate, safety_margin_hours: f64) -> Result<NaiveDateTime, Error> {
        match date.weekday() {
            Weekday::Sat => Err(Error::SaturdayNotSupported),
            Weekday::Fri => {
                let candle_dt = self.candle_lighting_cached(date);
                Ok(candle_dt - chrono::Duration::seconds((safety_margin_hours * 3600.0) as i64))
            }
            _ => Ok(date.and_time(NaiveTime::from_hms_opt(DEFAULT_LATEST_RETURN_HOUR, 0, 0).unwrap())),
        }
    }
}
