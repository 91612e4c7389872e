//! Seconds-since-midnight time representation and wall-clock conversion.

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use std::fmt;

/// Seconds since the service day's local midnight. May exceed `86_400` for
/// a trip that runs past midnight; the representation is preserved rather
/// than wrapped, per the schedule's "past-midnight" convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Secs(pub u32);

impl Secs {
    pub const ZERO: Secs = Secs(0);

    pub fn from_hms(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(3, ':');
        let h: u32 = parts.next()?.parse().ok()?;
        let m: u32 = parts.next()?.parse().ok()?;
        let sec: u32 = parts.next()?.parse().ok()?;
        Some(Self(h * 3600 + m * 60 + sec))
    }

    pub fn to_hms_string(self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{h:02}:{m:02}:{s:02}")
    }

    /// Converts to a wall-clock datetime by adding these seconds to
    /// `date`'s local midnight, carrying day overflow for past-midnight
    /// trips.
    pub fn to_datetime(self, date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(0, 0, 0).expect("valid midnight") + ChronoDuration::seconds(self.0 as i64)
    }

    pub fn saturating_add(self, other: u32) -> Self {
        Self(self.0.saturating_add(other))
    }

    pub fn saturating_sub(self, other: u32) -> Self {
        Self(self.0.saturating_sub(other))
    }
}

/// Like `Secs::to_datetime`, but for a fractional seconds-since-midnight
/// value (a walk time derived from a speed in km/h, say) that shouldn't be
/// floored before becoming a timestamp. Sub-millisecond remainders are
/// dropped; nothing in this domain resolves finer than that.
pub fn secs_f64_to_datetime(secs: f64, date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("valid midnight") + ChronoDuration::milliseconds((secs * 1000.0).round() as i64)
}

impl fmt::Display for Secs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hms_string())
    }
}
