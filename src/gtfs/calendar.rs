//! Date-specific active-service computation.
//!
//! Ported from the exact precedence rule of the original implementation:
//! a calendar row contributes a service iff the weekday matches and the
//! date falls within `[start_date, end_date]`; `calendar_dates` exceptions
//! are then applied on top, `exception_type = 1` adding a service and
//! `exception_type = 2` removing one, regardless of what the calendar row
//! said.

use super::models::{GtfsCalendar, GtfsCalendarDate};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use std::sync::Arc;

fn parse_yyyymmdd(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn weekday_active(row: &GtfsCalendar, weekday: Weekday) -> bool {
    let flag = match weekday {
        Weekday::Mon => row.monday,
        Weekday::Tue => row.tuesday,
        Weekday::Wed => row.wednesday,
        Weekday::Thu => row.thursday,
        Weekday::Fri => row.friday,
        Weekday::Sat => row.saturday,
        Weekday::Sun => row.sunday,
    };
    flag == 1
}

/// Computes the set of service ids active on `date`.
pub fn active_service_ids(
    calendar: &[GtfsCalendar],
    calendar_dates: &[GtfsCalendarDate],
    date: NaiveDate,
) -> HashSet<Arc<str>> {
    let mut active: HashSet<Arc<str>> = HashSet::new();

    for row in calendar {
        let (Some(start), Some(end)) =
            (parse_yyyymmdd(&row.start_date), parse_yyyymmdd(&row.end_date))
        else {
            continue;
        };
        if start <= date && date <= end && weekday_active(row, date.weekday()) {
            active.insert(row.service_id.as_str().into());
        }
    }

    for exc in calendar_dates {
        let Some(exc_date) = parse_yyyymmdd(&exc.date) else {
            continue;
        };
        if exc_date != date {
            continue;
        }
        let service_id: Arc<str> = exc.service_id.as_str().into();
        match exc.exception_type {
            1 => {
                active.insert(service_id);
            }
            2 => {
                active.remove(&service_id);
            }
            _ => {}
        }
    }

    active
}
