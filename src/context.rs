//! Origin-independent planning context: `spec.md` §4.6, grounded on
//! `original_source/src/query/planner.py`'s `PlannerContext`/`prepare_data`
//! (and its low-memory twin `prepare_data_from_index`, restated here as a
//! single `prepare` generic over whichever `ScheduleStore` backend the
//! caller already built — `spec.md` §9's "both backends implement the
//! interface; the router is generic over it").

use crate::config::Config;
use crate::deadline::DeadlineSupplier;
use crate::error::{Error, Result};
use crate::models::{HikeQuery, Trail};
use crate::schedule::ScheduleStore;
use crate::spatial::{self, SpatialIndex};
use crate::trail::TrailSource;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pre-loaded, origin-independent data for planning hikes: the trail
/// catalogue (already filtered), today's deadline, and a spatial index over
/// the schedule's stops, reused across however many origins a caller plans
/// for in one run.
pub struct Context<S: ScheduleStore> {
    pub store: S,
    pub trails: Vec<Arc<Trail>>,
    pub deadline: NaiveDateTime,
    pub deadline_secs: u32,
    pub spatial_index: SpatialIndex,
    pub date: NaiveDate,
    pub config: Config,
}

fn datetime_to_secs(dt: NaiveDateTime) -> u32 {
    dt.hour() * 3600 + dt.minute() * 60 + dt.second()
}

impl<S: ScheduleStore> Context<S> {
    /// Builds a `Context` for `query.date`: loads the trail catalogue from
    /// `trail_source`, applies the distance cap and the query's own filters
    /// (`crate::planner::filter_trails`), computes today's deadline, and
    /// indexes the store's stops for origin search.
    pub fn prepare(
        store: S,
        trail_source: &dyn TrailSource,
        deadline_supplier: &dyn DeadlineSupplier,
        query: &HikeQuery,
        config: Config,
    ) -> Result<Self> {
        let start = std::time::Instant::now();

        let trails = trail_source.trails_for(query.date)?;
        let n_loaded = trails.len();
        let trails: Vec<Trail> = trails
            .into_iter()
            .filter(|t| t.distance_km <= config.max_trail_distance_km)
            .collect();
        let mut trails = crate::planner::filter_trails(trails, query);
        tracing::info!(
            loaded = n_loaded,
            kept = trails.len(),
            "trail catalogue prepared"
        );

        let deadline = deadline_supplier.deadline(query.date, query.safety_margin_hours)?;
        let deadline_secs = datetime_to_secs(deadline);
        tracing::info!(deadline = %deadline.time(), "deadline computed");

        let spatial_index = SpatialIndex::build(&store);

        // Trails from a fresh fetch carry no access points yet; a
        // pre-processed trail index already has them (`spec.md` §4.6 step
        // 3). Only the former need the join run here. Each trail's join is
        // independent of every other's, so it fans out across threads the
        // same way the reference stack parallelises its own per-trip
        // ingestion work.
        let n_joined = AtomicUsize::new(0);
        trails.par_iter_mut().for_each(|trail| {
            if !trail.access_points.is_empty() {
                return;
            }
            let points = spatial_index.access_points_for_polyline(
                &trail.polyline,
                trail.distance_km,
                query.max_walk_to_trail_m,
            );
            trail.access_points = spatial::dedup_access_points(points, config.dedup_trail_distance_m);
            if !trail.access_points.is_empty() {
                n_joined.fetch_add(1, Ordering::Relaxed);
            }
        });
        let n_joined = n_joined.into_inner();
        let trails: Vec<Trail> = trails
            .into_iter()
            .filter(|t| !t.access_points.is_empty())
            .collect();
        tracing::info!(
            joined = n_joined,
            with_access = trails.len(),
            "spatial join complete"
        );

        tracing::info!(elapsed = ?start.elapsed(), "planning context prepared");

        Ok(Self {
            store,
            trails: trails.into_iter().map(Arc::new).collect(),
            deadline,
            deadline_secs,
            spatial_index,
            date: query.date,
            config,
        })
    }
}

impl HikeQuery {
    /// Validates the query, converting the failure into a crate-wide error
    /// with the sentinel `spec.md` §7 names.
    pub fn validate_or_err(&self) -> Result<()> {
        self.validate().map_err(Error::InvalidQuery)
    }
}
