//! Matches hiking trails to same-day public-transit round trips: a
//! prepare-once, query-many planning `Context` built from a GTFS feed and a
//! trail catalogue, queried per origin through `planner::plan_hikes_for_origin`.
//!
pub mod config;
pub mod context;
pub mod deadline;
pub mod elevation;
pub mod error;
pub mod geo;
pub mod gtfs;
pub mod models;
pub mod planner;
pub mod router;
pub mod schedule;
pub mod spatial;
pub mod time;
pub mod trail;

pub use context::Context;
pub use error::{Error, Result};
pub use models::{
    BusLeg, Difficulty, HikePlan, HikeQuery, HikeSegment, LocationType, Origin, Route, SortKey,
    Stop, StopTime, Trail, TrailAccessPoint, Trip,
};
