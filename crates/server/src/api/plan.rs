use crate::{dto::HikePlanDto, state::AppState};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, warn};
use trailbus::{
    context::Context,
    models::{HikeQuery, Origin, SortKey},
    planner::{parse_difficulty, plan_hikes_for_origin},
    schedule::MemoryStore,
};

fn parse_bool(params: &HashMap<String, String>, key: &str) -> bool {
    params.get(key).map(|v| v == "true" || v == "1").unwrap_or(false)
}

fn parse_f64(params: &HashMap<String, String>, key: &str) -> Result<Option<f64>, StatusCode> {
    match params.get(key) {
        Some(v) => v.parse().map(Some).map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(None),
    }
}

fn query_from_params(params: &HashMap<String, String>) -> Result<HikeQuery, StatusCode> {
    let origin: Origin = params
        .get("origin")
        .ok_or(StatusCode::BAD_REQUEST)?
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let date = NaiveDate::parse_from_str(params.get("date").ok_or(StatusCode::BAD_REQUEST)?, "%Y-%m-%d")
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let earliest_departure = match params.get("earliest_departure") {
        Some(v) => Some(
            trailbus::time::Secs::from_hms(v)
                .ok_or(StatusCode::BAD_REQUEST)?
                .0,
        ),
        None => None,
    };
    let colors = params
        .get("colors")
        .map(|v| v.split(',').map(|c| c.trim().to_string()).collect());
    let difficulty = params.get("difficulty").and_then(|v| parse_difficulty(v));

    Ok(HikeQuery {
        origin,
        date,
        max_transfers: 1,
        safety_margin_hours: params
            .get("safety_margin_hours")
            .and_then(|v| v.parse().ok())
            .unwrap_or(trailbus::config::SAFETY_MARGIN_HOURS),
        max_walk_to_trail_m: params
            .get("max_walk_to_trail_m")
            .and_then(|v| v.parse().ok())
            .unwrap_or(trailbus::config::MAX_WALK_TO_TRAIL_M),
        min_hiking_hours: params
            .get("min_hiking_hours")
            .and_then(|v| v.parse().ok())
            .unwrap_or(trailbus::config::MIN_HIKING_HOURS),
        max_results: params
            .get("max_results")
            .and_then(|v| v.parse().ok())
            .unwrap_or(20),
        earliest_departure,
        colors,
        min_distance_km: parse_f64(params, "min_distance_km")?,
        max_distance_km: parse_f64(params, "max_distance_km")?,
        loop_only: parse_bool(params, "loop_only"),
        linear_only: parse_bool(params, "linear_only"),
        max_elevation_gain_m: parse_f64(params, "max_elevation_gain_m")?,
        difficulty,
        sort_by: SortKey::HikingRatio,
    })
}

/// `GET /plan`: builds a date-specific `Context` from whatever GTFS feed and
/// trail index the server currently has loaded, then answers one origin's
/// query through `trailbus::planner::plan_hikes_for_origin`.
pub async fn plan(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let query = query_from_params(&params)?;

    let feed_guard = state.feed.read().await;
    let Some(feed) = feed_guard.as_ref() else {
        warn!("plan requested before a GTFS feed was loaded");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let store = MemoryStore::build(feed, query.date).map_err(|err| {
        error!("failed to build schedule store: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let context = Context::prepare(store, &state.trails, &state.deadline, &query, state.config)
        .map_err(|err| {
            warn!("failed to prepare planning context: {err}");
            match err {
                trailbus::Error::SaturdayNotSupported => StatusCode::UNPROCESSABLE_ENTITY,
                trailbus::Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        })?;

    let plans = plan_hikes_for_origin(&query, &context).map_err(|err| {
        warn!("planning failed: {err}");
        match err {
            trailbus::Error::UnknownOrigin(_) | trailbus::Error::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    })?;

    let dtos: Vec<HikePlanDto> = plans.iter().map(Into::into).collect();
    Ok(Json(dtos).into_response())
}
