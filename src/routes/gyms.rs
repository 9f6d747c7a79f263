// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory routes.

use crate::distance::Coordinate;
use crate::error::Result;
use crate::models::{Gym, NewGym};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/gyms/search", get(search))
        .route("/gyms/nearby", get(nearby))
}

/// Routes restricted to ADMIN users.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/gyms", post(create))
}

pub(crate) fn default_page() -> u32 {
    1
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GymsResponse {
    pub gyms: Vec<Gym>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GymResponse {
    pub gym: Gym,
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct SearchQuery {
    #[validate(length(min = 1, max = 100))]
    q: String,
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    page: u32,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<GymsResponse>> {
    params.validate()?;

    let gyms = state.gym_service().search(&params.q, params.page).await?;

    Ok(Json(GymsResponse { gyms }))
}

// ─── Nearby ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
}

async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<GymsResponse>> {
    params.validate()?;

    let gyms = state
        .gym_service()
        .nearby(Coordinate::new(params.latitude, params.longitude))
        .await?;

    Ok(Json(GymsResponse { gyms }))
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateGymBody {
    #[validate(length(min = 1))]
    title: String,
    description: Option<String>,
    phone: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateGymBody>,
) -> Result<(StatusCode, Json<GymResponse>)> {
    body.validate()?;

    let gym = state
        .gym_service()
        .create(NewGym {
            title: body.title,
            description: body.description,
            phone: body.phone,
            latitude: body.latitude,
            longitude: body.longitude,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(GymResponse { gym })))
}
