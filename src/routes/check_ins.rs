// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in routes: create, history, metrics and (admin) validation.

use super::gyms::default_page;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::CheckIn;
use crate::services::CheckInRequest;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/checkins/history", get(history))
        .route("/checkins/metrics", get(metrics))
        .route("/gyms/{gym_id}/checkins", post(create))
}

/// Routes restricted to ADMIN users.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/checkins/{check_in_id}/validate", patch(validate))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub check_in: CheckIn,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub check_ins: Vec<CheckIn>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub check_ins_count: u64,
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CheckInBody {
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(gym_id): Path<Uuid>,
    Json(body): Json<CheckInBody>,
) -> Result<(StatusCode, Json<CheckInResponse>)> {
    body.validate()?;

    let check_in = state
        .check_in_service()
        .execute(CheckInRequest {
            user_id: user.user_id,
            gym_id,
            user_latitude: body.latitude,
            user_longitude: body.longitude,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CheckInResponse { check_in })))
}

// ─── Validate ────────────────────────────────────────────────

async fn validate(
    State(state): State<Arc<AppState>>,
    Path(check_in_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .validate_check_in_service()
        .execute(check_in_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ─── History & Metrics ───────────────────────────────────────

#[derive(Deserialize, Validate)]
struct HistoryQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    page: u32,
}

async fn history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    params.validate()?;

    let check_ins = state
        .history_service()
        .history(user.user_id, params.page)
        .await?;

    Ok(Json(HistoryResponse { check_ins }))
}

async fn metrics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MetricsResponse>> {
    let check_ins_count = state.history_service().count(user.user_id).await?;

    Ok(Json(MetricsResponse { check_ins_count }))
}
