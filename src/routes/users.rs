// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, session and profile routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_access_token, create_refresh_token, verify_jwt, AuthUser, TokenKind, REFRESH_COOKIE,
    REFRESH_TOKEN_TTL_SECS,
};
use crate::models::{Role, UserProfile};
use crate::services::RegisterRequest;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

/// Routes that need no access token.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register))
        .route("/sessions", post(authenticate))
        .route("/token/refresh", patch(refresh))
}

/// Routes for the authenticated member.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(profile))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(min = 1))]
    name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<StatusCode> {
    body.validate()?;

    state
        .user_service()
        .register(RegisterRequest {
            name: body.name,
            email: body.email,
            password: body.password,
            role: Role::Member,
        })
        .await?;

    Ok(StatusCode::CREATED)
}

// ─── Sessions ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AuthenticateBody {
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue an access token plus a refresh cookie.
fn issue_tokens(
    state: &AppState,
    jar: CookieJar,
    user_id: Uuid,
    role: Role,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let key = &state.config.jwt_signing_key;
    let token = create_access_token(user_id, role, key)?;
    let refresh = create_refresh_token(user_id, role, key)?;

    let cookie = Cookie::build((REFRESH_COOKIE, refresh))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(REFRESH_TOKEN_TTL_SECS as i64));

    Ok((jar.add(cookie), Json(TokenResponse { token })))
}

async fn authenticate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<AuthenticateBody>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    body.validate()?;

    let user = state
        .user_service()
        .authenticate(&body.email, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "Session created");
    issue_tokens(&state, jar, user.id, user.role)
}

/// Exchange the refresh cookie for a new token pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let user = verify_jwt(&token, TokenKind::Refresh, &state.config.jwt_signing_key)
        .ok_or(AppError::InvalidToken)?;

    issue_tokens(&state, jar, user.user_id, user.role)
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let user = state.user_service().profile(user.user_id).await?;

    Ok(Json(ProfileResponse { user: user.into() }))
}
