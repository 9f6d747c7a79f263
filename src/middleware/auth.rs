// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication and role-gating middleware.
//!
//! Access tokens travel in the `Authorization: Bearer` header. Refresh
//! tokens live in the `refreshToken` cookie and are only accepted by
//! `PATCH /token/refresh`.

use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL_SECS: usize = 10 * 60;

/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL_SECS: usize = 7 * 24 * 60 * 60;

/// Which half of the token pair a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Sent as `Authorization: Bearer`
    Access,
    /// Only accepted from the `refreshToken` cookie
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub role: Role,
    pub kind: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Decode and check a token of the given kind signed with `signing_key`.
pub fn verify_jwt(token: &str, kind: TokenKind, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    if token_data.claims.kind != kind {
        tracing::debug!(expected = ?kind, got = ?token_data.claims.kind, "Wrong token kind");
        return None;
    }
    let user_id = token_data.claims.sub.parse().ok()?;

    Some(AuthUser {
        user_id,
        role: token_data.claims.role,
    })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_user = verify_jwt(token, TokenKind::Access, &state.config.jwt_signing_key)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Middleware that only lets ADMIN users through.
///
/// Must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, StatusCode> {
    let role = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.role)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if role != Role::Admin {
        tracing::warn!(?role, path = %request.uri().path(), "Blocked non-admin request");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

fn create_jwt(
    user_id: Uuid,
    role: Role,
    kind: TokenKind,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let ttl_secs = match kind {
        TokenKind::Access => ACCESS_TOKEN_TTL_SECS,
        TokenKind::Refresh => REFRESH_TOKEN_TTL_SECS,
    };

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        kind,
        iat: now,
        exp: now + ttl_secs,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Create a short-lived access token.
pub fn create_access_token(
    user_id: Uuid,
    role: Role,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    create_jwt(user_id, role, TokenKind::Access, signing_key)
}

/// Create a refresh token for the `refreshToken` cookie.
pub fn create_refresh_token(
    user_id: Uuid,
    role: Role,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    create_jwt(user_id, role, TokenKind::Refresh, signing_key)
}
