// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use chrono::{DateTime, TimeZone, Utc};
use gym_checkin::clock::FixedClock;
use gym_checkin::config::Config;
use gym_checkin::db::FirestoreDb;
use gym_checkin::middleware::auth::create_access_token;
use gym_checkin::models::{Gym, NewGym, Role, User};
use gym_checkin::routes::create_router;
use gym_checkin::services::RegisterRequest;
use gym_checkin::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Fixed starting instant for every test clock.
#[allow(dead_code)]
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 25, 9, 0, 0).unwrap()
}

/// Create a test app backed by in-memory repositories.
/// Returns the router, the shared state and the clock driving it.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(test_start()));
    let state = Arc::new(AppState::in_memory(Config::default(), clock.clone()));

    (create_router(state.clone()), state, clock)
}

/// Register a user directly through the service layer.
#[allow(dead_code)]
pub async fn register_user(state: &AppState, email: &str, role: Role) -> User {
    state
        .user_service()
        .register(RegisterRequest {
            name: "John Doe".to_string(),
            email: email.to_string(),
            password: "123456".to_string(),
            role,
        })
        .await
        .expect("registration should succeed")
}

/// Register a user and mint an access token for them.
#[allow(dead_code)]
pub async fn user_with_token(state: &AppState, email: &str, role: Role) -> (User, String) {
    let user = register_user(state, email, role).await;
    let token = create_access_token(user.id, role, &state.config.jwt_signing_key).unwrap();
    (user, token)
}

/// Seed a gym at the given coordinate.
#[allow(dead_code)]
pub async fn create_gym(state: &AppState, title: &str, latitude: f64, longitude: f64) -> Gym {
    state
        .gym_service()
        .create(NewGym {
            title: title.to_string(),
            description: None,
            phone: None,
            latitude,
            longitude,
        })
        .await
        .expect("gym creation should succeed")
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
