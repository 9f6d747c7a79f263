// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests: malformed bodies, queries and path ids are
//! rejected before any service runs.

use axum::http::StatusCode;
use gym_checkin::db::CheckInsRepository;
use gym_checkin::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_check_in_coordinates_out_of_range() {
    let (app, state, _) = common::create_test_app();
    let (user, token) = common::user_with_token(&state, "member@example.com", Role::Member).await;
    let gym = common::create_gym(&state, "JavaScript Gym", -27.2092052, -49.6401091).await;

    for body in [
        json!({ "latitude": 91.0, "longitude": 0.0 }),
        json!({ "latitude": 0.0, "longitude": -180.5 }),
    ] {
        let response = app
            .clone()
            .oneshot(common::request(
                "POST",
                &format!("/gyms/{}/checkins", gym.id),
                Some(&token),
                Some(body),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = common::json_body(response).await;
        assert_eq!(body["error"], "validation_error");
    }

    assert_eq!(state.check_ins.count_by_user(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_check_in_missing_coordinates() {
    let (app, state, _) = common::create_test_app();
    let (_, token) = common::user_with_token(&state, "member@example.com", Role::Member).await;
    let gym = common::create_gym(&state, "JavaScript Gym", -27.2092052, -49.6401091).await;

    let response = app
        .oneshot(common::request(
            "POST",
            &format!("/gyms/{}/checkins", gym.id),
            Some(&token),
            Some(json!({ "latitude": -27.2092052 })),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_malformed_ids_in_path() {
    let (app, state, _) = common::create_test_app();
    let (_, member) = common::user_with_token(&state, "member@example.com", Role::Member).await;
    let (_, admin) = common::user_with_token(&state, "admin@example.com", Role::Admin).await;

    let response = app
        .clone()
        .oneshot(common::request(
            "POST",
            "/gyms/not-a-uuid/checkins",
            Some(&member),
            Some(json!({ "latitude": 0.0, "longitude": 0.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::request(
            "PATCH",
            "/checkins/not-a-uuid/validate",
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requires_query() {
    let (app, state, _) = common::create_test_app();
    let (_, token) = common::user_with_token(&state, "member@example.com", Role::Member).await;

    for uri in ["/gyms/search", "/gyms/search?q=", "/gyms/search?q=Gym&page=0"] {
        let response = app
            .clone()
            .oneshot(common::request("GET", uri, Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_create_gym_rejects_bad_body() {
    let (app, state, _) = common::create_test_app();
    let (_, admin) = common::user_with_token(&state, "admin@example.com", Role::Admin).await;

    for body in [
        json!({ "title": "", "latitude": 0.0, "longitude": 0.0 }),
        json!({ "title": "Gym", "latitude": -90.1, "longitude": 0.0 }),
    ] {
        let response = app
            .clone()
            .oneshot(common::request("POST", "/gyms", Some(&admin), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
