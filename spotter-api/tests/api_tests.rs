//! HTTP API integration tests
//!
//! Exercise the full router with `oneshot`:
//! - identity resolution from bearer tokens
//! - status codes and error bodies per failure category
//! - identification with a fake classifier
//! - the submitter's end-to-end flow

mod helpers;

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use helpers::{gainesville_sighting, json_body, register_cast, request, test_state, FakeClassifier, TEST_IMAGE};
use spotter_api::build_router;
use spotter_api::services::Classifier;

async fn send(app: &axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    (status, json_body(response.into_body()).await)
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_health_requires_no_identity() {
    let app = build_router(test_state(None).await);

    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "spotter-api");
    assert_eq!(body["identification_available"], false);
}

#[tokio::test]
async fn test_species_listing_in_registry_order() {
    let app = build_router(test_state(None).await);

    let (status, body) = send(&app, request("GET", "/api/species", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 17);
    assert_eq!(entries[0]["common_name"], "Air Potato");
    assert_eq!(entries[16]["common_name"], "Cogon Grass");
}

#[tokio::test]
async fn test_submitter_flow_over_http() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    // Alice submits
    let (status, created) = send(
        &app,
        request(
            "POST",
            "/api/sightings",
            Some(&cast.alice.token),
            Some(gainesville_sighting("Air Potato")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["owner_display_name"], "Alice");
    let id = created["id"].as_str().unwrap().to_string();

    // Anyone can read it
    let (status, fetched) = send(&app, request("GET", &format!("/api/sightings/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["species_name"], "Air Potato");
    assert_eq!(fetched["location"]["lat"], 29.6516);

    // Bob cannot edit it
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/sightings/{}", id),
            Some(&cast.bob.token),
            Some(json!({"notes": "hijack"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    // Carol approves, twice
    let approve_uri = format!("/api/sightings/{}/approve", id);
    let (status, approved) = send(&app, request("POST", &approve_uri, Some(&cast.carol.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], cast.carol.id.as_str());

    let (status, body) = send(&app, request("POST", &approve_uri, Some(&cast.carol.token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ALREADY_APPROVED");

    // Alice deletes
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/sightings/{}", id), Some(&cast.alice.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, request("GET", &format!("/api/sightings/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_unauthorized_and_forbidden_are_distinct() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (_, created) = send(
        &app,
        request("POST", "/api/sightings", Some(&cast.alice.token), Some(gainesville_sighting("Camphor"))),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    let approve_uri = format!("/api/sightings/{}/approve", id);

    let (status, body) = send(&app, request("POST", &approve_uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, body) = send(&app, request("POST", &approve_uri, Some(&cast.bob.token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let state = test_state(None).await;
    let app = build_router(state);

    let (status, body) = send(
        &app,
        request("POST", "/api/sightings", Some("not-a-real-token"), Some(gainesville_sighting("Camphor"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    // Reads still work
    let (status, _) = send(&app, request("GET", "/api/sightings", Some("not-a-real-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    for body in [
        json!({"species_name": "Camphor", "lat": 25.76, "lng": -80.19}),
        json!({"species_name": "Camphor", "lat": 29.65}),
        json!({"lat": 29.65, "lng": -82.32}),
        json!({"species_name": "Camphor", "lat": "north", "lng": -82.32}),
    ] {
        let (status, resp) = send(
            &app,
            request("POST", "/api/sightings", Some(&cast.alice.token), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(error_code(&resp), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_client_status_ignored_on_create() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let mut body = gainesville_sighting("Mimosa");
    body["status"] = json!("approved");

    let (status, created) = send(&app, request("POST", "/api/sightings", Some(&cast.alice.token), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
}

#[tokio::test]
async fn test_edit_rejects_status_field() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (_, created) = send(
        &app,
        request("POST", "/api/sightings", Some(&cast.alice.token), Some(gainesville_sighting("Mimosa"))),
    )
    .await;
    let uri = format!("/api/sightings/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&cast.alice.token), Some(json!({"status": "approved"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (_, fetched) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(fetched["status"], "pending");
}

#[tokio::test]
async fn test_invalid_and_missing_ids() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, body) = send(&app, request("GET", "/api/sightings/not-a-uuid", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let missing = Uuid::new_v4();
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/sightings/{}", missing), Some(&cast.carol.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Anonymous writes are 401 whatever the id looks like
    for (method, uri) in [
        ("PUT", "/api/sightings/not-a-uuid"),
        ("DELETE", "/api/sightings/not-a-uuid"),
        ("POST", "/api/sightings/not-a-uuid/approve"),
    ] {
        let (status, body) = send(&app, request(method, uri, None, Some(json!({"notes": "x"})))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(error_code(&body), "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let mut body = gainesville_sighting("Camphor");
    body["notes"] = json!("x".repeat(spotter_api::MAX_BODY_BYTES + 1024 * 1024));

    let (status, resp) = send(&app, request("POST", "/api/sightings", Some(&cast.alice.token), Some(body))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(&resp), "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_list_query_filters() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    send(&app, request("POST", "/api/sightings", Some(&cast.alice.token), Some(gainesville_sighting("Air Potato")))).await;
    send(&app, request("POST", "/api/sightings", Some(&cast.carol.token), Some(gainesville_sighting("Camphor")))).await;

    let (status, body) = send(&app, request("GET", "/api/sightings?status=approved", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["species_name"], "Camphor");

    let uri = format!("/api/sightings?owner={}", cast.alice.id);
    let (_, body) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, request("GET", "/api/sightings?limit=1", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, request("GET", "/api/sightings?status=rejected", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_permissions_endpoint() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (_, created) = send(
        &app,
        request("POST", "/api/sightings", Some(&cast.alice.token), Some(gainesville_sighting("Air Potato"))),
    )
    .await;
    let uri = format!("/api/sightings/{}/permissions", created["id"].as_str().unwrap());

    let (status, perms) = send(&app, request("GET", &uri, Some(&cast.alice.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(perms, json!({"can_edit": true, "can_delete": true, "can_approve": false}));

    let (_, perms) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(perms, json!({"can_edit": false, "can_delete": false, "can_approve": false}));
}

#[tokio::test]
async fn test_current_actor_profile() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, body) = send(&app, request("GET", "/api/actors/me", Some(&cast.carol.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "carol@example.org");
    assert_eq!(body["display_name"], "Carol");
    assert_eq!(body["role"], "admin");

    let (status, body) = send(&app, request("GET", "/api/actors/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_identify_fuzzy_match() {
    let classifier = FakeClassifier::answering("this looks like a fern maybe air potato");
    let state = test_state(Some(classifier.clone() as Arc<dyn Classifier>)).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, body) = send(
        &app,
        request("POST", "/api/identify", Some(&cast.alice.token), Some(json!({"image": TEST_IMAGE}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Air Potato");
    assert_eq!(body["scientific_name"], "Dioscorea bulbifera");
    assert_eq!(body["is_known_species"], true);
    assert_eq!(body["confidence"], "high");
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_identify_unknown_shrub_still_allows_create() {
    let classifier = FakeClassifier::answering("Some unidentified shrub");
    let state = test_state(Some(classifier as Arc<dyn Classifier>)).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, body) = send(
        &app,
        request("POST", "/api/identify", Some(&cast.alice.token), Some(json!({"image": TEST_IMAGE}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Some unidentified shrub");
    assert_eq!(body["is_known_species"], false);
    assert_eq!(body["confidence"], "low");
    assert!(body.get("scientific_name").is_none());

    let (status, created) = send(
        &app,
        request("POST", "/api/sightings", Some(&cast.alice.token), Some(gainesville_sighting("Wedelia"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["species_name"], "Wedelia");
    assert_eq!(created["status"], "pending");
}

#[tokio::test]
async fn test_identify_upstream_failure_is_503() {
    let classifier = FakeClassifier::failing(500);
    let state = test_state(Some(classifier.clone() as Arc<dyn Classifier>)).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, body) = send(
        &app,
        request("POST", "/api/identify", Some(&cast.alice.token), Some(json!({"image": TEST_IMAGE}))),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(&body), "UPSTREAM_UNAVAILABLE");
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_identify_unconfigured_is_503() {
    let state = test_state(None).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, body) = send(
        &app,
        request("POST", "/api/identify", Some(&cast.alice.token), Some(json!({"image": TEST_IMAGE}))),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(&body), "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_identify_requires_identity_and_image() {
    let classifier = FakeClassifier::answering("Camphor");
    let state = test_state(Some(classifier.clone() as Arc<dyn Classifier>)).await;
    let cast = register_cast(&state).await;
    let app = build_router(state);

    let (status, _) = send(
        &app,
        request("POST", "/api/identify", None, Some(json!({"image": TEST_IMAGE}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, request("POST", "/api/identify", Some(&cast.alice.token), Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/identify",
            Some(&cast.alice.token),
            Some(json!({"image": "data:text/plain;base64,aGVsbG8="})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(classifier.call_count(), 0);
}
