use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tower::ServiceExt;

use oddspulse_api::{create_routes, AppState};
use oddspulse_models::OddsField;
use oddspulse_services::{
    spawn_highlight_feed, DerivedViewEngine, FilterStore, HighlightLifecycle, MatchStore,
    OddsUpdateScheduler, SchedulerConfig,
};

fn create_test_app_state() -> AppState {
    let match_store = Arc::new(MatchStore::seeded());
    AppState {
        scheduler: OddsUpdateScheduler::new(match_store.clone(), SchedulerConfig::default())
            .unwrap(),
        highlights: HighlightLifecycle::new(match_store.clone(), Duration::from_secs(2)),
        match_store,
        filter_store: Arc::new(FilterStore::new()),
        views: Arc::new(DerivedViewEngine::new()),
        started_at: Instant::now(),
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_routes().with_state(create_test_app_state());
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_board_lists_seeded_matches() {
    let app = create_routes().with_state(create_test_app_state());
    let (status, body) = send(&app, Method::GET, "/api/v1/matches/all", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let matches = body["data"]["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 12);
    assert_eq!(matches[0]["homeTeam"], "Chelsea");
    assert_eq!(matches[0]["homeOdds"], "1.87");
    assert_eq!(matches[0]["updatedField"], Value::Null);
    assert_eq!(body["data"]["isUpdating"], false);
}

#[tokio::test]
async fn test_date_filter_and_team_sort() {
    let app = create_routes().with_state(create_test_app_state());

    send(
        &app,
        Method::PUT,
        "/api/v1/filters/date",
        Some(json!({ "value": "Feb 4, 2024" })),
    )
    .await;
    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/v1/filters/sort",
        Some(json!({ "key": "team" })),
    )
    .await;
    assert_eq!(body["data"]["sortBy"], "team");
    assert_eq!(body["data"]["sortDirection"], "asc");

    let (_, body) = send(&app, Method::GET, "/api/v1/matches", None).await;
    let teams: Vec<&str> = body["data"]["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["homeTeam"].as_str().unwrap())
        .collect();
    assert_eq!(teams, vec!["Atletico Madrid", "Real Madrid"]);
    assert_eq!(body["data"]["status"]["filteredMatches"], 2);
    assert_eq!(body["data"]["dates"].as_array().unwrap().len(), 6);

    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/v1/filters/sort-direction",
        Some(json!({ "direction": "desc" })),
    )
    .await;
    assert_eq!(body["data"]["sortDirection"], "desc");

    let (_, body) = send(&app, Method::GET, "/api/v1/matches", None).await;
    assert_eq!(body["data"]["matches"][0]["homeTeam"], "Real Madrid");
}

#[tokio::test]
async fn test_unknown_sort_key_is_rejected() {
    let app = create_routes().with_state(create_test_app_state());
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/filters/sort",
        Some(json!({ "key": "kickoff" })),
    )
    .await;

    assert!(status.is_client_error());
}

#[tokio::test(start_paused = true)]
async fn test_updated_matches_follow_highlight_lifecycle() {
    let state = create_test_app_state();
    let feed = spawn_highlight_feed(state.match_store.subscribe(), state.highlights.clone());
    let app = create_routes().with_state(state.clone());

    state
        .match_store
        .apply_specific_update("9", OddsField::Away, "4.80");
    sleep(Duration::from_millis(100)).await;

    let (_, body) = send(&app, Method::GET, "/api/v1/matches/updated", None).await;
    let updated = body["data"].as_array().unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0]["id"], "9");
    assert_eq!(updated[0]["updatedField"], "away");
    assert_eq!(updated[0]["awayOdds"], "4.80");

    let (_, body) = send(&app, Method::GET, "/api/v1/simulation/status", None).await;
    assert_eq!(body["data"]["pendingHighlights"], 1);

    sleep(Duration::from_millis(2000)).await;
    let (_, body) = send(&app, Method::GET, "/api/v1/matches/updated", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    feed.abort();
}

#[tokio::test(start_paused = true)]
async fn test_simulation_runs_on_schedule() {
    let state = create_test_app_state();
    let app = create_routes().with_state(state.clone());

    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/v1/simulation/interval",
        Some(json!({ "intervalMs": 500 })),
    )
    .await;
    assert_eq!(body["data"]["running"], false);

    send(&app, Method::POST, "/api/v1/simulation/start", None).await;
    sleep(Duration::from_millis(1600)).await;

    let (_, body) = send(&app, Method::GET, "/api/v1/simulation/status", None).await;
    assert_eq!(body["data"]["running"], true);
    assert_eq!(body["data"]["updateCount"], 3);
    assert_eq!(body["data"]["maxUpdates"], 1000);

    let (_, body) = send(&app, Method::POST, "/api/v1/simulation/stop", None).await;
    assert_eq!(body["data"]["running"], false);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(state.scheduler.update_count(), 3);
}
