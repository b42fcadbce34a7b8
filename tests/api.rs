use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use match_tracker_back::{
    config::AppConfig,
    dao::fixture_store::MemoryFixtureStore,
    routes,
    state::{AppState, SharedState},
};

async fn app() -> (Router, SharedState) {
    let state = AppState::new(AppConfig::default());
    state.set_store(Arc::new(MemoryFixtureStore::new())).await;
    (routes::router(state.clone()), state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_fixture(app: &Router, competition: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/fixtures",
        Some(json!({
            "homeTeam": "Clare",
            "awayTeam": "Cork",
            "competition": competition,
            "season": "2026"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_owned()
}

fn lineup(prefix: &str) -> Value {
    json!({
        "starting": [
            {"playerId": format!("{prefix}-1"), "name": "Keeper", "jerseyNumber": 1},
            {"playerId": format!("{prefix}-11"), "name": "Forward", "jerseyNumber": 11}
        ],
        "bench": [
            {"playerId": format!("{prefix}-16"), "name": "Sub", "jerseyNumber": 16}
        ]
    })
}

#[tokio::test]
async fn healthcheck_reports_degraded_without_store() {
    let state = AppState::new(AppConfig::default());
    let app = routes::router(state.clone());

    let (status, body) = call(&app, "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, _) = call(
        &app,
        "POST",
        "/fixtures",
        Some(json!({"homeTeam": "A", "awayTeam": "B", "competition": "L", "season": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    state.set_store(Arc::new(MemoryFixtureStore::new())).await;
    let (_, body) = call(&app, "GET", "/healthcheck", None).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_fixture_is_404() {
    let (app, _) = app().await;
    let uri = format!("/fixtures/{}/match-state", uuid::Uuid::new_v4());
    let (status, body) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn blank_team_name_is_rejected() {
    let (app, _) = app().await;
    let (status, _) = call(
        &app,
        "POST",
        "/fixtures",
        Some(json!({"homeTeam": "  ", "awayTeam": "Cork", "competition": "L", "season": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn start_with_empty_away_lineup_returns_checklist() {
    let (app, _) = app().await;
    let id = create_fixture(&app, "League").await;
    let (status, _) = call(&app, "PUT", &format!("/fixtures/{id}/squads/HOME"), Some(lineup("h"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "POST", &format!("/fixtures/{id}/match-state/start"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["checklist"].as_array().unwrap().len(), 1);

    let (_, state) = call(&app, "GET", &format!("/fixtures/{id}/match-state"), None).await;
    assert_eq!(state["status"], "NOT_STARTED");
}

#[tokio::test]
async fn lifecycle_and_versioned_update() {
    let (app, _) = app().await;
    let id = create_fixture(&app, "League").await;
    for side in ["HOME", "AWAY"] {
        call(&app, "PUT", &format!("/fixtures/{id}/squads/{side}"), Some(lineup(side))).await;
    }

    let (status, started) = call(&app, "POST", &format!("/fixtures/{id}/match-state/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "IN_PROGRESS");
    assert_eq!(started["version"], 1);

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/fixtures/{id}/match-state"),
        Some(json!({"matchClock": 600, "expectedVersion": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matchClock"], 600);

    let (status, _) = call(
        &app,
        "PUT",
        &format!("/fixtures/{id}/match-state"),
        Some(json!({"matchClock": 700, "expectedVersion": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "POST", &format!("/fixtures/{id}/match-state/resume"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, done) = call(&app, "POST", &format!("/fixtures/{id}/match-state/complete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");
}

#[tokio::test]
async fn same_batch_twice_scores_once() {
    let (app, _) = app().await;
    let id = create_fixture(&app, "League").await;
    let batch = json!({
        "fixtureId": id,
        "events": [{
            "fixtureId": id,
            "clientId": "a",
            "side": "HOME",
            "timestamp": 100,
            "half": "H1",
            "eventCategory": "Scoring",
            "eventType": "Goal"
        }]
    });

    let (status, first) = call(&app, "POST", "/match-events/batch", Some(batch.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!((first["synced"].clone(), first["duplicates"].clone(), first["failed"].clone()), (json!(1), json!(0), json!(0)));

    let (_, second) = call(&app, "POST", "/match-events/batch", Some(batch)).await;
    assert_eq!((second["synced"].clone(), second["duplicates"].clone(), second["failed"].clone()), (json!(0), json!(1), json!(0)));
    assert_eq!(second["acknowledged"], json!(["a"]));

    let (_, state) = call(&app, "GET", &format!("/fixtures/{id}/match-state"), None).await;
    assert_eq!(state["homeGoals"], 1);
    assert_eq!(state["homeTotal"], 3);

    let (_, log) = call(&app, "GET", &format!("/fixtures/{id}/events"), None).await;
    assert_eq!(log.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_event_type_fails_its_row_only() {
    let (app, _) = app().await;
    let id = create_fixture(&app, "League").await;
    let row = |client_id: &str, event_type: &str, ts: u32| {
        json!({
            "fixtureId": id,
            "clientId": client_id,
            "side": "HOME",
            "timestamp": ts,
            "half": "H1",
            "eventCategory": "Scoring",
            "eventType": event_type
        })
    };
    let (status, body) = call(
        &app,
        "POST",
        "/match-events/batch",
        Some(json!({
            "fixtureId": id,
            "events": [row("good", "Point", 100), row("newer", "Own Goal", 200)]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synced"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["acknowledged"], json!(["good"]));

    let (_, log) = call(&app, "GET", &format!("/fixtures/{id}/events"), None).await;
    assert_eq!(log.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn batch_without_fixture_id_is_400() {
    let (app, _) = app().await;
    let (status, _) = call(
        &app,
        "POST",
        "/match-events/batch",
        Some(json!({"fixtureId": uuid::Uuid::nil(), "events": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_and_edit_round_trip() {
    let (app, _) = app().await;
    let id = create_fixture(&app, "League").await;
    let event = |client_id: &str, event_type: &str, ts: u32| {
        json!({
            "fixtureId": id,
            "clientId": client_id,
            "side": "HOME",
            "timestamp": ts,
            "half": "H1",
            "eventCategory": "Scoring",
            "eventType": event_type
        })
    };
    call(
        &app,
        "POST",
        "/match-events/batch",
        Some(json!({
            "fixtureId": id,
            "events": [event("g", "Goal", 100), event("p", "Point", 200), event("w", "Wide", 300)]
        })),
    )
    .await;

    let (status, report) = call(&app, "GET", &format!("/fixtures/{id}/report?side=HOME"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["teamTotals"]["goals"], 1);
    assert_eq!(report["teamTotals"]["points"], 1);
    assert_eq!(report["teamTotals"]["wides"], 1);

    let (status, edited) = call(
        &app,
        "PATCH",
        &format!("/fixtures/{id}/events/w"),
        Some(json!({"zone": "D-left"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["zone"], "D-left");

    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/fixtures/{id}/events/missing"),
        Some(json!({"zone": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, benchmarks) = call(&app, "GET", &format!("/fixtures/{id}/benchmarks"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(benchmarks["sampleSize"], 0);
}

#[tokio::test]
async fn delete_removes_fixture() {
    let (app, _) = app().await;
    let id = create_fixture(&app, "League").await;
    let (status, _) = call(&app, "DELETE", &format!("/fixtures/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", &format!("/fixtures/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "DELETE", &format!("/fixtures/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
