//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use funnel_api::{router, AppState};
use funnel_core::{CaptureSink, MarketId, PresetName, SimulationEvent};
use funnel_presets::PresetLibrary;
use funnel_store::{ParameterStore, SimulationSession};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;

/// Router wired the way `serve` wires it: the store emits through the
/// session's mute-gated sink.
fn app_with_sink() -> (Router, Arc<ParameterStore>, Arc<CaptureSink>) {
    let capture = Arc::new(CaptureSink::new());
    let session = SimulationSession::new(MarketId::Ch, false).with_sink(capture.clone());
    let store = Arc::new(
        ParameterStore::new(Arc::new(PresetLibrary::reference())).with_sink(session.sink()),
    );
    let state = AppState {
        store: store.clone(),
        session: Arc::new(Mutex::new(session)),
        node_id: "test-node".to_string(),
        start_time: Instant::now(),
    };
    (router(state), store, capture)
}

fn app() -> (Router, Arc<ParameterStore>) {
    let (app, store, _) = app_with_sink();
    (app, store)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_list_markets() {
    let (app, _) = app();
    let (status, body) = send(app, Method::GET, "/v1/markets", None).await;
    assert_eq!(status, StatusCode::OK);
    let markets = body.as_array().unwrap();
    assert_eq!(markets.len(), 4);
    assert_eq!(markets[0]["market"], "CH");
    assert_eq!(markets[0]["displayName"], "Switzerland");
    assert_eq!(markets[0]["activePreset"], "realistic");
}

#[tokio::test]
async fn test_funnel_matches_reference_scenario() {
    let (app, _) = app();
    let (status, body) = send(app, Method::GET, "/v1/markets/ch/funnel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projection"]["ftds"], 204);
    assert_eq!(body["projection"]["stages"][0]["output"], 2_430_000);
}

#[tokio::test]
async fn test_patch_merges_and_recomputes() {
    let (app, store) = app();
    let (status, body) = send(
        app,
        Method::PATCH,
        "/v1/markets/CH/params",
        Some(json!({ "totalViews": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"]["targetShare"], 18.0);
    assert_eq!(body["projection"]["ftds"], 0);
    assert_eq!(body["projection"]["efficiency"], 0.0);
    assert_eq!(body["activePreset"], Value::Null);
    assert_eq!(store.get(MarketId::Ch).unwrap().total_views, 0);
    assert_eq!(store.get(MarketId::De).unwrap().total_views, 45_000_000);
}

#[tokio::test]
async fn test_patch_response_carries_merged_record() {
    let (app, store) = app();
    send(
        app.clone(),
        Method::PATCH,
        "/v1/markets/UK/params",
        Some(json!({ "revshareRate": 35.0 })),
    )
    .await;
    let (status, body) = send(
        app,
        Method::PATCH,
        "/v1/markets/UK/params",
        Some(json!({ "ftdRate": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"]["revshareRate"], 35.0);
    assert_eq!(body["params"]["ftdRate"], 50.0);
    let stored = serde_json::to_value(store.get(MarketId::Uk).unwrap()).unwrap();
    assert_eq!(body["params"], stored);
}

#[tokio::test]
async fn test_apply_preset_replaces_record() {
    let (app, store) = app();
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/markets/UK/presets/optimistic",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activePreset"], "optimistic");
    assert_eq!(store.get(MarketId::Uk).unwrap().total_views, 85_000_000);
}

#[tokio::test]
async fn test_unknown_market_and_preset_are_404() {
    let (app, _) = app();
    let (status, body) = send(app.clone(), Method::GET, "/v1/markets/FR/params", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_market");

    let (status, body) = send(app, Method::POST, "/v1/markets/CH/presets/wild", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_preset");
}

#[tokio::test]
async fn test_presets_and_bounds() {
    let (app, _) = app();
    let (status, body) = send(app.clone(), Method::GET, "/v1/markets/RO/presets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["presets"]["optimistic"]["label"], "viral");

    let (status, body) = send(app, Method::GET, "/v1/markets/RO/bounds", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["click"]["max"], 60.0);
    assert_eq!(body["totalViews"]["step"], 1_000_000);
}

#[tokio::test]
async fn test_report_snapshot() {
    let (app, _) = app();
    let (status, body) = send(app, Method::GET, "/v1/markets/DE/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marketName"], "Germany");
    assert_eq!(body["ftds"], 897);
    assert_eq!(body["rows"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_session_toggle_and_mute() {
    let (app, _) = app();
    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/v1/session/stages/ftd/toggle",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["type"], "success_reached");
    assert_eq!(body["state"]["expanded"], "ftd");

    let (status, body) = send(
        app.clone(),
        Method::PUT,
        "/v1/session/muted",
        Some(json!({ "muted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["muted"], true);

    let (_, body) = send(app, Method::POST, "/v1/session/market/uk", None).await;
    assert_eq!(body["activeMarket"], "UK");
}

#[tokio::test]
async fn test_probes() {
    let (app, _) = app();
    let (status, body) = send(app.clone(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markets"], 4);
    let (status, _) = send(app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_muted_session_silences_preset_events() {
    let (app, _, capture) = app_with_sink();
    send(
        app.clone(),
        Method::PUT,
        "/v1/session/muted",
        Some(json!({ "muted": true })),
    )
    .await;
    let (status, _) = send(
        app.clone(),
        Method::POST,
        "/v1/markets/CH/presets/optimistic",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    send(
        app.clone(),
        Method::PATCH,
        "/v1/markets/CH/params",
        Some(json!({ "totalViews": 1_000_000 })),
    )
    .await;
    assert_eq!(capture.count(), 0);

    send(
        app.clone(),
        Method::PUT,
        "/v1/session/muted",
        Some(json!({ "muted": false })),
    )
    .await;
    send(app, Method::POST, "/v1/markets/CH/presets/conservative", None).await;
    assert_eq!(
        capture.events(),
        vec![SimulationEvent::PresetApplied {
            market: MarketId::Ch,
            preset: PresetName::Conservative
        }]
    );
}
