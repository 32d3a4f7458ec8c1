//! REST handlers for market parameters, presets, projections, reports and
//! the simulation session.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use funnel_core::{
    FunnelError, FunnelParameters, MarketId, ParameterPatch, PresetName, SimulationEvent,
    StageKind,
};
use funnel_engine::{FunnelProjection, StageBounds};
use funnel_presets::PresetSet;
use funnel_reporting::FunnelReport;
use funnel_store::{ParameterStore, SessionState, SimulationSession};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ParameterStore>,
    pub session: Arc<Mutex<SimulationSession>>,
    pub node_id: String,
    pub start_time: Instant,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn error_response(err: FunnelError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &err {
        FunnelError::UnknownMarket(_) => (StatusCode::NOT_FOUND, "unknown_market"),
        FunnelError::UnknownPreset(_) => (StatusCode::NOT_FOUND, "unknown_preset"),
        FunnelError::UnknownStage(_) => (StatusCode::NOT_FOUND, "unknown_stage"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status == StatusCode::NOT_FOUND {
        metrics::counter!("api.not_found").increment(1);
    }
    warn!(error = %err, "Request rejected");
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

fn parse_market(raw: &str) -> Result<MarketId, (StatusCode, Json<ErrorResponse>)> {
    raw.parse().map_err(error_response)
}

/// Build the response from a record already read or written by the caller,
/// so a concurrent write to the same market cannot leak into it.
fn funnel_view(
    store: &ParameterStore,
    market: MarketId,
    params: FunnelParameters,
) -> Result<FunnelResponse, FunnelError> {
    let active_preset = store.library().active_preset(market, &params)?;
    Ok(FunnelResponse {
        market,
        projection: FunnelProjection::compute(&params),
        params,
        active_preset,
    })
}

// ─── Markets ───────────────────────────────────────────────────────────────

/// GET /v1/markets: every market with its current record.
#[utoipa::path(
    get,
    path = "/v1/markets",
    tag = "Markets",
    responses((status = 200, description = "Market list", body = Vec<MarketSummary>))
)]
pub async fn list_markets(State(state): State<AppState>) -> ApiResult<Vec<MarketSummary>> {
    metrics::counter!("api.requests").increment(1);
    let library = state.store.library();
    let mut markets = Vec::new();
    for (market, params) in state.store.snapshot() {
        markets.push(MarketSummary {
            market,
            display_name: library
                .display_name(market)
                .map_err(error_response)?
                .to_string(),
            active_preset: library
                .active_preset(market, &params)
                .map_err(error_response)?,
            params,
        });
    }
    Ok(Json(markets))
}

#[utoipa::path(
    get,
    path = "/v1/markets/{market}/params",
    tag = "Markets",
    params(("market" = String, Path, description = "Market code, e.g. CH")),
    responses(
        (status = 200, description = "Current parameters", body = FunnelParameters),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn get_params(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> ApiResult<FunnelParameters> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    state.store.get(market).map(Json).map_err(error_response)
}

/// PATCH /v1/markets/{market}/params: shallow merge, no range checks.
#[utoipa::path(
    patch,
    path = "/v1/markets/{market}/params",
    tag = "Markets",
    params(("market" = String, Path, description = "Market code")),
    request_body = ParameterPatch,
    responses(
        (status = 200, description = "Updated funnel", body = FunnelResponse),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn update_params(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Json(patch): Json<ParameterPatch>,
) -> ApiResult<FunnelResponse> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    let params = state.store.update(market, &patch).map_err(error_response)?;
    funnel_view(&state.store, market, params)
        .map(Json)
        .map_err(error_response)
}

#[utoipa::path(
    get,
    path = "/v1/markets/{market}/funnel",
    tag = "Markets",
    params(("market" = String, Path, description = "Market code")),
    responses(
        (status = 200, description = "Projected funnel", body = FunnelResponse),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn get_funnel(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> ApiResult<FunnelResponse> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    let params = state.store.get(market).map_err(error_response)?;
    funnel_view(&state.store, market, params)
        .map(Json)
        .map_err(error_response)
}

#[utoipa::path(
    get,
    path = "/v1/markets/{market}/bounds",
    tag = "Markets",
    params(("market" = String, Path, description = "Market code")),
    responses(
        (status = 200, description = "Control bounds", body = StageBounds),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn get_bounds(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> ApiResult<StageBounds> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    state
        .store
        .library()
        .bounds(market)
        .map(|b| Json(*b))
        .map_err(error_response)
}

// ─── Presets ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/v1/markets/{market}/presets",
    tag = "Presets",
    params(("market" = String, Path, description = "Market code")),
    responses(
        (status = 200, description = "Preset set and highlighted preset", body = PresetsResponse),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn list_presets(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> ApiResult<PresetsResponse> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    let presets = state
        .store
        .library()
        .presets_for(market)
        .map_err(error_response)?
        .clone();
    let active_preset = state.store.active_preset(market).map_err(error_response)?;
    Ok(Json(PresetsResponse {
        market,
        presets,
        active_preset,
    }))
}

/// POST /v1/markets/{market}/presets/{preset}: full replace.
#[utoipa::path(
    post,
    path = "/v1/markets/{market}/presets/{preset}",
    tag = "Presets",
    params(
        ("market" = String, Path, description = "Market code"),
        ("preset" = String, Path, description = "conservative | realistic | optimistic"),
    ),
    responses(
        (status = 200, description = "Preset applied", body = FunnelResponse),
        (status = 404, description = "Unknown market or preset", body = ErrorResponse),
    )
)]
pub async fn apply_preset(
    State(state): State<AppState>,
    Path((market, preset)): Path<(String, String)>,
) -> ApiResult<FunnelResponse> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    let preset: PresetName = preset.parse().map_err(error_response)?;
    let params = state
        .store
        .apply_preset(market, preset)
        .map_err(error_response)?;
    info!(market = %market, preset = %preset, "Preset applied via API");
    funnel_view(&state.store, market, params)
        .map(Json)
        .map_err(error_response)
}

// ─── Reports ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/v1/markets/{market}/report",
    tag = "Reports",
    params(("market" = String, Path, description = "Market code")),
    responses(
        (status = 200, description = "Report snapshot", body = FunnelReport),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> ApiResult<FunnelReport> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    let params = state.store.get(market).map_err(error_response)?;
    let name = state
        .store
        .library()
        .display_name(market)
        .map_err(error_response)?;
    Ok(Json(FunnelReport::build(market, name, &params, Utc::now())))
}

// ─── Session ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses((status = 200, description = "Session state", body = SessionState))
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    metrics::counter!("api.requests").increment(1);
    Json(state.session.lock().state())
}

#[utoipa::path(
    post,
    path = "/v1/session/market/{market}",
    tag = "Session",
    params(("market" = String, Path, description = "Market code")),
    responses(
        (status = 200, description = "Market selected", body = SessionState),
        (status = 404, description = "Unknown market", body = ErrorResponse),
    )
)]
pub async fn select_market(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> ApiResult<SessionState> {
    metrics::counter!("api.requests").increment(1);
    let market = parse_market(&market)?;
    let mut session = state.session.lock();
    session.select_market(market);
    Ok(Json(session.state()))
}

#[utoipa::path(
    post,
    path = "/v1/session/stages/{stage}/toggle",
    tag = "Session",
    params(("stage" = String, Path, description = "reach | intent | click | signup | ftd")),
    responses(
        (status = 200, description = "Stage toggled", body = ToggleResponse),
        (status = 404, description = "Unknown stage", body = ErrorResponse),
    )
)]
pub async fn toggle_stage(
    State(state): State<AppState>,
    Path(stage): Path<String>,
) -> ApiResult<ToggleResponse> {
    metrics::counter!("api.requests").increment(1);
    let stage: StageKind = stage.parse().map_err(error_response)?;
    let mut session = state.session.lock();
    let event = session.toggle_stage(stage);
    Ok(Json(ToggleResponse {
        event,
        state: session.state(),
    }))
}

#[utoipa::path(
    put,
    path = "/v1/session/muted",
    tag = "Session",
    request_body = MuteRequest,
    responses((status = 200, description = "Mute flag set", body = SessionState))
)]
pub async fn set_muted(
    State(state): State<AppState>,
    Json(req): Json<MuteRequest>,
) -> Json<SessionState> {
    metrics::counter!("api.requests").increment(1);
    let mut session = state.session.lock();
    session.set_muted(req.muted);
    Json(session.state())
}

// ─── Operations ────────────────────────────────────────────────────────────

/// GET /health: Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        markets: state.store.snapshot().len(),
    })
}

/// GET /ready: ready once the store holds at least one market.
#[utoipa::path(get, path = "/ready", tag = "Operations", responses(
    (status = 200, description = "Ready"),
    (status = 503, description = "No markets loaded"),
))]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.store.snapshot().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live: Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

// ─── Payloads ──────────────────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub market: MarketId,
    pub display_name: String,
    pub active_preset: Option<PresetName>,
    pub params: FunnelParameters,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelResponse {
    pub market: MarketId,
    pub params: FunnelParameters,
    pub projection: FunnelProjection,
    pub active_preset: Option<PresetName>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresetsResponse {
    pub market: MarketId,
    pub presets: PresetSet,
    pub active_preset: Option<PresetName>,
}

#[derive(Serialize, ToSchema)]
pub struct ToggleResponse {
    pub event: SimulationEvent,
    pub state: SessionState,
}

#[derive(Deserialize, ToSchema)]
pub struct MuteRequest {
    pub muted: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub markets: usize,
}
