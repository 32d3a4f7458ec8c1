//! API server. HTTP REST surface plus the Prometheus exporter.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use axum::routing::{get, post, put};
use axum::Router;
use funnel_core::config::AppConfig;
use funnel_store::{ParameterStore, SimulationSession};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the application router. Exposed separately so tests can drive it
/// without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Markets
        .route("/v1/markets", get(rest::list_markets))
        .route(
            "/v1/markets/:market/params",
            get(rest::get_params).patch(rest::update_params),
        )
        .route("/v1/markets/:market/funnel", get(rest::get_funnel))
        .route("/v1/markets/:market/bounds", get(rest::get_bounds))
        // Presets
        .route("/v1/markets/:market/presets", get(rest::list_presets))
        .route(
            "/v1/markets/:market/presets/:preset",
            post(rest::apply_preset),
        )
        // Reports
        .route("/v1/markets/:market/report", get(rest::get_report))
        // Session
        .route("/v1/session", get(rest::get_session))
        .route("/v1/session/market/:market", post(rest::select_market))
        .route("/v1/session/stages/:stage/toggle", post(rest::toggle_stage))
        .route("/v1/session/muted", put(rest::set_muted))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Main API server.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<ParameterStore>,
    session: Arc<Mutex<SimulationSession>>,
}

impl ApiServer {
    pub fn new(
        config: AppConfig,
        store: Arc<ParameterStore>,
        session: Arc<Mutex<SimulationSession>>,
    ) -> Self {
        Self {
            config,
            store,
            session,
        }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            store: self.store.clone(),
            session: self.session.clone(),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
        };

        let app = router(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
