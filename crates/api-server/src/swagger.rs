//! OpenAPI specification served through Swagger UI.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Funnel Simulator API",
        version = "0.1.0",
        description = "What-if funnel projections per market: views, segment share, profile visits, link clicks, sign-ups and first-time deposits.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Markets", description = "Per-market parameters and projected funnel"),
        (name = "Presets", description = "Named scenario bundles"),
        (name = "Reports", description = "Report snapshots for export"),
        (name = "Session", description = "Active market, expanded stage and mute flag"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        crate::rest::list_markets,
        crate::rest::get_params,
        crate::rest::update_params,
        crate::rest::get_funnel,
        crate::rest::get_bounds,
        crate::rest::list_presets,
        crate::rest::apply_preset,
        crate::rest::get_report,
        crate::rest::get_session,
        crate::rest::select_market,
        crate::rest::toggle_stage,
        crate::rest::set_muted,
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        funnel_core::MarketId,
        funnel_core::PresetName,
        funnel_core::StageKind,
        funnel_core::FunnelParameters,
        funnel_core::ParameterPatch,
        funnel_core::SimulationEvent,
        funnel_engine::FunnelStage,
        funnel_engine::FunnelProjection,
        funnel_engine::RateBounds,
        funnel_engine::ViewsBounds,
        funnel_engine::StageBounds,
        funnel_presets::Preset,
        funnel_presets::PresetSet,
        funnel_reporting::FunnelReport,
        funnel_reporting::ReportRow,
        funnel_store::SessionState,
        crate::rest::MarketSummary,
        crate::rest::FunnelResponse,
        crate::rest::PresetsResponse,
        crate::rest::ToggleResponse,
        crate::rest::MuteRequest,
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_market_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/markets"));
        assert!(doc
            .paths
            .paths
            .contains_key("/v1/markets/{market}/presets/{preset}"));
    }
}
