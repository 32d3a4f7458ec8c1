//! In-memory parameter store backed by DashMap.
//!
//! One record per market, seeded from a preset. Records are never removed;
//! derived funnel values are recomputed on every read.

use dashmap::DashMap;
use funnel_core::{
    EventSink, FunnelError, FunnelParameters, FunnelResult, MarketId, NoOpSink, ParameterPatch,
    PresetName, SimulationEvent,
};
use funnel_engine::FunnelProjection;
use funnel_presets::PresetLibrary;
use std::sync::Arc;
use tracing::{debug, info};

/// Thread-safe per-market parameter records. Each market is an independent
/// entry, so writes to one market never touch another.
pub struct ParameterStore {
    records: DashMap<MarketId, FunnelParameters>,
    library: Arc<PresetLibrary>,
    sink: Arc<dyn EventSink>,
}

impl ParameterStore {
    /// Seed every market in `library` from its realistic preset.
    pub fn new(library: Arc<PresetLibrary>) -> Self {
        Self::with_default_preset(library, PresetName::Realistic)
    }

    pub fn with_default_preset(library: Arc<PresetLibrary>, preset: PresetName) -> Self {
        let records = DashMap::new();
        for market in library.markets() {
            if let Ok(params) = library.preset(market, preset) {
                records.insert(market, params);
            }
        }
        info!(markets = records.len(), preset = %preset, "Parameter store seeded");
        Self {
            records,
            library,
            sink: Arc::new(NoOpSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn library(&self) -> &PresetLibrary {
        &self.library
    }

    pub fn get(&self, market: MarketId) -> FunnelResult<FunnelParameters> {
        self.records
            .get(&market)
            .map(|r| r.value().clone())
            .ok_or_else(|| FunnelError::UnknownMarket(market.to_string()))
    }

    /// Shallow-merge `patch` onto the market's record and return the result.
    /// Values are stored as given; range checks belong to the caller.
    pub fn update(
        &self,
        market: MarketId,
        patch: &ParameterPatch,
    ) -> FunnelResult<FunnelParameters> {
        let merged = {
            let mut entry = self
                .records
                .get_mut(&market)
                .ok_or_else(|| FunnelError::UnknownMarket(market.to_string()))?;
            entry.merge(patch);
            entry.value().clone()
        };
        debug!(market = %market, ?patch, "Parameters updated");
        metrics::counter!("store.updates").increment(1);
        self.sink.emit(SimulationEvent::ParametersUpdated { market });
        Ok(merged)
    }

    /// Replace the market's record wholesale with a preset.
    pub fn apply_preset(
        &self,
        market: MarketId,
        preset: PresetName,
    ) -> FunnelResult<FunnelParameters> {
        let params = self.library.preset(market, preset)?;
        {
            let mut entry = self
                .records
                .get_mut(&market)
                .ok_or_else(|| FunnelError::UnknownMarket(market.to_string()))?;
            *entry = params.clone();
        }
        debug!(market = %market, preset = %preset, "Preset applied");
        metrics::counter!("store.presets_applied").increment(1);
        self.sink.emit(SimulationEvent::PresetApplied { market, preset });
        Ok(params)
    }

    pub fn projection(&self, market: MarketId) -> FunnelResult<FunnelProjection> {
        Ok(FunnelProjection::compute(&self.get(market)?))
    }

    pub fn active_preset(&self, market: MarketId) -> FunnelResult<Option<PresetName>> {
        let params = self.get(market)?;
        self.library.active_preset(market, &params)
    }

    /// All records, ordered by market.
    pub fn snapshot(&self) -> Vec<(MarketId, FunnelParameters)> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        records.sort_by_key(|(market, _)| *market);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SimulationSession;
    use funnel_core::{CaptureSink, StageKind};

    fn store() -> ParameterStore {
        ParameterStore::new(Arc::new(PresetLibrary::reference()))
    }

    #[test]
    fn test_seeded_from_realistic() {
        let store = store();
        let ch = store.get(MarketId::Ch).unwrap();
        assert_eq!(ch.total_views, 13_500_000);
        assert_eq!(store.get(MarketId::Uk).unwrap().ftd_rate, 42.0);
        assert_eq!(
            store.active_preset(MarketId::De).unwrap(),
            Some(PresetName::Realistic)
        );
    }

    #[test]
    fn test_custom_default_preset() {
        let store = ParameterStore::with_default_preset(
            Arc::new(PresetLibrary::reference()),
            PresetName::Conservative,
        );
        assert_eq!(store.get(MarketId::De).unwrap().total_views, 20_000_000);
    }

    #[test]
    fn test_partial_update_merges() {
        let store = store();
        let merged = store
            .update(MarketId::Ch, &ParameterPatch::rate(StageKind::Click, 30.0))
            .unwrap();
        assert_eq!(merged.link_click_rate, 30.0);
        assert_eq!(merged.total_views, 13_500_000);
        assert_eq!(store.get(MarketId::Ch).unwrap(), merged);
    }

    #[test]
    fn test_update_does_not_leak_across_markets() {
        let store = store();
        let de_before = store.get(MarketId::De).unwrap();
        store
            .update(MarketId::Ch, &ParameterPatch::views(1_000_000))
            .unwrap();
        assert_eq!(store.get(MarketId::De).unwrap(), de_before);
    }

    #[test]
    fn test_store_accepts_out_of_range_values() {
        let store = store();
        let merged = store
            .update(MarketId::Uk, &ParameterPatch::rate(StageKind::Ftd, 250.0))
            .unwrap();
        assert_eq!(merged.ftd_rate, 250.0);
    }

    #[test]
    fn test_preset_round_trip() {
        let store = store();
        let library = PresetLibrary::reference();
        store
            .update(
                MarketId::Ch,
                &ParameterPatch {
                    revshare_rate: Some(40.0),
                    ..ParameterPatch::views(7)
                },
            )
            .unwrap();

        for preset in PresetName::ALL {
            store.apply_preset(MarketId::Ch, preset).unwrap();
            assert_eq!(
                store.get(MarketId::Ch).unwrap(),
                library.preset(MarketId::Ch, preset).unwrap()
            );
        }
        assert_eq!(store.get(MarketId::Ch).unwrap().revshare_rate, None);
    }

    #[test]
    fn test_manual_views_light_up_preset() {
        let store = store();
        store
            .update(
                MarketId::Ch,
                &ParameterPatch {
                    target_share: Some(50.0),
                    registration_rate: Some(60.0),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .update(MarketId::Ch, &ParameterPatch::views(45_000_000))
            .unwrap();
        assert_eq!(
            store.active_preset(MarketId::Ch).unwrap(),
            Some(PresetName::Optimistic)
        );
    }

    #[test]
    fn test_projection_is_recomputed_on_read() {
        let store = store();
        assert_eq!(store.projection(MarketId::Ch).unwrap().ftds, 204);
        store
            .update(MarketId::Ch, &ParameterPatch::views(0))
            .unwrap();
        let projection = store.projection(MarketId::Ch).unwrap();
        assert_eq!(projection.ftds, 0);
        assert_eq!(projection.efficiency, 0.0);
    }

    #[test]
    fn test_events_reach_sink() {
        let sink = Arc::new(CaptureSink::new());
        let store = store().with_sink(sink.clone());
        store
            .update(MarketId::Uk, &ParameterPatch::views(1))
            .unwrap();
        store
            .apply_preset(MarketId::Uk, PresetName::Conservative)
            .unwrap();
        assert_eq!(
            sink.events(),
            vec![
                SimulationEvent::ParametersUpdated {
                    market: MarketId::Uk
                },
                SimulationEvent::PresetApplied {
                    market: MarketId::Uk,
                    preset: PresetName::Conservative
                },
            ]
        );
    }

    #[test]
    fn test_muted_session_silences_store_events() {
        let capture = Arc::new(CaptureSink::new());
        let mut session = SimulationSession::new(MarketId::Ch, true).with_sink(capture.clone());
        let store = store().with_sink(session.sink());

        store
            .apply_preset(MarketId::Ch, PresetName::Optimistic)
            .unwrap();
        store
            .update(MarketId::Ch, &ParameterPatch::views(5_000_000))
            .unwrap();
        assert_eq!(capture.count(), 0);
        assert_eq!(store.get(MarketId::Ch).unwrap().total_views, 5_000_000);

        session.set_muted(false);
        store
            .apply_preset(MarketId::Ch, PresetName::Conservative)
            .unwrap();
        assert_eq!(
            capture.events(),
            vec![SimulationEvent::PresetApplied {
                market: MarketId::Ch,
                preset: PresetName::Conservative
            }]
        );
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let markets: Vec<_> = store().snapshot().into_iter().map(|(m, _)| m).collect();
        assert_eq!(markets, MarketId::ALL.to_vec());
    }
}
