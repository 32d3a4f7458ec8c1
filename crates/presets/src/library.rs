use crate::catalog;
use funnel_core::{FunnelError, FunnelParameters, FunnelResult, MarketId, PresetName};
use funnel_engine::StageBounds;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use utoipa::ToSchema;

/// A complete parameter record under a scenario name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Preset {
    pub name: PresetName,
    /// Scenario label shown to users; defaults to the preset name.
    pub label: String,
    pub params: FunnelParameters,
}

impl Preset {
    pub fn new(name: PresetName, params: FunnelParameters) -> Self {
        Self {
            name,
            label: name.as_str().to_string(),
            params,
        }
    }

    pub fn labelled(name: PresetName, label: &str, params: FunnelParameters) -> Self {
        Self {
            name,
            label: label.to_string(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PresetSet {
    pub conservative: Preset,
    pub realistic: Preset,
    pub optimistic: Preset,
}

impl PresetSet {
    pub fn get(&self, name: PresetName) -> &Preset {
        match name {
            PresetName::Conservative => &self.conservative,
            PresetName::Realistic => &self.realistic,
            PresetName::Optimistic => &self.optimistic,
        }
    }

    /// Presets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        [&self.conservative, &self.realistic, &self.optimistic].into_iter()
    }

    /// First preset whose view count equals `total_views`.
    ///
    /// Only `total_views` is compared: a record with hand-edited rates still
    /// reports the preset whose view count it shares.
    pub fn matching_views(&self, total_views: u64) -> Option<PresetName> {
        self.iter()
            .find(|p| p.params.total_views == total_views)
            .map(|p| p.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketProfile {
    pub market: MarketId,
    pub display_name: String,
    pub presets: PresetSet,
    pub bounds: StageBounds,
}

/// Market-keyed table of preset sets.
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    markets: BTreeMap<MarketId, MarketProfile>,
}

impl PresetLibrary {
    pub fn new(profiles: impl IntoIterator<Item = MarketProfile>) -> Self {
        let markets: BTreeMap<_, _> = profiles.into_iter().map(|p| (p.market, p)).collect();
        debug!(markets = markets.len(), "Preset library loaded");
        Self { markets }
    }

    /// The built-in CH/DE/UK/RO table.
    pub fn reference() -> Self {
        Self::new(catalog::reference_profiles())
    }

    pub fn markets(&self) -> impl Iterator<Item = MarketId> + '_ {
        self.markets.keys().copied()
    }

    pub fn profile(&self, market: MarketId) -> FunnelResult<&MarketProfile> {
        self.markets
            .get(&market)
            .ok_or_else(|| FunnelError::UnknownMarket(market.to_string()))
    }

    pub fn presets_for(&self, market: MarketId) -> FunnelResult<&PresetSet> {
        Ok(&self.profile(market)?.presets)
    }

    pub fn preset(&self, market: MarketId, name: PresetName) -> FunnelResult<FunnelParameters> {
        Ok(self.presets_for(market)?.get(name).params.clone())
    }

    pub fn bounds(&self, market: MarketId) -> FunnelResult<&StageBounds> {
        Ok(&self.profile(market)?.bounds)
    }

    pub fn display_name(&self, market: MarketId) -> FunnelResult<&str> {
        Ok(&self.profile(market)?.display_name)
    }

    /// Preset highlighted for `params`; see [`PresetSet::matching_views`].
    pub fn active_preset(
        &self,
        market: MarketId,
        params: &FunnelParameters,
    ) -> FunnelResult<Option<PresetName>> {
        Ok(self.presets_for(market)?.matching_views(params.total_views))
    }

    pub fn is_active(
        &self,
        market: MarketId,
        name: PresetName,
        params: &FunnelParameters,
    ) -> FunnelResult<bool> {
        Ok(self.presets_for(market)?.get(name).params.total_views == params.total_views)
    }
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self::reference()
    }
}
