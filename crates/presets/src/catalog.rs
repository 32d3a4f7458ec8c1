//! Reference scenario data. Static configuration, not computed.

use crate::library::{MarketProfile, Preset, PresetSet};
use funnel_core::{FunnelParameters, MarketId, PresetName};
use funnel_engine::{RateBounds, StageBounds, ViewsBounds};

fn params(
    views: u64,
    share: f64,
    visit: f64,
    click: f64,
    signup: f64,
    ftd: f64,
) -> FunnelParameters {
    FunnelParameters::new(views, share, visit, click, signup, ftd)
}

fn standard_set(
    conservative: FunnelParameters,
    realistic: FunnelParameters,
    optimistic: FunnelParameters,
) -> PresetSet {
    PresetSet {
        conservative: Preset::new(PresetName::Conservative, conservative),
        realistic: Preset::new(PresetName::Realistic, realistic),
        optimistic: Preset::new(PresetName::Optimistic, optimistic),
    }
}

fn profile(
    market: MarketId,
    display_name: &str,
    presets: PresetSet,
    bounds: StageBounds,
) -> MarketProfile {
    MarketProfile {
        market,
        display_name: display_name.to_string(),
        presets,
        bounds,
    }
}

/// RO runs on coarser view steps and allows a higher click-through ceiling.
fn romania_bounds() -> StageBounds {
    StageBounds {
        total_views: ViewsBounds {
            min: 1_000_000,
            max: 300_000_000,
            step: 1_000_000,
        },
        click: RateBounds::new(5.0, 60.0, 1.0),
        ..StageBounds::default()
    }
}

pub fn reference_profiles() -> Vec<MarketProfile> {
    vec![
        profile(
            MarketId::Ch,
            "Switzerland",
            standard_set(
                params(5_000_000, 10.0, 0.4, 8.0, 12.0, 20.0),
                params(13_500_000, 18.0, 0.8, 15.0, 20.0, 35.0),
                params(45_000_000, 25.0, 1.2, 25.0, 35.0, 50.0),
            ),
            StageBounds::default(),
        ),
        profile(
            MarketId::De,
            "Germany",
            standard_set(
                params(20_000_000, 40.0, 0.3, 6.0, 10.0, 18.0),
                params(45_000_000, 55.0, 0.6, 12.0, 18.0, 28.0),
                params(120_000_000, 80.0, 1.0, 20.0, 28.0, 45.0),
            ),
            StageBounds::default(),
        ),
        profile(
            MarketId::Uk,
            "United Kingdom",
            standard_set(
                params(15_000_000, 100.0, 0.5, 10.0, 15.0, 25.0),
                params(35_000_000, 100.0, 1.1, 18.0, 25.0, 42.0),
                params(85_000_000, 100.0, 1.6, 30.0, 38.0, 55.0),
            ),
            StageBounds::default(),
        ),
        profile(
            MarketId::Ro,
            "Romania",
            PresetSet {
                conservative: Preset::labelled(
                    PresetName::Conservative,
                    "translated",
                    params(8_000_000, 90.0, 0.6, 15.0, 20.0, 35.0),
                ),
                realistic: Preset::labelled(
                    PresetName::Realistic,
                    "pacanele",
                    params(35_000_000, 98.0, 1.0, 20.0, 25.0, 35.0),
                ),
                optimistic: Preset::labelled(
                    PresetName::Optimistic,
                    "viral",
                    params(120_000_000, 100.0, 1.5, 25.0, 30.0, 35.0),
                ),
            },
            romania_bounds(),
        ),
    ]
}
