//! Input bounds for the interactive controls. The engine itself never
//! clamps; callers that accept free-form input use these to stay in range.

use funnel_core::{FunnelParameters, StageKind};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RateBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl RateBounds {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ViewsBounds {
    pub min: u64,
    pub max: u64,
    pub step: u64,
}

impl ViewsBounds {
    pub fn clamp(&self, value: u64) -> u64 {
        value.clamp(self.min, self.max)
    }
}

/// Slider ranges for one market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageBounds {
    pub total_views: ViewsBounds,
    pub reach: RateBounds,
    pub intent: RateBounds,
    pub click: RateBounds,
    pub signup: RateBounds,
    pub ftd: RateBounds,
}

impl StageBounds {
    pub fn rate(&self, stage: StageKind) -> &RateBounds {
        match stage {
            StageKind::Reach => &self.reach,
            StageKind::Intent => &self.intent,
            StageKind::Click => &self.click,
            StageKind::Signup => &self.signup,
            StageKind::Ftd => &self.ftd,
        }
    }

    /// Copy of `params` with every funnel input pulled into range.
    /// Pass-through fields are left alone.
    pub fn clamp(&self, params: &FunnelParameters) -> FunnelParameters {
        let mut clamped = params.clone();
        clamped.total_views = self.total_views.clamp(params.total_views);
        for kind in StageKind::ALL {
            clamped.set_rate(kind, self.rate(kind).clamp(params.rate(kind)));
        }
        clamped
    }

    /// Stages whose rate lies outside its bounds.
    pub fn violations(&self, params: &FunnelParameters) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|kind| !self.rate(*kind).contains(params.rate(*kind)))
            .collect()
    }
}

impl Default for StageBounds {
    fn default() -> Self {
        Self {
            total_views: ViewsBounds {
                min: 100_000,
                max: 300_000_000,
                step: 100_000,
            },
            reach: RateBounds::new(1.0, 100.0, 1.0),
            intent: RateBounds::new(0.1, 10.0, 0.1),
            click: RateBounds::new(1.0, 50.0, 1.0),
            signup: RateBounds::new(5.0, 80.0, 1.0),
            ftd: RateBounds::new(1.0, 95.0, 1.0),
        }
    }
}
