//! Sequential multiplicative funnel. Each stage floors its output to an
//! integer before it becomes the next stage's input.
//!
//! Rates are applied as given: negative rates saturate the stage at zero and
//! rates above 100 yield more output than input. Bounds are the caller's
//! concern (see [`crate::bounds`]).

use funnel_core::{FunnelParameters, StageKind};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct FunnelStage {
    pub kind: StageKind,
    pub input: u64,
    /// Percentage applied to `input`.
    pub rate: f64,
    pub output: u64,
}

impl FunnelStage {
    pub fn drop_off(&self) -> u64 {
        self.input.saturating_sub(self.output)
    }
}

/// `floor(input * rate / 100)`, evaluated as `input * (rate / 100)` in f64.
/// The float-to-int cast saturates, so negative or NaN products become 0.
fn apply_rate(input: u64, rate: f64) -> u64 {
    (input as f64 * (rate / 100.0)).floor() as u64
}

/// Derive all five stages. Pure and deterministic.
pub fn compute_funnel(params: &FunnelParameters) -> [FunnelStage; 5] {
    let mut inflow = params.total_views;
    StageKind::ALL.map(|kind| {
        let rate = params.rate(kind);
        let output = apply_rate(inflow, rate);
        let stage = FunnelStage {
            kind,
            input: inflow,
            rate,
            output,
        };
        inflow = output;
        stage
    })
}

/// FTDs per total view, `0.0` when there are no views.
pub fn conversion_efficiency(params: &FunnelParameters) -> f64 {
    let stages = compute_funnel(params);
    efficiency_of(params.total_views, stages[StageKind::Ftd.index()].output)
}

fn efficiency_of(total_views: u64, ftds: u64) -> f64 {
    if total_views == 0 {
        return 0.0;
    }
    ftds as f64 / total_views as f64
}

/// Computed view over a parameter record: stages plus aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelProjection {
    pub total_views: u64,
    pub stages: [FunnelStage; 5],
    pub ftds: u64,
    /// Ratio in [0, ∞); `0.0` when `total_views` is zero.
    pub efficiency: f64,
}

impl FunnelProjection {
    pub fn compute(params: &FunnelParameters) -> Self {
        let stages = compute_funnel(params);
        let ftds = stages[StageKind::Ftd.index()].output;
        Self {
            total_views: params.total_views,
            stages,
            ftds,
            efficiency: efficiency_of(params.total_views, ftds),
        }
    }

    pub fn stage(&self, kind: StageKind) -> &FunnelStage {
        &self.stages[kind.index()]
    }

    pub fn efficiency_percent(&self) -> f64 {
        self.efficiency * 100.0
    }

    /// Efficiency as a percentage with four decimals, e.g. `"0.0015%"`.
    pub fn format_efficiency_percent(&self) -> String {
        format!("{:.4}%", self.efficiency_percent())
    }
}
