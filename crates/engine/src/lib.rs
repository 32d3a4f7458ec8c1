//! Funnel engine: derives stage volumes and overall efficiency from a
//! market's funnel parameters.

pub mod bounds;
pub mod funnel;

pub use bounds::{RateBounds, StageBounds, ViewsBounds};
pub use funnel::{compute_funnel, conversion_efficiency, FunnelProjection, FunnelStage};
