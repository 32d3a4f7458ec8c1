//! Shared domain types for the funnel simulator: markets, funnel parameters,
//! configuration, errors and the notification sink.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;

pub use crate::config::AppConfig;
pub use error::{FunnelError, FunnelResult};
pub use event_bus::{CaptureSink, EventSink, GatedSink, NoOpSink, SimulationEvent, TracingSink};
pub use types::{FunnelParameters, MarketId, ParameterPatch, PresetName, StageKind};
