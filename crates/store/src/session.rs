//! Per-session view state: which market is shown, which funnel stage is
//! expanded, and whether notifications are muted.

use funnel_core::{EventSink, GatedSink, MarketId, NoOpSink, SimulationEvent, StageKind};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub active_market: MarketId,
    pub expanded: Option<StageKind>,
    pub muted: bool,
}

pub struct SimulationSession {
    state: SessionState,
    sink: Arc<GatedSink>,
}

impl SimulationSession {
    pub fn new(active_market: MarketId, muted: bool) -> Self {
        Self {
            state: SessionState {
                active_market,
                expanded: None,
                muted,
            },
            sink: Arc::new(GatedSink::new(Arc::new(NoOpSink), muted)),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Arc::new(GatedSink::new(sink, self.state.muted));
        self
    }

    /// The session's mute-gated sink. Hand it to every other emitter that
    /// should fall silent with the session, e.g. the parameter store.
    pub fn sink(&self) -> Arc<dyn EventSink> {
        self.sink.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_market(&self) -> MarketId {
        self.state.active_market
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
        self.sink.set_muted(muted);
    }

    pub fn select_market(&mut self, market: MarketId) {
        self.state.active_market = market;
        self.sink.emit(SimulationEvent::MarketSelected { market });
    }

    /// Expand `stage`, or collapse it if it is already expanded. Opening the
    /// FTD stage reports `SuccessReached` instead of `StageExpanded`.
    pub fn toggle_stage(&mut self, stage: StageKind) -> SimulationEvent {
        let event = if self.state.expanded == Some(stage) {
            self.state.expanded = None;
            SimulationEvent::StageCollapsed { stage }
        } else {
            self.state.expanded = Some(stage);
            if stage == StageKind::Ftd {
                SimulationEvent::SuccessReached
            } else {
                SimulationEvent::StageExpanded { stage }
            }
        };
        self.sink.emit(event.clone());
        event
    }
}
