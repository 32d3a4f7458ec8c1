//! Notification sink: the core signals simulation events into it so that
//! presentation collaborators (sound cues, animations) can react without
//! the core depending on them.

use crate::types::{MarketId, PresetName, StageKind};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    ParametersUpdated { market: MarketId },
    PresetApplied { market: MarketId, preset: PresetName },
    MarketSelected { market: MarketId },
    StageExpanded { stage: StageKind },
    StageCollapsed { stage: StageKind },
    /// The terminal FTD stage was opened.
    SuccessReached,
}

/// Receives simulation events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SimulationEvent);
}

/// No-op sink for callers that don't need notifications.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: SimulationEvent) {}
}

/// Sink that writes every event to the log.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SimulationEvent) {
        info!(?event, "Simulation event");
    }
}

/// Forwards to an inner sink unless muted. One gate is shared by every
/// emitter that belongs to the same session, so a single mute switch
/// silences all of them.
pub struct GatedSink {
    inner: Arc<dyn EventSink>,
    muted: AtomicBool,
}

impl GatedSink {
    pub fn new(inner: Arc<dyn EventSink>, muted: bool) -> Self {
        Self {
            inner,
            muted: AtomicBool::new(muted),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }
}

impl EventSink for GatedSink {
    fn emit(&self, event: SimulationEvent) {
        if self.is_muted() {
            debug!(?event, "Notification suppressed (muted)");
            return;
        }
        self.inner.emit(event);
    }
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<SimulationEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: SimulationEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_records_in_order() {
        let sink = CaptureSink::new();
        sink.emit(SimulationEvent::StageExpanded {
            stage: StageKind::Click,
        });
        sink.emit(SimulationEvent::SuccessReached);
        assert_eq!(sink.count(), 2);
        assert_eq!(sink.events()[1], SimulationEvent::SuccessReached);
        sink.clear();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_gated_sink_drops_while_muted() {
        let capture = Arc::new(CaptureSink::new());
        let gate = GatedSink::new(capture.clone(), true);
        gate.emit(SimulationEvent::MarketSelected {
            market: MarketId::De,
        });
        assert_eq!(capture.count(), 0);

        gate.set_muted(false);
        gate.emit(SimulationEvent::SuccessReached);
        assert_eq!(capture.events(), vec![SimulationEvent::SuccessReached]);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(SimulationEvent::PresetApplied {
            market: MarketId::Uk,
            preset: PresetName::Optimistic,
        })
        .unwrap();
        assert_eq!(json["type"], "preset_applied");
        assert_eq!(json["market"], "UK");
        assert_eq!(json["preset"], "optimistic");
    }
}
