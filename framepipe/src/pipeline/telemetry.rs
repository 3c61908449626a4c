//! Telemetry for scheduler observability.
//!
//! The scheduler emits structured events via a sink abstraction and does
//! not know how they are consumed - the "emit, don't present" pattern.
//! Consumers (logging, metrics, UI) decide how to present or aggregate.
//!
//! # Example
//!
//! ```ignore
//! use framepipe::pipeline::{TelemetryEvent, TelemetrySink};
//!
//! struct LoggingSink;
//!
//! impl TelemetrySink for LoggingSink {
//!     fn emit(&self, event: TelemetryEvent) {
//!         tracing::info!(?event, "Pipeline event");
//!     }
//! }
//! ```

use super::stage::{FrameId, LocalFrame, StageId};

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// A run started with the given number of registered stages.
    RunStarted { stage_count: usize },

    /// A stage was dispatched for one frame's unit of work.
    StageDispatched {
        stage_id: StageId,
        slot: usize,
        frame: FrameId,
        local_frame: LocalFrame,
    },

    /// All of a frame's active stages reported completion.
    FrameCompleted {
        frame: FrameId,
        running_count: usize,
    },

    /// A completion report arrived for a slot that was already idle.
    ///
    /// Either a duplicate report or a late report from a superseded
    /// frame; the scheduler accepts it but flags the conflation.
    StaleCompletion { stage_id: StageId, frame: FrameId },

    /// The run terminated after the given number of completed frames.
    RunFinished { frames: u64 },
}

/// Sink for pipeline telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Consumes one event. Called on the driving task or, for
    /// [`TelemetryEvent::StaleCompletion`], on the reporting caller's
    /// thread - implementations must not block.
    fn emit(&self, event: TelemetryEvent);
}

/// Sink that discards all events. The default when no observer is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {}
}
