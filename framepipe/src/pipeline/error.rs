//! Error types for the pipeline scheduler.
//!
//! All errors are synchronous: they are reported at the call that
//! violates the contract and nothing is retried internally. The variants
//! fall into two families - malformed input (empty registration, repeated
//! or unknown stage id) and lifecycle misuse (calling a control operation
//! while the pipeline is not in the required state).

use super::stage::StageId;
use thiserror::Error;

/// Errors reported by the pipeline control surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Start was called with an empty stage sequence
    #[error("stage list is empty")]
    EmptyStages,

    /// Two registered stages share the same id
    #[error("duplicate stage id: {0}")]
    DuplicateStageId(StageId),

    /// A completion report named an id absent from the current registry
    #[error("unknown stage id: {0}")]
    UnknownStageId(StageId),

    /// Start was called while a run is in progress
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// Stop was called with no active run
    #[error("pipeline is not running")]
    NotRunning,

    /// Stop was called twice for the same run
    #[error("stop already requested")]
    AlreadyStopping,
}
