//! Staggered frame-pipeline scheduler.
//!
//! An ordered set of stages is driven through discrete frames. Stage *k*
//! first activates at frame *k*, so the set of concurrently active stages
//! grows by one per frame until every stage runs in every frame (full
//! load), and shrinks again once a stop is requested (drain):
//!
//! ```text
//! frame 0:  [0]
//! frame 1:  [0 1]
//! frame 2:  [0 1 2]          <- full load for a 3-stage pipeline
//! frame 3:  [0 1 2]
//! Stop()
//! frame 4:  [  1 2]
//! frame 5:  [    2]          <- drained, run terminates
//! ```
//!
//! # Key Components
//!
//! - [`Pipeline`] - Lifecycle and control surface (start/stop/pause/play)
//! - [`Stage`] - One registered unit of work with a caller-assigned id
//! - [`StageId`] - Caller-assigned stage identifier
//! - [`TelemetrySink`] - Observability hook for scheduler events
//!
//! # Completion Contract
//!
//! A stage's work callback must return promptly - it is invoked on the
//! driving task. The real work runs on the stage's own concurrency and
//! eventually reports back via [`Pipeline::task_done`]. A stage that never
//! reports completion stalls the pipeline at that frame's join point
//! indefinitely.
//!
//! # Example
//!
//! ```ignore
//! use framepipe::pipeline::{Pipeline, Stage, StageId};
//! use std::sync::Arc;
//!
//! let pipeline = Arc::new(Pipeline::new());
//!
//! let worker = Arc::clone(&pipeline);
//! let stages = vec![Stage::new(StageId::new(7), move |id, local| {
//!     let done = Arc::clone(&worker);
//!     tokio::spawn(async move {
//!         // ... perform the frame's unit of work ...
//!         let _ = done.task_done(id, local);
//!     });
//! })];
//!
//! pipeline.start(stages, None)?;
//! ```

mod error;
mod registry;
mod runner;
mod service;
mod stage;
mod telemetry;
mod window;

pub use error::PipelineError;
pub use service::Pipeline;
pub use stage::{FrameCallback, FrameId, LocalFrame, Stage, StageId, StageWork};
pub use telemetry::{NullTelemetrySink, TelemetryEvent, TelemetrySink};
