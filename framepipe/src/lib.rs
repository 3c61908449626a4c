//! framepipe - Staggered frame-pipeline scheduling.
//!
//! This library drives an ordered set of independently-defined stages
//! through discrete frames, the way a hardware instruction pipeline fills,
//! runs at full load, and drains. Stage *k* first activates at frame *k*;
//! every active stage performs one unit of work per frame and reports
//! completion asynchronously.
//!
//! # High-Level API
//!
//! ```ignore
//! use framepipe::{Pipeline, Stage, StageId};
//!
//! let pipeline = Pipeline::new();
//!
//! let stages = vec![
//!     Stage::new(StageId::new(1), |id, local_frame| {
//!         // Hand the work off to your own concurrency, then call
//!         // pipeline.task_done(id, frame) when it finishes.
//!     }),
//! ];
//!
//! pipeline.start(stages, None)?;
//! ```

pub mod pipeline;

pub use pipeline::{
    FrameCallback, FrameId, LocalFrame, NullTelemetrySink, Pipeline, PipelineError, Stage, StageId,
    StageWork, TelemetryEvent, TelemetrySink,
};

/// Version of the framepipe library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
