//! Pipeline lifecycle and control surface.
//!
//! [`Pipeline`] owns the current run and exposes the full control
//! surface: `start`, `stop`, `pause`/`play`, the completion-report entry
//! point `task_done`, and the read-only queries. One `Pipeline` value is
//! one independent scheduler instance; multiple instances coexist freely.
//!
//! # Lifecycle
//!
//! 1. **start**: validates and registers the stages, then spawns the
//!    frame loop as a background task
//! 2. **operation**: stages report completions via `task_done`; callers
//!    pause/resume frame boundaries at will
//! 3. **stop**: requests a cooperative drain; the run terminates once the
//!    activation window has emptied, observable via `is_running` or
//!    `wait_stopped`

use super::error::PipelineError;
use super::registry::StageRegistry;
use super::runner::{run_loop, RunState};
use super::stage::{FrameCallback, FrameId, Stage, StageId};
use super::telemetry::{NullTelemetrySink, TelemetryEvent, TelemetrySink};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// A staggered frame-pipeline scheduler instance.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and is safe
/// to call concurrently with a running pipeline.
///
/// Dropping the `Pipeline` does not interrupt an in-flight run - request
/// a stop and wait for termination first when shutdown must be
/// deterministic.
pub struct Pipeline {
    /// The current run, replaced wholesale by each successful `start`.
    ///
    /// Kept after termination so late completion reports still resolve
    /// ids against the registry of the run they belong to.
    run: RwLock<Option<Arc<RunState>>>,

    /// Pause flag, owned by the instance across runs.
    paused: watch::Sender<bool>,

    /// Observability sink handed to every run.
    telemetry: Arc<dyn TelemetrySink>,
}

impl Pipeline {
    /// Creates a scheduler with no telemetry observer.
    pub fn new() -> Self {
        Self::with_telemetry(Arc::new(NullTelemetrySink))
    }

    /// Creates a scheduler that emits run events to the given sink.
    pub fn with_telemetry(telemetry: Arc<dyn TelemetrySink>) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            run: RwLock::new(None),
            paused,
            telemetry,
        }
    }

    /// Registers the ordered stage sequence and starts a run.
    ///
    /// Slot indices - and with them each stage's activation offset - are
    /// assigned by sequence order. The optional `on_frame_complete`
    /// callback is invoked on the driving task after every frame; it must
    /// not block indefinitely.
    ///
    /// The frame loop runs as a spawned background task, so `start` must
    /// be called from within a Tokio runtime context.
    ///
    /// The run ends only when [`stop`](Self::stop) drains the activation
    /// window - with one boundary exception: a single-stage pipeline
    /// satisfies the drain condition from frame 0 and terminates
    /// immediately without dispatching.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::EmptyStages`] for an empty sequence
    /// - [`PipelineError::DuplicateStageId`] for a repeated id; the
    ///   previous registry is left untouched
    /// - [`PipelineError::AlreadyRunning`] while a run is in progress
    pub fn start(
        &self,
        stages: Vec<Stage>,
        on_frame_complete: Option<FrameCallback>,
    ) -> Result<(), PipelineError> {
        let mut guard = self.run.write();

        if let Some(run) = guard.as_ref() {
            if *run.running.borrow() {
                return Err(PipelineError::AlreadyRunning);
            }
        }

        let registry = StageRegistry::new(stages)?;
        let stage_count = registry.len();

        self.paused.send_replace(false);

        let run = Arc::new(RunState::new(
            registry,
            on_frame_complete,
            Arc::clone(&self.telemetry),
        ));
        *guard = Some(Arc::clone(&run));

        info!(stage_count, "Starting pipeline");
        tokio::spawn(run_loop(run, self.paused.subscribe()));

        Ok(())
    }

    /// Requests a cooperative stop.
    ///
    /// Takes effect at the next frame boundary by shrinking the
    /// activation window from the front, so already-active stages finish
    /// naturally; nothing in flight is interrupted. Does not block -
    /// observe termination via [`is_running`](Self::is_running) or
    /// [`wait_stopped`](Self::wait_stopped).
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NotRunning`] with no active run
    /// - [`PipelineError::AlreadyStopping`] when a stop was already
    ///   requested for this run
    pub fn stop(&self) -> Result<(), PipelineError> {
        let guard = self.run.read();
        let run = guard.as_ref().ok_or(PipelineError::NotRunning)?;

        if !*run.running.borrow() {
            return Err(PipelineError::NotRunning);
        }
        if run.stop.is_cancelled() {
            return Err(PipelineError::AlreadyStopping);
        }

        info!("Pipeline stop requested");
        run.stop.cancel();
        Ok(())
    }

    /// Pauses the pipeline at the next frame boundary.
    ///
    /// Idempotent. In-flight stage work from the current frame is
    /// unaffected; only the start of the next frame is gated.
    pub fn pause(&self) {
        debug!("Pipeline pause requested");
        self.paused.send_replace(true);
    }

    /// Resumes a paused pipeline. Idempotent.
    pub fn play(&self) {
        debug!("Pipeline play requested");
        self.paused.send_replace(false);
    }

    /// Reports that a stage finished its current frame's unit of work.
    ///
    /// Resolves the slot by stage id; the `frame` argument is recorded
    /// for observability but does not gate which latch is set - one latch
    /// exists per slot, shared across that slot's successive frame
    /// activations. A report that finds the latch already idle is flagged
    /// as stale but still accepted.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnknownStageId`] when no stage in the current
    ///   registry carries that id (including before the first `start`)
    pub fn task_done(&self, id: StageId, frame: FrameId) -> Result<(), PipelineError> {
        let run = self
            .run
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(PipelineError::UnknownStageId(id))?;

        let slot = run
            .registry
            .slot_by_id(id)
            .ok_or(PipelineError::UnknownStageId(id))?;

        let was_idle = slot.mark_done();
        if was_idle {
            warn!(
                stage_id = %id,
                frame,
                "Completion report for an idle slot (stale or duplicate)"
            );
            run.telemetry
                .emit(TelemetryEvent::StaleCompletion { stage_id: id, frame });
        } else {
            trace!(stage_id = %id, frame, "Stage completion");
        }

        run.done_notify.notify_one();
        Ok(())
    }

    /// Returns true while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.run
            .read()
            .as_ref()
            .map(|run| *run.running.borrow())
            .unwrap_or(false)
    }

    /// Returns true while the pause flag is set.
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Returns true when every registered stage is simultaneously active.
    pub fn is_full_load(&self) -> bool {
        self.run
            .read()
            .as_ref()
            .map(|run| run.running_count() == run.registry.len())
            .unwrap_or(false)
    }

    /// Number of stages in the current registry.
    pub fn stage_count(&self) -> usize {
        self.run
            .read()
            .as_ref()
            .map(|run| run.registry.len())
            .unwrap_or(0)
    }

    /// Current active width of the pipeline: the number of stages
    /// eligible to run in the current frame.
    pub fn running_count(&self) -> usize {
        self.run
            .read()
            .as_ref()
            .map(|run| run.running_count())
            .unwrap_or(0)
    }

    /// Waits until the current run has terminated.
    ///
    /// Returns immediately when no run is active. Purely a convenience
    /// over polling [`is_running`](Self::is_running).
    pub async fn wait_stopped(&self) {
        let mut running = {
            let guard = self.run.read();
            match guard.as_ref() {
                Some(run) => run.running.subscribe(),
                None => return,
            }
        };
        let _ = running.wait_for(|running| !*running).await;
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("running", &self.is_running())
            .field("paused", &self.is_paused())
            .field("stage_count", &self.stage_count())
            .finish()
    }
}
