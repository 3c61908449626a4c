//! The frame-advance loop.
//!
//! One spawned task drives the whole run: it is the sole writer of the
//! frame counter and the activation window, and the only place stages are
//! dispatched. External callers interact with the run exclusively through
//! the control flags, the pause channel, and the per-slot done latches.
//!
//! Per frame, in order:
//!
//! 1. pause checkpoint (gates frame boundaries only)
//! 2. drain application (`lower` advances once a stop was requested)
//! 3. dispatch of every active slot
//! 4. join: wait until every dispatched slot reports done
//! 5. frame-completion callback
//! 6. window growth (`upper` advances during ramp-up)
//! 7. frame advance
//!
//! Frame *f+1* dispatch therefore never begins before frame *f*'s join
//! observed every active slot's completion, and the frame-completion
//! callback sits strictly between the two.

use super::registry::StageRegistry;
use super::stage::{FrameCallback, FrameId};
use super::telemetry::{TelemetryEvent, TelemetrySink};
use super::window::FrameWindow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Frames between cooperative yield points.
///
/// Stages that report completion synchronously from inside their work
/// callback let the loop run frames without ever awaiting; the periodic
/// yield keeps the scheduler fair to other tasks on the runtime.
const YIELD_EVERY_N_FRAMES: u64 = 50;

/// Shared state of one pipeline run.
///
/// Created by `start`, replaced wholesale by the next `start`. The
/// registry and callback are immutable; the window mirrors and the done
/// latches are the only cross-task mutable fields.
pub(crate) struct RunState {
    /// The run's stages and their done latches.
    pub(crate) registry: StageRegistry,

    /// Optional per-frame completion hook.
    pub(crate) on_frame_complete: Option<FrameCallback>,

    /// Wakes the join wait when a completion report lands.
    pub(crate) done_notify: Notify,

    /// True while the loop is alive; flips to false exactly once.
    pub(crate) running: watch::Sender<bool>,

    /// Cooperative stop request; observed at the drain checkpoint.
    pub(crate) stop: CancellationToken,

    /// Window mirror for concurrent queries (loop is the sole writer).
    lower: AtomicUsize,
    upper: AtomicUsize,

    /// Observability sink.
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
}

impl RunState {
    pub(crate) fn new(
        registry: StageRegistry,
        on_frame_complete: Option<FrameCallback>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let (running, _) = watch::channel(true);
        Self {
            registry,
            on_frame_complete,
            done_notify: Notify::new(),
            running,
            stop: CancellationToken::new(),
            lower: AtomicUsize::new(0),
            upper: AtomicUsize::new(1),
            telemetry,
        }
    }

    /// Current active width as seen by concurrent queries.
    pub(crate) fn running_count(&self) -> usize {
        let upper = self.upper.load(Ordering::Acquire);
        let lower = self.lower.load(Ordering::Acquire);
        upper.saturating_sub(lower)
    }

    fn publish_window(&self, window: &FrameWindow) {
        self.lower.store(window.lower(), Ordering::Release);
        self.upper.store(window.upper(), Ordering::Release);
    }

    /// Blocks until every slot in `lower..=active_upper` has its done
    /// latch set.
    ///
    /// Completion reports call `notify_one`, which stores a wakeup permit
    /// when the loop is not yet parked here, so a report landing between
    /// the latch check and the await is never lost.
    async fn wait_frame_complete(&self, lower: usize, active_upper: usize) {
        loop {
            let all_done = (lower..=active_upper).all(|slot| self.registry.slot(slot).is_done());
            if all_done {
                return;
            }
            self.done_notify.notified().await;
        }
    }
}

/// Drives one pipeline run to termination.
pub(crate) async fn run_loop(run: Arc<RunState>, mut paused: watch::Receiver<bool>) {
    let stage_count = run.registry.len();
    let mut window = FrameWindow::new(stage_count);
    let mut frame: FrameId = 0;

    info!(stage_count, "Pipeline run started");
    run.telemetry.emit(TelemetryEvent::RunStarted { stage_count });

    while *run.running.borrow() && !window.is_drained() {
        // Pause gates the frame boundary; in-flight work from a prior
        // frame is unaffected. An error means the control surface was
        // dropped, in which case there is nobody left to resume us.
        if *paused.borrow() {
            debug!(frame, "Pipeline paused at frame boundary");
            let _ = paused.wait_for(|p| !*p).await;
            debug!(frame, "Pipeline resumed");
        }

        window.apply_drain(run.stop.is_cancelled());
        run.publish_window(&window);

        let lower = window.lower();
        let active_upper = window.active_upper(frame);

        for slot_index in lower..=active_upper {
            let slot = run.registry.slot(slot_index);
            debug_assert!(
                slot.is_done(),
                "slot {slot_index} dispatched while its previous frame is still in flight"
            );
            slot.mark_dispatched();

            let local_frame = frame - slot_index as FrameId;
            trace!(
                stage_id = %slot.stage.id,
                slot = slot_index,
                frame,
                local_frame,
                "Dispatching stage"
            );
            run.telemetry.emit(TelemetryEvent::StageDispatched {
                stage_id: slot.stage.id,
                slot: slot_index,
                frame,
                local_frame,
            });

            (slot.stage.work)(slot.stage.id, local_frame);
        }

        run.wait_frame_complete(lower, active_upper).await;

        if let Some(on_frame_complete) = &run.on_frame_complete {
            on_frame_complete(frame);
        }
        debug!(
            frame,
            running_count = window.running_count(),
            "Frame completed"
        );
        run.telemetry.emit(TelemetryEvent::FrameCompleted {
            frame,
            running_count: window.running_count(),
        });

        window.grow(frame);
        run.publish_window(&window);

        frame += 1;
        if frame % YIELD_EVERY_N_FRAMES == 0 {
            tokio::task::yield_now().await;
        }
    }

    // The window is empty once the run is over; publish it that way so
    // the active width reads zero instead of the residual drain slot.
    run.lower.store(stage_count, Ordering::Release);
    run.upper.store(stage_count, Ordering::Release);

    info!(frames = frame, "Pipeline run finished");
    run.telemetry.emit(TelemetryEvent::RunFinished { frames: frame });

    let _ = run.running.send(false);
}
