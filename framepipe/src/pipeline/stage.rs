//! Stage identity and callback types.
//!
//! A [`Stage`] is the unit of registration: a caller-assigned id plus the
//! work callback the scheduler dispatches once per frame while the stage
//! is inside the active window. Stages share no behavior beyond "accept
//! (id, local frame) and eventually report completion", so the work is
//! modelled as a callable capability rather than a trait hierarchy.

use std::sync::Arc;

/// Global frame counter value. One value for the whole run, incremented
/// once per completed frame.
pub type FrameId = u64;

/// A stage's private progress counter: the number of frames since that
/// stage's first activation (`frame - slot_index`), zero-based.
pub type LocalFrame = u64;

/// Caller-assigned identifier for a registered stage.
///
/// Ids must be unique within one registration; the scheduler resolves
/// completion reports by id, not by slot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(u32);

impl StageId {
    /// Creates a stage id from its raw numeric value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value of this stage id.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for StageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stage-{}", self.0)
    }
}

/// The work callback dispatched once per frame for an active stage.
///
/// Invoked on the driving task with the stage's id and local frame. It
/// must return promptly - the expectation is that it hands the frame's
/// unit of work to its own concurrency (a worker task, an I/O
/// subsystem, ...) which later calls [`Pipeline::task_done`].
///
/// [`Pipeline::task_done`]: crate::pipeline::Pipeline::task_done
pub type StageWork = Arc<dyn Fn(StageId, LocalFrame) + Send + Sync>;

/// Optional callback invoked on the driving task after every frame's
/// active stages have all reported completion.
///
/// Must not block indefinitely or perform long-running work - it delays
/// the next frame.
pub type FrameCallback = Arc<dyn Fn(FrameId) + Send + Sync>;

/// One registered unit of pipeline work.
///
/// Registration order defines the stage's slot index, which is also its
/// activation offset in frames. Immutable for the run's lifetime.
#[derive(Clone)]
pub struct Stage {
    /// Caller-assigned identifier, unique within the registration.
    pub id: StageId,

    /// The per-frame work callback.
    pub work: StageWork,
}

impl Stage {
    /// Creates a stage from an id and a work closure.
    pub fn new<F>(id: StageId, work: F) -> Self
    where
        F: Fn(StageId, LocalFrame) + Send + Sync + 'static,
    {
        Self {
            id,
            work: Arc::new(work),
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("work", &"<callback>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_stage_id_display() {
        let id = StageId::new(42);
        assert_eq!(format!("{}", id), "stage-42");
    }

    #[test]
    fn test_stage_id_roundtrip() {
        let id = StageId::from(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(id, StageId::new(7));
    }

    #[test]
    fn test_stage_invokes_work() {
        let seen = Arc::new(AtomicU64::new(u64::MAX));
        let seen_clone = Arc::clone(&seen);

        let stage = Stage::new(StageId::new(3), move |id, local_frame| {
            assert_eq!(id, StageId::new(3));
            seen_clone.store(local_frame, Ordering::SeqCst);
        });

        (stage.work)(stage.id, 5);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_stage_clone_shares_work() {
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = Arc::clone(&count);

        let stage = Stage::new(StageId::new(1), move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        let copy = stage.clone();

        (stage.work)(stage.id, 0);
        (copy.work)(copy.id, 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
