//! Stage registry and per-slot completion latches.
//!
//! The registry is built once per run from the caller-supplied ordered
//! stage sequence and is immutable afterwards. Slot indices are assigned
//! by sequence order and double as each stage's activation offset.
//!
//! The per-slot `done` latch is the single point of cross-thread mutation
//! in the scheduler: the driving loop clears it at dispatch and external
//! completion reports set it, so it is an `AtomicBool` observed with
//! acquire/release ordering.

use super::error::PipelineError;
use super::stage::{Stage, StageId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// A registered stage plus its completion latch.
///
/// The latch starts `true` (idle): a slot is dispatchable only while its
/// previous frame unit, if any, has reported completion.
pub(crate) struct StageSlot {
    /// The registered stage.
    pub(crate) stage: Stage,

    /// Completion latch. `true` = idle or finished, `false` = in flight.
    done: AtomicBool,
}

impl StageSlot {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            done: AtomicBool::new(true),
        }
    }

    /// Returns true if the slot's current frame unit has finished (or the
    /// slot was never dispatched).
    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Clears the latch at dispatch time.
    #[inline]
    pub(crate) fn mark_dispatched(&self) {
        self.done.store(false, Ordering::Release);
    }

    /// Sets the latch from a completion report.
    ///
    /// Returns the previous latch value; `true` means the slot was already
    /// idle and the report is stale or duplicated.
    #[inline]
    pub(crate) fn mark_done(&self) -> bool {
        self.done.swap(true, Ordering::AcqRel)
    }
}

impl std::fmt::Debug for StageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageSlot")
            .field("stage", &self.stage.id)
            .field("done", &self.is_done())
            .finish()
    }
}

/// Ordered, id-indexed table of the run's stages.
///
/// Immutable after construction; completion reports and the driving loop
/// only touch the slot latches.
pub(crate) struct StageRegistry {
    slots: Vec<StageSlot>,
    index_by_id: HashMap<StageId, usize>,
}

impl StageRegistry {
    /// Validates the stage sequence and assigns slot indices by order.
    ///
    /// Fails without building any slot on an empty sequence or a repeated
    /// stage id, so a rejected registration leaves no partial state.
    pub(crate) fn new(stages: Vec<Stage>) -> Result<Self, PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::EmptyStages);
        }

        let mut index_by_id = HashMap::with_capacity(stages.len());
        for (slot, stage) in stages.iter().enumerate() {
            if index_by_id.insert(stage.id, slot).is_some() {
                return Err(PipelineError::DuplicateStageId(stage.id));
            }
        }

        let slots = stages.into_iter().map(StageSlot::new).collect();
        Ok(Self { slots, index_by_id })
    }

    /// Number of registered stages.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot at the given index.
    ///
    /// Indices come from the window bounds, which never exceed `len()`.
    #[inline]
    pub(crate) fn slot(&self, index: usize) -> &StageSlot {
        &self.slots[index]
    }

    /// Resolves a completion report's stage id to its slot.
    pub(crate) fn slot_by_id(&self, id: StageId) -> Option<&StageSlot> {
        self.index_by_id.get(&id).map(|&index| &self.slots[index])
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.slots.len())
            .finish()
    }
}
