//! Listener registry for flow stages.
//!
//! One ordered list per stage type. Listeners run by priority tier
//! (`Pre`, `Normal`, `Post`), then in registration order within a tier.

use std::fmt;

use pipeflow_core::id::ListenerId;

use crate::stage::{
    FlowStage, InsertVerdict, OnMoveToCentre, PreMoveToCentre, SideCheckStage, StageKind,
    TryInsert, Verdict,
};

// ---------------------------------------------------------------------------
// Priorities & outcomes
// ---------------------------------------------------------------------------

/// Priority tier for stage listeners. Lower tiers run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ListenerPriority {
    Pre = 0,
    #[default]
    Normal = 1,
    Post = 2,
}

/// Result of dispatching one stage to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Every listener ran.
    Completed,
    /// A listener cancelled the stage; later listeners did not run.
    Cancelled { by: ListenerId },
}

/// A boxed listener for stage type `S`.
pub type Listener<S> = Box<dyn FnMut(&mut S) -> <S as FlowStage>::Verdict>;

struct ListenerEntry<S: FlowStage> {
    id: ListenerId,
    priority: ListenerPriority,
    listener: Listener<S>,
}

impl<S: FlowStage> fmt::Debug for ListenerEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("listener", &"<fn>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Per-stage list
// ---------------------------------------------------------------------------

/// Ordered listeners for a single stage type.
pub struct StageListeners<S: FlowStage> {
    entries: Vec<ListenerEntry<S>>,
}

impl<S: FlowStage> Default for StageListeners<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: FlowStage> fmt::Debug for StageListeners<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageListeners")
            .field("stage", &S::KIND)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<S: FlowStage> StageListeners<S> {
    /// Insert keeping the list sorted by `(priority, id)`. Ids grow
    /// monotonically, so this is registration order within a tier.
    fn insert(&mut self, id: ListenerId, priority: ListenerPriority, listener: Listener<S>) {
        let at = self
            .entries
            .partition_point(|e| (e.priority, e.id) <= (priority, id));
        self.entries.insert(
            at,
            ListenerEntry {
                id,
                priority,
                listener,
            },
        );
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in the order they will be called.
    pub fn ids(&self) -> Vec<ListenerId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Call every listener in order. Stops at the first cancelling verdict.
    pub fn dispatch(&mut self, stage: &mut S) -> StageOutcome {
        for entry in &mut self.entries {
            let verdict = (entry.listener)(stage);
            if verdict.cancels() {
                debug_assert!(S::KIND.cancellable());
                return StageOutcome::Cancelled { by: entry.id };
            }
        }
        StageOutcome::Completed
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Listeners for every stage of a flow pipeline.
#[derive(Debug, Default)]
pub struct FlowListeners {
    pub(crate) try_insert: StageListeners<TryInsert>,
    pub(crate) side_check: StageListeners<SideCheckStage>,
    pub(crate) pre_move: StageListeners<PreMoveToCentre>,
    pub(crate) on_move: StageListeners<OnMoveToCentre>,
    next_id: u64,
}

impl FlowListeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn on_try_insert(
        &mut self,
        listener: impl FnMut(&mut TryInsert) -> InsertVerdict + 'static,
    ) -> ListenerId {
        self.on_try_insert_with_priority(ListenerPriority::Normal, listener)
    }

    pub fn on_try_insert_with_priority(
        &mut self,
        priority: ListenerPriority,
        listener: impl FnMut(&mut TryInsert) -> InsertVerdict + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.try_insert.insert(id, priority, Box::new(listener));
        id
    }

    pub fn on_side_check(
        &mut self,
        listener: impl FnMut(&mut SideCheckStage) + 'static,
    ) -> ListenerId {
        self.on_side_check_with_priority(ListenerPriority::Normal, listener)
    }

    pub fn on_side_check_with_priority(
        &mut self,
        priority: ListenerPriority,
        listener: impl FnMut(&mut SideCheckStage) + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.side_check.insert(id, priority, Box::new(listener));
        id
    }

    pub fn on_pre_move_to_centre(
        &mut self,
        listener: impl FnMut(&mut PreMoveToCentre) + 'static,
    ) -> ListenerId {
        self.on_pre_move_to_centre_with_priority(ListenerPriority::Normal, listener)
    }

    pub fn on_pre_move_to_centre_with_priority(
        &mut self,
        priority: ListenerPriority,
        listener: impl FnMut(&mut PreMoveToCentre) + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.pre_move.insert(id, priority, Box::new(listener));
        id
    }

    pub fn on_move_to_centre(
        &mut self,
        listener: impl FnMut(&mut OnMoveToCentre) + 'static,
    ) -> ListenerId {
        self.on_move_to_centre_with_priority(ListenerPriority::Normal, listener)
    }

    pub fn on_move_to_centre_with_priority(
        &mut self,
        priority: ListenerPriority,
        listener: impl FnMut(&mut OnMoveToCentre) + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.on_move.insert(id, priority, Box::new(listener));
        id
    }

    /// Unregister a listener from whichever stage holds it.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.try_insert.remove(id)
            || self.side_check.remove(id)
            || self.pre_move.remove(id)
            || self.on_move.remove(id)
    }

    /// Number of listeners registered for a stage.
    pub fn count(&self, kind: StageKind) -> usize {
        match kind {
            StageKind::TryInsert => self.try_insert.len(),
            StageKind::SideCheck => self.side_check.len(),
            StageKind::PreMoveToCentre => self.pre_move.len(),
            StageKind::OnMoveToCentre => self.on_move.len(),
        }
    }

    pub fn total(&self) -> usize {
        StageKind::ALL.iter().map(|&kind| self.count(kind)).sum()
    }

    /// Drop every listener. Ids are not reused.
    pub fn clear(&mut self) {
        self.try_insert = StageListeners::default();
        self.side_check = StageListeners::default();
        self.pre_move = StageListeners::default();
        self.on_move = StageListeners::default();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
