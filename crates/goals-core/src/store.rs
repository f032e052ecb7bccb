// store.rs: the in-memory collection of goals and their progress.
//
// Records are keyed by goal id, so a goal can appear at most once. A
// separate id list carries the display order, which every operation keeps
// intact except explicit reordering and removal.
//
// Mutators that reference an unknown goal are silent no-ops: a view may hold
// on to a goal that was removed a moment ago, and that is not an error.
// Every mutation that actually changes state publishes one GoalEvent.

use std::collections::HashMap;

use uuid::Uuid;

use crate::events::{EventDispatcher, GoalEvent, NotificationSink};
use crate::goal::Goal;
use crate::progress::{GoalProgress, Progress};

/// Ordered, id-keyed store of goals and their tracking state.
///
/// Lives for as long as the embedding application keeps it; nothing is
/// written to disk.
#[derive(Default)]
pub struct GoalStore {
    order: Vec<Uuid>,
    records: HashMap<Uuid, GoalProgress>,
    dispatcher: EventDispatcher,
}

impl GoalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `records`, in the given order.
    ///
    /// If the seed repeats an id, the first record wins.
    pub fn with_records(records: impl IntoIterator<Item = GoalProgress>) -> Self {
        let mut store = Self::new();
        for record in records {
            let goal_id = record.id();
            if store.records.contains_key(&goal_id) {
                tracing::debug!(%goal_id, "seed: duplicate goal id skipped");
                continue;
            }
            store.order.push(goal_id);
            store.records.insert(goal_id, record);
        }
        store
    }

    /// Register a sink that receives every change notification.
    pub fn subscribe(&mut self, sink: Box<dyn NotificationSink>) {
        self.dispatcher.add_sink(sink);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All records in display order.
    pub fn records(&self) -> impl Iterator<Item = &GoalProgress> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Active records in display order (the ones progress can be recorded for).
    pub fn active(&self) -> impl Iterator<Item = &GoalProgress> + '_ {
        self.records().filter(|r| r.progress.is_active())
    }

    /// Goal ids in display order.
    pub fn ids(&self) -> &[Uuid] {
        &self.order
    }

    pub fn get(&self, goal_id: Uuid) -> Option<&GoalProgress> {
        self.records.get(&goal_id)
    }

    /// The record at display position `index`.
    pub fn get_index(&self, index: usize) -> Option<&GoalProgress> {
        self.order.get(index).and_then(|id| self.records.get(id))
    }

    /// Display position of a goal.
    pub fn position(&self, goal_id: Uuid) -> Option<usize> {
        self.order.iter().position(|id| *id == goal_id)
    }

    /// Append a record to the end of the display order.
    ///
    /// Returns `false`, leaving the store untouched, when a record with the
    /// same goal id is already present.
    pub fn add(&mut self, record: GoalProgress) -> bool {
        let goal_id = record.id();
        if self.records.contains_key(&goal_id) {
            tracing::debug!(%goal_id, "add: goal id already present");
            return false;
        }
        let event = GoalEvent::goal_added(goal_id, &record.goal.title);
        self.order.push(goal_id);
        self.records.insert(goal_id, record);
        self.dispatcher.dispatch(&event);
        true
    }

    /// Append a default, inactive goal and return its id.
    pub fn add_default(&mut self) -> Uuid {
        let record = GoalProgress::default();
        let goal_id = record.id();
        self.add(record);
        goal_id
    }

    /// Remove a goal. Returns whether anything was removed.
    pub fn remove(&mut self, goal_id: Uuid) -> bool {
        let Some(record) = self.records.remove(&goal_id) else {
            tracing::debug!(%goal_id, "remove: goal not found");
            return false;
        };
        self.order.retain(|id| *id != goal_id);
        self.dispatcher
            .dispatch(&GoalEvent::goal_removed(goal_id, &record.goal.title));
        true
    }

    /// Remove the records at the given display positions.
    ///
    /// Positions refer to the order before any removal; positions past the
    /// end are ignored. Returns the number of records removed.
    pub fn remove_at(&mut self, offsets: &[usize]) -> usize {
        let doomed: Vec<Uuid> = offsets
            .iter()
            .filter_map(|&i| self.order.get(i).copied())
            .collect();
        doomed.into_iter().filter(|id| self.remove(*id)).count()
    }

    /// Move the records at `from_indices` so they land at `to_index`.
    ///
    /// Works like dragging rows in a list: `to_index` is a position in the
    /// order *before* the move, the moved records keep their relative order,
    /// and so do all the others. Indices past the end are ignored and
    /// `to_index` is clamped to the length.
    pub fn move_goals(&mut self, from_indices: &[usize], to_index: usize) {
        let len = self.order.len();
        let mut from: Vec<usize> = from_indices.iter().copied().filter(|&i| i < len).collect();
        from.sort_unstable();
        from.dedup();
        if from.is_empty() {
            return;
        }

        let to = to_index.min(len);
        let shift = from.iter().filter(|&&i| i < to).count();

        let mut moved = Vec::with_capacity(from.len());
        let mut rest = Vec::with_capacity(len - from.len());
        for (i, id) in self.order.iter().enumerate() {
            if from.binary_search(&i).is_ok() {
                moved.push(*id);
            } else {
                rest.push(*id);
            }
        }
        let at = to - shift;
        rest.splice(at..at, moved);

        if rest == self.order {
            return;
        }
        self.order = rest;
        self.dispatcher
            .dispatch(&GoalEvent::goals_reordered(self.order.clone()));
    }

    /// Replace a goal's definition.
    ///
    /// If `new_goal` equals the stored goal nothing happens, whatever
    /// `transfer_progress` says. Otherwise the goal is replaced and its
    /// progress is kept when `transfer_progress` is set, or the goal is
    /// deactivated when it is not.
    pub fn update(&mut self, new_goal: Goal, transfer_progress: bool) {
        let goal_id = new_goal.id();
        let Some(record) = self.records.get_mut(&goal_id) else {
            tracing::debug!(%goal_id, "update: goal not found");
            return;
        };
        if record.goal == new_goal {
            return;
        }

        if !transfer_progress {
            record.progress = Progress::Inactive;
        }
        record.goal = new_goal;
        let event = GoalEvent::goal_updated(
            goal_id,
            &record.goal.title,
            transfer_progress,
            record.progress,
        );
        self.dispatcher.dispatch(&event);
    }

    /// Completion count of a goal; `None` if it is inactive or unknown.
    pub fn progress_of(&self, goal_id: Uuid) -> Option<u32> {
        self.records.get(&goal_id).and_then(|r| r.progress.count())
    }

    /// Count one more completion for an active goal.
    ///
    /// Inactive goals stay inactive: recording never activates.
    pub fn record_progress(&mut self, goal_id: Uuid) {
        let Some(record) = self.records.get_mut(&goal_id) else {
            tracing::debug!(%goal_id, "record_progress: goal not found");
            return;
        };
        let Progress::Active { count } = record.progress else {
            tracing::debug!(%goal_id, "record_progress: goal inactive");
            return;
        };
        let count = count.saturating_add(1);
        record.progress = Progress::Active { count };
        self.dispatcher
            .dispatch(&GoalEvent::progress_recorded(goal_id, count));
    }

    /// Activate (count reset to zero) or deactivate (count discarded) a goal.
    pub fn set_activity(&mut self, goal_id: Uuid, active: bool) {
        let Some(record) = self.records.get_mut(&goal_id) else {
            tracing::debug!(%goal_id, "set_activity: goal not found");
            return;
        };
        let progress = if active {
            Progress::Active { count: 0 }
        } else {
            Progress::Inactive
        };
        if record.progress == progress {
            return;
        }
        record.progress = progress;
        self.dispatcher
            .dispatch(&GoalEvent::activity_changed(goal_id, active));
    }

    /// Whether deactivating the goal would throw away recorded progress.
    pub fn needs_discard_confirmation(&self, goal_id: Uuid) -> bool {
        self.progress_of(goal_id).is_some_and(|count| count > 0)
    }
}
