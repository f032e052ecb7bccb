// events.rs: Change notifications and dispatch.
//
// The store publishes one GoalEvent after every mutation that changed its
// state. Views and other observers subscribe through NotificationSinks:
// a JSONL log file, an in-process channel, or plain tracing output.
//
// Dispatch is synchronous and happens before the mutating call returns, so
// an observer never sees a store whose state is newer than its last event.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;
use crate::progress::Progress;

/// Events emitted by the goal store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GoalEvent {
    /// A goal was appended to the store.
    GoalAdded {
        goal_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A goal was removed from the store.
    GoalRemoved {
        goal_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// The display order changed. `order` is the full new order.
    GoalsReordered {
        order: Vec<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// A goal's definition was edited.
    GoalUpdated {
        goal_id: Uuid,
        title: String,
        progress_transferred: bool,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },

    /// A completion was recorded for an active goal.
    ProgressRecorded {
        goal_id: Uuid,
        count: u32,
        timestamp: DateTime<Utc>,
    },

    /// A goal was activated (count reset to zero) or deactivated.
    ActivityChanged {
        goal_id: Uuid,
        active: bool,
        timestamp: DateTime<Utc>,
    },
}

impl GoalEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            GoalEvent::GoalAdded { .. } => "goal_added",
            GoalEvent::GoalRemoved { .. } => "goal_removed",
            GoalEvent::GoalsReordered { .. } => "goals_reordered",
            GoalEvent::GoalUpdated { .. } => "goal_updated",
            GoalEvent::ProgressRecorded { .. } => "progress_recorded",
            GoalEvent::ActivityChanged { .. } => "activity_changed",
        }
    }

    /// The goal this event is about, if it concerns a single goal.
    pub fn goal_id(&self) -> Option<Uuid> {
        match self {
            GoalEvent::GoalAdded { goal_id, .. }
            | GoalEvent::GoalRemoved { goal_id, .. }
            | GoalEvent::GoalUpdated { goal_id, .. }
            | GoalEvent::ProgressRecorded { goal_id, .. }
            | GoalEvent::ActivityChanged { goal_id, .. } => Some(*goal_id),
            GoalEvent::GoalsReordered { .. } => None,
        }
    }

    pub fn goal_added(goal_id: Uuid, title: &str) -> Self {
        GoalEvent::GoalAdded {
            goal_id,
            title: title.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn goal_removed(goal_id: Uuid, title: &str) -> Self {
        GoalEvent::GoalRemoved {
            goal_id,
            title: title.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn goals_reordered(order: Vec<Uuid>) -> Self {
        GoalEvent::GoalsReordered {
            order,
            timestamp: Utc::now(),
        }
    }

    pub fn goal_updated(
        goal_id: Uuid,
        title: &str,
        progress_transferred: bool,
        progress: Progress,
    ) -> Self {
        GoalEvent::GoalUpdated {
            goal_id,
            title: title.to_string(),
            progress_transferred,
            progress,
            timestamp: Utc::now(),
        }
    }

    pub fn progress_recorded(goal_id: Uuid, count: u32) -> Self {
        GoalEvent::ProgressRecorded {
            goal_id,
            count,
            timestamp: Utc::now(),
        }
    }

    pub fn activity_changed(goal_id: Uuid, active: bool) -> Self {
        GoalEvent::ActivityChanged {
            goal_id,
            active,
            timestamp: Utc::now(),
        }
    }
}

/// Something that wants to hear about goal changes.
///
/// The store hands every change to each subscribed sink in turn, after the
/// change has been applied.
pub trait NotificationSink: Send {
    /// Receive one change. A failure here never rolls the change back.
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError>;
}

/// Writes each change as one JSON line at the end of a file, creating the
/// file and its directory on first use.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError> {
        let line = serde_json::to_string(event)?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_error(&self.path))?;
        writeln!(log, "{}", line).map_err(io_error(&self.path))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GoalError {
    let path = path.to_path_buf();
    move |source| GoalError::IoError { path, source }
}

/// Forwards events to an in-process receiver.
///
/// A view holding the `Receiver` re-renders whenever something arrives.
/// Once the receiver is dropped every send fails with a notification error.
pub struct ChannelSink {
    sender: Sender<GoalEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<GoalEvent>) -> Self {
        Self { sender }
    }
}

impl NotificationSink for ChannelSink {
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError> {
        self.sender
            .send(event.clone())
            .map_err(|e| GoalError::NotificationError(e.to_string()))
    }
}

/// Emits every event as an `info` level tracing record.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError> {
        match event.goal_id() {
            Some(goal_id) => tracing::info!(%goal_id, kind = event.event_type(), "goal event"),
            None => tracing::info!(kind = event.event_type(), "goal event"),
        }
        Ok(())
    }
}

/// The store's list of subscribers.
///
/// A sink that fails gets a warning in the log; the remaining sinks still
/// see the change.
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Subscribe `sink` to every later change.
    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver `event` to the sinks in subscription order.
    pub fn dispatch(&self, event: &GoalEvent) {
        for (index, sink) in self.sinks.iter().enumerate() {
            if let Err(e) = sink.send(event) {
                tracing::warn!(sink = index, kind = event.event_type(), "goal event not delivered: {}", e);
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[test]
    fn event_serialization_round_trip() {
        let event = GoalEvent::goal_updated(Uuid::new_v4(), "Yoga", true, Progress::Active { count: 3 });
        let json = serde_json::to_string(&event).unwrap();
        let restored: GoalEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event, restored);
        assert!(json.contains("\"goal_updated\""));
    }

    #[test]
    fn log_sink_appends_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");
        let sink = LogSink::new(&path);
        assert_eq!(sink.path(), path.as_path());

        sink.send(&GoalEvent::goal_added(Uuid::new_v4(), "Yoga")).unwrap();
        sink.send(&GoalEvent::progress_recorded(Uuid::new_v4(), 1)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("goal_added"));
        assert!(lines[1].contains("progress_recorded"));
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        let id = Uuid::new_v4();

        sink.send(&GoalEvent::activity_changed(id, true)).unwrap();

        let received = rx.try_recv().unwrap();
        assert_eq!(received.event_type(), "activity_changed");
        assert_eq!(received.goal_id(), Some(id));
    }

    #[test]
    fn channel_sink_errors_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        drop(rx);

        let result = sink.send(&GoalEvent::goals_reordered(vec![]));
        assert!(matches!(result, Err(GoalError::NotificationError(_))));
    }

    #[test]
    fn dispatcher_sends_to_all_sinks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let (tx, rx) = mpsc::channel();

        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(LogSink::new(&path)));
        dispatcher.add_sink(Box::new(ChannelSink::new(tx)));
        dispatcher.add_sink(Box::new(TracingSink));
        assert_eq!(dispatcher.sink_count(), 3);

        dispatcher.dispatch(&GoalEvent::goal_removed(Uuid::new_v4(), "Walks"));

        assert!(fs::read_to_string(&path).unwrap().contains("goal_removed"));
        assert_eq!(rx.try_recv().unwrap().event_type(), "goal_removed");
    }

    #[test]
    fn failing_sink_does_not_block_others() {
        let (dead_tx, dead_rx) = mpsc::channel();
        drop(dead_rx);
        let (tx, rx) = mpsc::channel();

        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(ChannelSink::new(dead_tx)));
        dispatcher.add_sink(Box::new(ChannelSink::new(tx)));

        dispatcher.dispatch(&GoalEvent::goal_added(Uuid::new_v4(), "Yoga"));
        assert_eq!(rx.try_recv().unwrap().event_type(), "goal_added");
    }

    #[test]
    fn reorder_event_has_no_single_goal() {
        let event = GoalEvent::goals_reordered(vec![Uuid::new_v4(), Uuid::new_v4()]);
        assert_eq!(event.goal_id(), None);
        assert_eq!(event.event_type(), "goals_reordered");
    }
}
