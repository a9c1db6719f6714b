//! Task change events produced by the snapshot differ.
//!
//! Each poll cycle may emit any number of events; observers receive them
//! through the [`EventSink`] trait. Due-soon warnings are re-emitted on
//! every cycle while the task remains inside the lookahead window, so
//! consumers must be idempotent.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticktick::model::{Priority, Snapshot};

/// Wire names used when events are delivered by name.
pub const EVENT_TASK_CREATED: &str = "task_created";
pub const EVENT_TASK_COMPLETED: &str = "task_completed";
pub const EVENT_TASK_DUE_SOON: &str = "task_due_soon";

/// A semantic change observed between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    TaskCreated {
        task_id: String,
        project_id: String,
        title: String,
        due_date: Option<DateTime<Utc>>,
        priority: Priority,
    },
    TaskCompleted {
        task_id: String,
        project_id: String,
        title: String,
        completed_at: DateTime<Utc>,
    },
    TaskDueSoon {
        task_id: String,
        project_id: String,
        title: String,
        due_date: DateTime<Utc>,
        minutes_until_due: i64,
    },
}

impl TaskEvent {
    /// Event name as delivered to the event bus.
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated { .. } => EVENT_TASK_CREATED,
            TaskEvent::TaskCompleted { .. } => EVENT_TASK_COMPLETED,
            TaskEvent::TaskDueSoon { .. } => EVENT_TASK_DUE_SOON,
        }
    }

    /// Identifier of the task the event concerns.
    pub fn task_id(&self) -> &str {
        match self {
            TaskEvent::TaskCreated { task_id, .. }
            | TaskEvent::TaskCompleted { task_id, .. }
            | TaskEvent::TaskDueSoon { task_id, .. } => task_id,
        }
    }
}

/// Observer of snapshot changes.
///
/// The poll engine calls `emit` once per event, in diff order, followed
/// by `snapshot_replaced` once the new snapshot has been adopted.
pub trait EventSink: Send + Sync {
    /// Deliver a single change event.
    fn emit(&self, event: &TaskEvent);

    /// Called after each successful cycle with the adopted snapshot.
    fn snapshot_replaced(&self, _snapshot: &Snapshot) {
        // default no-op
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: &TaskEvent) {
        (**self).emit(event);
    }

    fn snapshot_replaced(&self, snapshot: &Snapshot) {
        (**self).snapshot_replaced(snapshot);
    }
}

/// Sink that buffers events in memory. Used by one-shot polls and tests.
#[derive(Debug, Default)]
pub struct BufferSink {
    events: Mutex<Vec<TaskEvent>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<TaskEvent> {
        let mut guard = self.events.lock().expect("sink lock poisoned");
        std::mem::take(&mut *guard)
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for BufferSink {
    fn emit(&self, event: &TaskEvent) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_wire_constants() {
        let created = TaskEvent::TaskCreated {
            task_id: "t1".into(),
            project_id: "p1".into(),
            title: "Write report".into(),
            due_date: None,
            priority: Priority::High,
        };
        assert_eq!(created.name(), "task_created");

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["type"], "task_created");
        assert_eq!(json["priority"], "high");
    }

    #[test]
    fn buffer_sink_collects_and_drains() {
        let sink = BufferSink::new();
        sink.emit(&TaskEvent::TaskCompleted {
            task_id: "t1".into(),
            project_id: "p1".into(),
            title: "Done".into(),
            completed_at: Utc::now(),
        });
        assert_eq!(sink.len(), 1);

        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].task_id(), "t1");
        assert!(sink.is_empty());
    }
}
