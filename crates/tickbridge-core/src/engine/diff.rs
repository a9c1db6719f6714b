//! Snapshot differ: the semantic change events implied by two
//! successive observations of remote state.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::events::TaskEvent;
use crate::ticktick::model::{Snapshot, Task};

/// Compare the previously observed snapshot against a fresh one.
///
/// Output order is fixed: created events first (in the iteration order
/// of the current snapshot), then completions, then due-soon warnings.
///
/// A previous snapshot that is absent or empty (first poll after
/// process start) emits no created or completed events, so a restart
/// does not replay the user's entire backlog as creations.
/// Due-soon warnings are evaluated on every cycle and
/// repeat while the task stays inside `[now, now + due_soon]`; tasks
/// that disappear remotely produce nothing.
pub fn diff_snapshots(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    now: DateTime<Utc>,
    due_soon: Duration,
) -> Vec<TaskEvent> {
    let mut events = Vec::new();

    // an empty previous observation gives no baseline to diff against;
    // it behaves like the first poll
    let baseline = previous.filter(|p| p.tasks().next().is_some());

    if let Some(previous) = baseline {
        let before: HashMap<&str, &Task> =
            previous.tasks().map(|t| (t.id.as_str(), t)).collect();

        for task in current.tasks() {
            if !before.contains_key(task.id.as_str()) {
                events.push(TaskEvent::TaskCreated {
                    task_id: task.id.clone(),
                    project_id: task.project_id.clone(),
                    title: task.title.clone(),
                    due_date: task.due_date,
                    priority: task.priority,
                });
            }
        }

        for task in current.tasks() {
            if !task.completed {
                continue;
            }
            // only a false -> true transition counts; a task that first
            // appears already completed is not a completion
            if let Some(prior) = before.get(task.id.as_str()) {
                if !prior.completed {
                    events.push(TaskEvent::TaskCompleted {
                        task_id: task.id.clone(),
                        project_id: task.project_id.clone(),
                        title: task.title.clone(),
                        completed_at: task.completed_at.unwrap_or(now),
                    });
                }
            }
        }
    }

    let deadline = now + due_soon;
    for task in current.tasks() {
        if task.completed {
            continue;
        }
        let Some(due) = task.due_date else { continue };
        if due >= now && due <= deadline {
            events.push(TaskEvent::TaskDueSoon {
                task_id: task.id.clone(),
                project_id: task.project_id.clone(),
                title: task.title.clone(),
                due_date: due,
                minutes_until_due: (due - now).num_minutes(),
            });
        }
    }

    events
}
