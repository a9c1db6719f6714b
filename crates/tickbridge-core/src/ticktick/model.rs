//! Task, project, and snapshot types mirroring the TickTick data model.
//!
//! Everything here is an immutable observation: each poll cycle builds a
//! fresh [`Snapshot`] from the wire payloads and never mutates it in
//! place afterwards.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Remote status ordinal for a completed task.
pub(crate) const STATUS_COMPLETED: i64 = 2;

/// Task priority, carried as an ordinal by the remote API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Ordinal used on the wire (none=0, low=1, medium=3, high=5).
    pub fn as_i64(self) -> i64 {
        match self {
            Priority::None => 0,
            Priority::Low => 1,
            Priority::Medium => 3,
            Priority::High => 5,
        }
    }

    /// Map a remote ordinal. Unknown ordinals degrade to `None` rather
    /// than failing the fetch.
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Priority::Low,
            3 => Priority::Medium,
            5 => Priority::High,
            _ => Priority::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// A single task, as observed at one poll instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub content: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub is_all_day: bool,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Parent task for subtasks. May dangle if the remote data is
    /// inconsistent; consumers must tolerate unresolved references.
    pub parent_id: Option<String>,
}

impl Task {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Due on the same calendar date (UTC) as `now`.
    pub fn is_due_today(&self, now: DateTime<Utc>) -> bool {
        !self.completed
            && self
                .due_date
                .is_some_and(|due| due.date_naive() == now.date_naive())
    }
}

/// A project and the tasks it owned at one poll instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub tasks: Vec<Task>,
}

impl Project {
    /// Tasks that are still open.
    pub fn open_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    /// Count of open tasks.
    pub fn task_count(&self) -> usize {
        self.open_tasks().count()
    }

    /// Count of open tasks whose due date has passed.
    pub fn overdue_count(&self, now: DateTime<Utc>) -> usize {
        self.tasks.iter().filter(|t| t.is_overdue(now)).count()
    }

    /// Count of open tasks due today.
    pub fn due_today_count(&self, now: DateTime<Utc>) -> usize {
        self.tasks.iter().filter(|t| t.is_due_today(now)).count()
    }

    /// Rollup used by sensor-style observers.
    pub fn summary(&self, now: DateTime<Utc>) -> ProjectSummary {
        ProjectSummary {
            project_id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            task_count: self.task_count(),
            overdue_count: self.overdue_count(now),
            due_today_count: self.due_today_count(now),
        }
    }
}

/// Per-project rollup of task counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub name: String,
    pub color: Option<String>,
    pub task_count: usize,
    pub overdue_count: usize,
    pub due_today_count: usize,
}

/// Full remote state observed at one poll instant.
///
/// Projects keep their remote listing order, which makes iteration (and
/// therefore diff output) stable across cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub projects: IndexMap<String, Project>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&mut self, project: Project) {
        self.projects.insert(project.id.clone(), project);
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.get(project_id)
    }

    /// All tasks, in project order then task order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.projects.values().flat_map(|p| p.tasks.iter())
    }

    /// Look up a task by identifier across all projects.
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks().find(|t| t.id == task_id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks().count()
    }

    /// Per-project summaries, in project order.
    pub fn summaries(&self, now: DateTime<Utc>) -> Vec<ProjectSummary> {
        self.projects.values().map(|p| p.summary(now)).collect()
    }

    /// Tasks with a due date inside `[start, end]`, sorted by due date.
    ///
    /// All-day tasks match on calendar date, timed tasks on the instant.
    /// Completed tasks are excluded unless `include_completed` is set.
    pub fn agenda(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_completed: bool,
    ) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks()
            .filter(|t| include_completed || !t.completed)
            .filter(|t| match t.due_date {
                Some(due) if t.is_all_day => {
                    let date = due.date_naive();
                    start.date_naive() <= date && date <= end.date_naive()
                }
                Some(due) => start <= due && due <= end,
                None => false,
            })
            .collect();
        tasks.sort_by_key(|t| t.due_date);
        tasks
    }

    /// The next open task due at or after `now`, looking a week ahead.
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<&Task> {
        self.agenda(now, now + chrono::Duration::days(7), false)
            .into_iter()
            .next()
    }
}

/// Task payload as returned by the open API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTask {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub completed_time: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl WireTask {
    pub(crate) fn into_task(self) -> Task {
        Task {
            due_date: self.due_date.as_deref().and_then(parse_datetime),
            completed_at: self.completed_time.as_deref().and_then(parse_datetime),
            completed: self.status == STATUS_COMPLETED,
            priority: Priority::from_i64(self.priority),
            id: self.id,
            project_id: self.project_id,
            title: self.title,
            content: self.content,
            is_all_day: self.is_all_day,
            parent_id: self.parent_id,
        }
    }
}

/// Project payload as returned by the open API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl WireProject {
    pub(crate) fn into_project(self, tasks: Vec<Task>) -> Project {
        Project {
            id: self.id,
            name: if self.name.is_empty() {
                "Unknown".to_string()
            } else {
                self.name
            },
            color: self.color,
            tasks,
        }
    }
}

/// Combined project-with-tasks payload (`GET /project/{id}/data`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireProjectData {
    pub project: WireProject,
    #[serde(default)]
    pub tasks: Vec<WireTask>,
}

/// Parse a remote timestamp. TickTick emits RFC 3339 as well as the
/// `2024-01-15T09:00:00.000+0000` shape (no colon in the offset).
/// Unparseable values become `None`; a bad date never fails a fetch.
pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3f%z").ok())
        .map(|dt| dt.with_timezone(&Utc))
}
