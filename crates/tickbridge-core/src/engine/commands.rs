//! Task mutation commands forwarded to the remote API.
//!
//! Every command is validated synchronously before anything leaves the
//! process; a rejected command never reaches the wire. A successful
//! remote call requests an out-of-cycle poll so local state catches up
//! promptly. A failed call requests nothing and is returned as-is.

use tracing::debug;

use crate::engine::poll::RefreshHandle;
use crate::error::{CoreError, ValidationError};
use crate::ticktick::api::{TaskDraft, TaskPatch, TickTickClient};
use crate::ticktick::model::{Priority, Task};

/// Arguments for task creation.
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub title: String,
    pub project_id: String,
    pub content: Option<String>,
    pub due_date: Option<String>,
    /// Priority name: none, low, medium, or high.
    pub priority: Option<String>,
    pub all_day: bool,
}

/// Arguments for task update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub task_id: String,
    pub project_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
}

/// Arguments for subtask creation under an existing parent task.
#[derive(Debug, Clone, Default)]
pub struct CreateSubtask {
    pub parent_task_id: String,
    pub project_id: String,
    pub title: String,
    pub content: Option<String>,
}

/// Forwards validated task mutations to the remote API.
#[derive(Debug, Clone)]
pub struct CommandForwarder {
    client: TickTickClient,
    refresh: RefreshHandle,
}

impl CommandForwarder {
    pub fn new(client: TickTickClient, refresh: RefreshHandle) -> Self {
        Self { client, refresh }
    }

    pub async fn create_task(&self, request: CreateTask) -> Result<Task, CoreError> {
        require("title", &request.title)?;
        require("project_id", &request.project_id)?;
        let priority = parse_priority(request.priority.as_deref())?;

        let draft = TaskDraft {
            title: request.title,
            project_id: request.project_id,
            content: request.content,
            is_all_day: request.due_date.is_some().then_some(request.all_day),
            due_date: request.due_date,
            priority: priority.as_i64(),
            parent_id: None,
        };

        let task = self.client.create_task(&draft).await?;
        debug!(task = %task.id, "task created");
        self.refresh.request();
        Ok(task)
    }

    pub async fn update_task(&self, request: UpdateTask) -> Result<Task, CoreError> {
        require("task_id", &request.task_id)?;
        require("project_id", &request.project_id)?;
        let priority = match request.priority.as_deref() {
            Some(name) => Some(parse_named_priority(name)?.as_i64()),
            None => None,
        };

        let patch = TaskPatch {
            id: request.task_id,
            project_id: request.project_id,
            title: request.title,
            content: request.content,
            due_date: request.due_date,
            priority,
        };

        let task = self.client.update_task(&patch).await?;
        debug!(task = %task.id, "task updated");
        self.refresh.request();
        Ok(task)
    }

    pub async fn complete_task(&self, project_id: &str, task_id: &str) -> Result<(), CoreError> {
        require("task_id", task_id)?;
        require("project_id", project_id)?;

        self.client.complete_task(project_id, task_id).await?;
        debug!(task = task_id, "task completed");
        self.refresh.request();
        Ok(())
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), CoreError> {
        require("task_id", task_id)?;
        require("project_id", project_id)?;

        self.client.delete_task(project_id, task_id).await?;
        debug!(task = task_id, "task deleted");
        self.refresh.request();
        Ok(())
    }

    pub async fn create_subtask(&self, request: CreateSubtask) -> Result<Task, CoreError> {
        require("parent_task_id", &request.parent_task_id)?;
        require("project_id", &request.project_id)?;
        require("title", &request.title)?;

        let draft = TaskDraft {
            title: request.title,
            project_id: request.project_id,
            content: request.content,
            parent_id: Some(request.parent_task_id),
            ..Default::default()
        };

        let task = self.client.create_task(&draft).await?;
        debug!(task = %task.id, parent = ?task.parent_id, "subtask created");
        self.refresh.request();
        Ok(task)
    }

    /// Complete a subtask. Subtasks are ordinary tasks with a parent
    /// reference, so this forwards to the same completion endpoint.
    pub async fn complete_subtask(&self, project_id: &str, task_id: &str) -> Result<(), CoreError> {
        self.complete_task(project_id, task_id).await
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// An absent priority defaults to none; a present one must be a
/// recognized name.
fn parse_priority(raw: Option<&str>) -> Result<Priority, ValidationError> {
    match raw {
        None => Ok(Priority::None),
        Some(name) => parse_named_priority(name),
    }
}

fn parse_named_priority(name: &str) -> Result<Priority, ValidationError> {
    name.parse().map_err(|_| ValidationError::InvalidValue {
        field: "priority",
        message: format!("'{}' is not one of none, low, medium, high", name),
    })
}
