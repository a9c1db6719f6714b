//! TickTick open API client.
//!
//! Thin async wrapper over the REST endpoints: project listing,
//! per-project task data, and task CRUD. Authentication is a bearer
//! token obtained through the OAuth flow in [`super::oauth`].

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;
use crate::ticktick::model::{Project, Snapshot, Task, WireProject, WireProjectData, WireTask};

pub const API_BASE_URL: &str = "https://api.ticktick.com/open/v1";

/// Upper bound on any single HTTP call; keeps a hung fetch from
/// blocking the poll loop indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fields for task creation (`POST /task`). Also used for subtasks,
/// which are tasks carrying a `parent_id`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_all_day: Option<bool>,
    pub priority: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Fields for task update (`POST /task/{id}`). Absent fields are left
/// untouched remotely.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Async client for the TickTick open API.
#[derive(Debug, Clone)]
pub struct TickTickClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl TickTickClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: API_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Point the client at a different base URL (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth("invalid or expired access token".into()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// List all projects. Tasks are not populated here; fetch them per
    /// project with [`Self::project_data`].
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        debug!("GET /project");
        let resp = self
            .http
            .get(self.url("/project"))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let wire: Vec<WireProject> = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(wire
            .into_iter()
            .map(|p| p.into_project(Vec::new()))
            .collect())
    }

    /// Fetch a project together with all of its tasks.
    pub async fn project_data(&self, project_id: &str) -> Result<Project, ApiError> {
        debug!(project = project_id, "GET /project/{{id}}/data");
        let resp = self
            .http
            .get(self.url(&format!("/project/{}/data", project_id)))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let wire: WireProjectData = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let tasks = wire.tasks.into_iter().map(WireTask::into_task).collect();
        Ok(wire.project.into_project(tasks))
    }

    /// Fetch every project together with its tasks as one snapshot.
    /// Any failure aborts the whole fetch; a partial snapshot is never
    /// returned.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, ApiError> {
        let mut snapshot = Snapshot::new();
        for project in self.list_projects().await? {
            snapshot.insert_project(self.project_data(&project.id).await?);
        }
        Ok(snapshot)
    }

    /// Fetch a single task.
    pub async fn get_task(&self, project_id: &str, task_id: &str) -> Result<Task, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/project/{}/task/{}", project_id, task_id)))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let wire: WireTask = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(wire.into_task())
    }

    /// Create a task (or a subtask, when the draft carries a parent).
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        debug!(title = %draft.title, project = %draft.project_id, "POST /task");
        let resp = self
            .http
            .post(self.url("/task"))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .json(draft)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let wire: WireTask = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(wire.into_task())
    }

    /// Update an existing task.
    pub async fn update_task(&self, patch: &TaskPatch) -> Result<Task, ApiError> {
        debug!(task = %patch.id, "POST /task/{{id}}");
        let resp = self
            .http
            .post(self.url(&format!("/task/{}", patch.id)))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .json(patch)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let wire: WireTask = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(wire.into_task())
    }

    /// Mark a task complete.
    pub async fn complete_task(&self, project_id: &str, task_id: &str) -> Result<(), ApiError> {
        debug!(task = task_id, "POST complete");
        let resp = self
            .http
            .post(self.url(&format!(
                "/project/{}/task/{}/complete",
                project_id, task_id
            )))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }

    /// Delete a task.
    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), ApiError> {
        debug!(task = task_id, "DELETE task");
        let resp = self
            .http
            .delete(self.url(&format!("/project/{}/task/{}", project_id, task_id)))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }
}
