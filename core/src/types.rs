//! Task wire/local shapes and request payload shaping.
//!
//! # Design
//! Wire DTOs mirror the server schema but are defined independently from
//! the mock-server crate; integration tests catch schema drift. [`Task`] is
//! the local projection installed into the store after a fetch, with
//! defaults applied for fields the server may omit. Payload shaping lives
//! here (`to_body`, [`reorder_body`]) so request bodies can be checked
//! without a transport in the loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Status constraint accepted by the list endpoint. `All` is passed through
/// and matches everything server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }
}

/// Query parameters for the list endpoint. The store keeps the last-used
/// value and replays it on every post-mutation reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
}

impl ListParams {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.as_str().to_string()));
        }
        query
    }
}

/// A task as the client sees it after ingesting a server response.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task in the server's wire format. `description`, `completed` and
/// `order` may be omitted and default on ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiTask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApiTask> for Task {
    fn from(api: ApiTask) -> Self {
        Task {
            id: api.id,
            title: api.title,
            description: api.description.unwrap_or_default(),
            completed: api.completed,
            order: api.order,
            created_at: api.created_at,
            updated_at: api.updated_at,
        }
    }
}

/// Response envelope: optional user-facing `message` plus the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Payload for creating a task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
}

impl CreateTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Create body: `description` is sent as `null` when absent or empty.
    pub fn to_body(&self) -> Value {
        json!({
            "title": self.title,
            "description": self.description.as_deref().filter(|d| !d.is_empty()),
        })
    }
}

/// Partial update for an existing task. Only `Some` fields appear in the
/// request body.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTask {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Update body: absent fields are omitted entirely; a present-but-empty
    /// description is sent as `null`.
    pub fn to_body(&self) -> Value {
        let mut body = serde_json::Map::new();
        if let Some(title) = &self.title {
            body.insert("title".to_string(), json!(title));
        }
        if let Some(description) = &self.description {
            let value = if description.is_empty() {
                Value::Null
            } else {
                json!(description)
            };
            body.insert("description".to_string(), value);
        }
        if let Some(completed) = self.completed {
            body.insert("completed".to_string(), json!(completed));
        }
        Value::Object(body)
    }
}

/// Reorder body: position is recomputed as `index + 1` over the slice
/// order; any `order` field already on the inputs is ignored.
pub fn reorder_body(tasks: &[Task]) -> Value {
    let entries: Vec<Value> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| json!({ "id": task.id, "order": index + 1 }))
        .collect();
    json!({ "tasks": entries })
}
