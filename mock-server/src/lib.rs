//! In-memory implementation of the task REST API, used by the core crate's
//! integration tests and runnable standalone.
//!
//! Every response uses the `{message, data}` envelope. The list endpoint
//! supports `search` (case-insensitive substring over title/description)
//! and `status` (`pending`/`completed`; anything else matches all), sorted
//! by `order` ascending. Creation assigns the next order position.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    /// Double option: absent means "leave as is", `null` clears.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderBody {
    pub tasks: Vec<ReorderEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub order: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadSummary {
    pub parts: usize,
    pub bytes: u64,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

pub type Db = Arc<RwLock<HashMap<Uuid, Task>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new().nest("/api", routes()).with_state(db)
}

fn routes() -> Router<Db> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/reorder", patch(reorder_tasks))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/complete", patch(complete_task))
        .route("/uploads", post(upload))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type Failure = (StatusCode, Json<Envelope<Value>>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (
        status,
        Json(Envelope {
            message: Some(message.to_string()),
            data: None,
        }),
    )
}

fn envelope<T>(message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        message: Some(message.to_string()),
        data: Some(data),
    })
}

fn matches_search(task: &Task, search: Option<&str>) -> bool {
    let Some(needle) = search else { return true };
    let needle = needle.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .contains(&needle)
}

fn matches_status(task: &Task, status: Option<&str>) -> bool {
    match status {
        Some("pending") => !task.completed,
        Some("completed") => task.completed,
        _ => true,
    }
}

async fn list_tasks(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Json<Envelope<Vec<Task>>> {
    let tasks = db.read().await;
    let mut tasks: Vec<Task> = tasks
        .values()
        .filter(|task| matches_search(task, query.search.as_deref()))
        .filter(|task| matches_status(task, query.status.as_deref()))
        .cloned()
        .collect();
    tasks.sort_by_key(|task| task.order);
    Json(Envelope {
        message: None,
        data: Some(tasks),
    })
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Envelope<Task>>), Failure> {
    if input.title.trim().is_empty() {
        return Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Title must not be empty",
        ));
    }
    let mut tasks = db.write().await;
    let order = tasks.values().map(|task| task.order).max().unwrap_or(0) + 1;
    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        completed: false,
        order,
        created_at: now,
        updated_at: now,
    };
    tasks.insert(task.id, task.clone());
    Ok((
        StatusCode::CREATED,
        envelope("Task created successfully", task),
    ))
}

async fn get_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Task>>, Failure> {
    let tasks = db.read().await;
    let task = tasks
        .get(&id)
        .cloned()
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Task not found"))?;
    Ok(Json(Envelope {
        message: None,
        data: Some(task),
    }))
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Envelope<Task>>, Failure> {
    let mut tasks = db.write().await;
    let task = tasks
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Task not found"))?;
    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Title must not be empty",
            ));
        }
        task.title = title;
    }
    if let Some(description) = input.description {
        task.description = description;
    }
    if let Some(completed) = input.completed {
        task.completed = completed;
    }
    task.updated_at = Utc::now();
    Ok(envelope("Task updated successfully", task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Value>>, Failure> {
    let mut tasks = db.write().await;
    tasks
        .remove(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Task not found"))?;
    Ok(Json(Envelope {
        message: Some("Task deleted successfully".to_string()),
        data: None,
    }))
}

async fn complete_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(body): Json<CompleteBody>,
) -> Result<Json<Envelope<Task>>, Failure> {
    let mut tasks = db.write().await;
    let task = tasks
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Task not found"))?;
    task.completed = body.completed;
    task.updated_at = Utc::now();
    Ok(envelope("Task status updated successfully", task.clone()))
}

async fn reorder_tasks(
    State(db): State<Db>,
    Json(body): Json<ReorderBody>,
) -> Json<Envelope<Value>> {
    let mut tasks = db.write().await;
    let now = Utc::now();
    for entry in body.tasks {
        if let Some(task) = tasks.get_mut(&entry.id) {
            task.order = entry.order;
            task.updated_at = now;
        }
    }
    Json(Envelope {
        message: Some("Tasks reordered successfully".to_string()),
        data: None,
    })
}

async fn upload(mut multipart: Multipart) -> Result<Json<Envelope<UploadSummary>>, Failure> {
    let mut parts = 0usize;
    let mut bytes = 0u64;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| failure(StatusCode::UNPROCESSABLE_ENTITY, "Malformed multipart body"))?
    {
        let data = field
            .bytes()
            .await
            .map_err(|_| failure(StatusCode::UNPROCESSABLE_ENTITY, "Malformed multipart body"))?;
        parts += 1;
        bytes += data.len() as u64;
    }
    Ok(envelope("Upload received", UploadSummary { parts, bytes }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::nil(),
            title: "Test".to_string(),
            description: None,
            completed: false,
            order: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn task_omits_missing_description_on_the_wire() {
        let json = serde_json::to_value(sample_task()).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["completed"], false);
        assert_eq!(json["order"], 1);
    }

    #[test]
    fn envelope_omits_missing_message() {
        let json = serde_json::to_value(Envelope {
            message: None,
            data: Some(sample_task()),
        })
        .unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["data"]["title"], "Test");
    }

    #[test]
    fn update_distinguishes_absent_from_null_description() {
        let absent: UpdateTask = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(absent.description.is_none());

        let cleared: UpdateTask = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateTask = serde_json::from_str(r#"{"description":"notes"}"#).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
    }

    #[test]
    fn create_task_rejects_missing_title() {
        let result: Result<CreateTask, _> = serde_json::from_str(r#"{"description":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reorder_body_parses_entries() {
        let body: ReorderBody = serde_json::from_str(
            r#"{"tasks":[{"id":"00000000-0000-0000-0000-000000000000","order":2}]}"#,
        )
        .unwrap();
        assert_eq!(body.tasks.len(), 1);
        assert_eq!(body.tasks[0].order, 2);
    }
}
