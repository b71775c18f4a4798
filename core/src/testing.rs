//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::transport::{FormPart, ProgressFn, Transport};
use crate::types::{ApiTask, Task};

/// Build a local task with fresh id and timestamps.
pub(crate) fn task(title: &str, completed: bool, order: i64) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        completed,
        order,
        created_at: now,
        updated_at: now,
    }
}

fn wire(task: &Task) -> Value {
    let api = ApiTask {
        id: task.id,
        title: task.title.clone(),
        description: (!task.description.is_empty()).then(|| task.description.clone()),
        completed: task.completed,
        order: task.order,
        created_at: task.created_at,
        updated_at: task.updated_at,
    };
    serde_json::to_value(api).expect("wire task serializes")
}

/// One recorded transport call.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Recording transport returning queued responses in FIFO order. An empty
/// queue answers with an empty envelope, which ingests as "no data".
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<ApiResult<Value>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_list(tasks: &[Task]) -> Arc<Self> {
        let transport = Self::new();
        transport.push_list(tasks);
        transport
    }

    pub(crate) fn with_task(task: &Task) -> Arc<Self> {
        let transport = Self::new();
        transport.push_task(task);
        transport
    }

    pub(crate) fn with_confirmation(message: &str) -> Arc<Self> {
        let transport = Self::new();
        transport.push_confirmation(message);
        transport
    }

    pub(crate) fn push_list(&self, tasks: &[Task]) {
        let data: Vec<Value> = tasks.iter().map(wire).collect();
        self.responses
            .lock()
            .push_back(Ok(json!({"message": null, "data": data})));
    }

    pub(crate) fn push_task(&self, task: &Task) {
        self.responses
            .lock()
            .push_back(Ok(json!({"message": null, "data": wire(task)})));
    }

    pub(crate) fn push_confirmation(&self, message: &str) {
        self.responses
            .lock()
            .push_back(Ok(json!({"message": message, "data": null})));
    }

    pub(crate) fn push_error(&self, err: ApiError) {
        self.responses.lock().push_back(Err(err));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, method: &'static str, path: &str, query: &[(String, String)], body: Option<Value>) {
        self.calls.lock().push(Call {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body,
        });
    }

    fn next(&self) -> ApiResult<Value> {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"message": null, "data": null})))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.record("GET", path, query, None);
        self.next()
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.record("POST", path, &[], Some(body));
        self.next()
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.record("PUT", path, &[], Some(body));
        self.next()
    }

    async fn patch(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.record("PATCH", path, &[], Some(body));
        self.next()
    }

    async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.record("DELETE", path, &[], None);
        self.next()
    }

    async fn upload(
        &self,
        path: &str,
        parts: Vec<FormPart>,
        _on_progress: Option<ProgressFn>,
    ) -> ApiResult<Value> {
        let names: Vec<Value> = parts.iter().map(|p| json!(p.name)).collect();
        self.record("UPLOAD", path, &[], Some(Value::Array(names)));
        self.next()
    }
}
