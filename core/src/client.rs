//! Stateless mapping of task operations onto transport calls.
//!
//! # Design
//! `TaskApi` owns no state beyond the transport handle. Each operation
//! pairs a fixed path with a shaped payload and decodes the
//! `{message, data}` envelope into its typed form. List/get return wire
//! tasks; projecting them into local `Task`s is the store's job.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::transport::Transport;
use crate::types::{reorder_body, ApiTask, CreateTask, Envelope, ListParams, Task, UpdateTask};

/// Task API client over an injected [`Transport`].
#[derive(Clone)]
pub struct TaskApi {
    transport: Arc<dyn Transport>,
}

impl TaskApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, params: &ListParams) -> ApiResult<Envelope<Vec<ApiTask>>> {
        let value = self.transport.get("/tasks", &params.to_query()).await?;
        decode(value)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Envelope<ApiTask>> {
        let value = self.transport.get(&format!("/tasks/{id}"), &[]).await?;
        decode(value)
    }

    pub async fn create(&self, input: &CreateTask) -> ApiResult<Envelope<ApiTask>> {
        let value = self.transport.post("/tasks", input.to_body()).await?;
        decode(value)
    }

    pub async fn update(&self, id: Uuid, patch: &UpdateTask) -> ApiResult<Envelope<ApiTask>> {
        let value = self
            .transport
            .put(&format!("/tasks/{id}"), patch.to_body())
            .await?;
        decode(value)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<Envelope<Value>> {
        let value = self.transport.delete(&format!("/tasks/{id}")).await?;
        decode(value)
    }

    /// Positions are recomputed from the slice order; any `order` already
    /// on the inputs is ignored.
    pub async fn reorder(&self, tasks: &[Task]) -> ApiResult<Envelope<Value>> {
        let value = self
            .transport
            .patch("/tasks/reorder", reorder_body(tasks))
            .await?;
        decode(value)
    }

    pub async fn complete(&self, id: Uuid, completed: bool) -> ApiResult<Envelope<ApiTask>> {
        let value = self
            .transport
            .patch(
                &format!("/tasks/{id}/complete"),
                json!({ "completed": completed }),
            )
            .await?;
        decode(value)
    }
}

/// Decode an envelope, treating a malformed body as a client-side failure.
fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<Envelope<T>> {
    serde_json::from_value(value).map_err(ApiError::client)
}
