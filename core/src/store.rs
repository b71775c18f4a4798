//! Task store: the state-synchronization core.
//!
//! # Design
//! The store holds the only authoritative local copy of the task list and
//! never trusts a mutation response's task content: every successful
//! mutation is followed by a full reload using the last-used list params,
//! and `tasks` is replaced wholesale from that reload. Errors are recorded
//! into shared state and propagated to the caller; nothing is retried.
//!
//! State sits behind a `RwLock` so methods take `&self` and the store can
//! be shared as `Arc<TaskStore>`. There is no guard against overlapping
//! operations: concurrent mutations each run their own reload and the last
//! reload wins. `is_loading` is a plain flag, a best-effort in-flight
//! signal rather than a per-operation counter.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::client::TaskApi;
use crate::debounce::Debouncer;
use crate::error::{ApiError, ApiResult};
use crate::types::{CreateTask, ListParams, StatusFilter, Task, UpdateTask};

/// Quiet period before a debounced search fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Default)]
struct StoreState {
    tasks: Vec<Task>,
    is_loading: bool,
    error: Option<ApiError>,
    current_params: ListParams,
}

/// Reactive task list mirroring server state.
pub struct TaskStore {
    api: TaskApi,
    state: RwLock<StoreState>,
    search_debounce: Debouncer,
}

impl TaskStore {
    pub fn new(api: TaskApi) -> Self {
        Self {
            api,
            state: RwLock::new(StoreState::default()),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE),
        }
    }

    // --- snapshots & derived views ---

    pub fn tasks(&self) -> Vec<Task> {
        self.state.read().tasks.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn error(&self) -> Option<ApiError> {
        self.state.read().error.clone()
    }

    pub fn current_params(&self) -> ListParams {
        self.state.read().current_params.clone()
    }

    /// Tasks not yet completed.
    pub fn pending(&self) -> Vec<Task> {
        self.state
            .read()
            .tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect()
    }

    /// Tasks already completed.
    pub fn completed(&self) -> Vec<Task> {
        self.state
            .read()
            .tasks
            .iter()
            .filter(|task| task.completed)
            .cloned()
            .collect()
    }

    /// Count of all tasks under the current filter.
    pub fn total(&self) -> usize {
        self.state.read().tasks.len()
    }

    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    // --- operation lifecycle ---

    fn begin(&self) {
        let mut state = self.state.write();
        state.is_loading = true;
        state.error = None;
    }

    fn finish<T>(&self, context: &'static str, result: &ApiResult<T>) {
        {
            let mut state = self.state.write();
            state.is_loading = false;
            if let Err(err) = result {
                state.error = Some(err.clone());
            }
        }
        if let Err(err) = result {
            error!(error = %err, "{context}");
        }
    }

    // --- operations ---

    /// Fetch the list with `params`, which become the stored filter
    /// replayed by later refreshes.
    pub async fn load(&self, params: ListParams) -> ApiResult<Vec<Task>> {
        self.begin();
        let result = self.load_inner(params).await;
        self.finish("failed to load tasks", &result);
        result
    }

    async fn load_inner(&self, params: ListParams) -> ApiResult<Vec<Task>> {
        self.state.write().current_params = params.clone();
        let envelope = self.api.list(&params).await?;
        let tasks: Vec<Task> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Task::from)
            .collect();
        self.state.write().tasks = tasks.clone();
        Ok(tasks)
    }

    /// Re-run the last list query.
    pub async fn refresh(&self) -> ApiResult<Vec<Task>> {
        let params = self.current_params();
        self.load(params).await
    }

    /// Fetch one task and patch it into the local list if present.
    pub async fn get(&self, id: Uuid) -> ApiResult<Task> {
        self.begin();
        let result = self.get_inner(id).await;
        self.finish("failed to load task", &result);
        result
    }

    async fn get_inner(&self, id: Uuid) -> ApiResult<Task> {
        let envelope = self.api.get(id).await?;
        let task = envelope
            .data
            .map(Task::from)
            .ok_or_else(|| ApiError::client("response carried no task data"))?;
        let mut state = self.state.write();
        if let Some(existing) = state.tasks.iter_mut().find(|t| t.id == id) {
            *existing = task.clone();
        }
        Ok(task)
    }

    /// Create a task, then reload the list. Returns the created task as it
    /// appears in the reloaded list, matched by the id the create response
    /// reported; first entry when the server omitted it.
    pub async fn create(&self, input: CreateTask) -> ApiResult<Option<Task>> {
        self.begin();
        let result = self.create_inner(input).await;
        self.finish("failed to create task", &result);
        result
    }

    async fn create_inner(&self, input: CreateTask) -> ApiResult<Option<Task>> {
        let envelope = self.api.create(&input).await?;
        info!(
            "{}",
            envelope.message.as_deref().unwrap_or("Task created successfully")
        );
        let created_id = envelope.data.map(|task| task.id);
        let tasks = self.refresh().await?;
        let created = created_id
            .and_then(|id| tasks.iter().find(|task| task.id == id))
            .or_else(|| tasks.first())
            .cloned();
        Ok(created)
    }

    /// Update a task, then reload. Returns the reloaded entry whose id
    /// matches, if the current filter still includes it.
    pub async fn update(&self, id: Uuid, patch: UpdateTask) -> ApiResult<Option<Task>> {
        self.begin();
        let result = self.update_inner(id, patch).await;
        self.finish("failed to update task", &result);
        result
    }

    async fn update_inner(&self, id: Uuid, patch: UpdateTask) -> ApiResult<Option<Task>> {
        let envelope = self.api.update(id, &patch).await?;
        info!(
            "{}",
            envelope.message.as_deref().unwrap_or("Task updated successfully")
        );
        let tasks = self.refresh().await?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    /// Delete a task, then reload.
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.begin();
        let result = self.delete_inner(id).await;
        self.finish("failed to delete task", &result);
        result
    }

    async fn delete_inner(&self, id: Uuid) -> ApiResult<()> {
        let envelope = self.api.delete(id).await?;
        info!(
            "{}",
            envelope.message.as_deref().unwrap_or("Task deleted successfully")
        );
        self.refresh().await?;
        Ok(())
    }

    /// Flip a task's completion server-side, computing the new value from
    /// the local copy. Unknown ids are a silent no-op: no request is sent.
    pub async fn toggle(&self, id: Uuid) -> ApiResult<Option<Task>> {
        let completed = {
            let state = self.state.read();
            match state.tasks.iter().find(|task| task.id == id) {
                Some(task) => task.completed,
                None => return Ok(None),
            }
        };
        self.begin();
        let result = self.toggle_inner(id, !completed).await;
        self.finish("failed to update task status", &result);
        result
    }

    async fn toggle_inner(&self, id: Uuid, completed: bool) -> ApiResult<Option<Task>> {
        let envelope = self.api.complete(id, completed).await?;
        info!(
            "{}",
            envelope
                .message
                .as_deref()
                .unwrap_or("Task status updated successfully")
        );
        let tasks = self.refresh().await?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    /// Persist a caller-supplied ordering, then reload. Positions are
    /// recomputed from the slice order.
    pub async fn reorder(&self, tasks: &[Task]) -> ApiResult<()> {
        self.begin();
        let result = self.reorder_inner(tasks).await;
        self.finish("failed to reorder tasks", &result);
        result
    }

    async fn reorder_inner(&self, tasks: &[Task]) -> ApiResult<()> {
        let envelope = self.api.reorder(tasks).await?;
        info!(
            "{}",
            envelope.message.as_deref().unwrap_or("Tasks reordered successfully")
        );
        self.refresh().await?;
        Ok(())
    }

    /// Replace the filter with a search query and reload.
    pub async fn search(&self, query: impl Into<String>) -> ApiResult<Vec<Task>> {
        self.load(ListParams {
            search: Some(query.into()),
            status: None,
        })
        .await
    }

    /// Replace the filter with a status constraint and reload.
    pub async fn filter_by_status(&self, status: StatusFilter) -> ApiResult<Vec<Task>> {
        self.load(ListParams {
            search: None,
            status: Some(status),
        })
        .await
    }

    /// Debounced search: after 500 ms of quiet, searches the trimmed query,
    /// or clears the filter when the query is blank. Only the last call in
    /// a burst fires. Failures land in store state; there is no caller left
    /// to receive them.
    pub fn debounced_search(self: Arc<Self>, query: &str) {
        let store = Arc::clone(&self);
        let query = query.trim().to_string();
        self.search_debounce.call(async move {
            // Errors are already recorded in store state by load/search.
            let _ = if query.is_empty() {
                store.load(ListParams::default()).await
            } else {
                store.search(query).await
            };
        });
    }
}
