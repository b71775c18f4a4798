//! Data-access layer for the task service.
//!
//! # Overview
//! Fetches, creates, updates, deletes and reorders tasks against the task
//! REST API and keeps a local list mirroring server state. The store never
//! applies a mutation response directly: every mutation is followed by a
//! full reload with the last-used filter, so local state is only ever a
//! projection of a fresh list fetch.
//!
//! # Design
//! - `Transport` is the seam: object-safe and injectable, with
//!   `HttpTransport` as the reqwest-backed production implementation
//!   (base URL from config, JSON headers, fixed 10 s timeout).
//! - `TaskApi` is stateless; it shapes payloads and decodes the
//!   `{message, data}` envelope.
//! - `TaskStore` owns the authoritative local list, the loading/error
//!   flags, and the debounced search.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod store;
pub mod transport;
pub mod types;

pub use client::TaskApi;
pub use config::ApiConfig;
pub use debounce::Debouncer;
pub use error::{ApiError, ApiResult};
pub use store::TaskStore;
pub use transport::{FormPart, HttpTransport, ProgressFn, Transport};
pub use types::{
    reorder_body, ApiTask, CreateTask, Envelope, ListParams, StatusFilter, Task, UpdateTask,
};

#[cfg(test)]
pub(crate) mod testing;
