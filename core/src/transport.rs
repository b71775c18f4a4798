//! HTTP transport: the seam between the API client and the network.
//!
//! # Design
//! [`Transport`] is an object-safe trait so the API client and store can be
//! driven by a test double; [`HttpTransport`] is the reqwest-backed
//! implementation bound to a base URL. Bodies cross the trait as
//! `serde_json::Value`; typed decoding happens one layer up in `TaskApi`.
//! Failures are always converted to [`ApiError`], never swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Progress callback for uploads, invoked with `(bytes_sent, bytes_total)`
/// per form part as its content streams out.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// One named part of a multipart upload.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data,
        }
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// HTTP operations the task API is built on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value>;
    async fn post(&self, path: &str, body: Value) -> ApiResult<Value>;
    async fn put(&self, path: &str, body: Value) -> ApiResult<Value>;
    async fn patch(&self, path: &str, body: Value) -> ApiResult<Value>;
    async fn delete(&self, path: &str) -> ApiResult<Value>;
    async fn upload(
        &self,
        path: &str,
        parts: Vec<FormPart>,
        on_progress: Option<ProgressFn>,
    ) -> ApiResult<Value>;
}

/// reqwest-backed transport with JSON headers and a fixed timeout.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        // Content-type is set per request: `json()` on bodied calls,
        // multipart with boundary on uploads.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ApiError::client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<Value> {
        let response = request.send().await.map_err(convert_send_error)?;
        let status = response.status();
        let body = decode_body(response).await;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::server(status.as_u16(), body))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.send(self.client.get(&url).query(query)).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.send(self.client.post(&url).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "PUT");
        self.send(self.client.put(&url).json(&body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "PATCH");
        self.send(self.client.patch(&url).json(&body)).await
    }

    async fn delete(&self, path: &str) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        self.send(self.client.delete(&url)).await
    }

    async fn upload(
        &self,
        path: &str,
        parts: Vec<FormPart>,
        on_progress: Option<ProgressFn>,
    ) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, parts = parts.len(), "POST multipart");

        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            let FormPart {
                name,
                file_name,
                content_type,
                data,
            } = part;
            let total = data.len() as u64;
            let body = match &on_progress {
                Some(callback) => reqwest::Body::wrap_stream(progress_stream(
                    data,
                    total,
                    Arc::clone(callback),
                )),
                None => reqwest::Body::from(data),
            };
            let mut form_part = reqwest::multipart::Part::stream_with_length(body, total);
            if let Some(file_name) = file_name {
                form_part = form_part.file_name(file_name);
            }
            if let Some(content_type) = content_type {
                form_part = form_part.mime_str(&content_type).map_err(ApiError::client)?;
            }
            form = form.part(name, form_part);
        }

        self.send(self.client.post(&url).multipart(form)).await
    }
}

/// Classify a reqwest failure: builder problems never hit the wire, the
/// rest count as "sent, no usable response".
fn convert_send_error(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::client(err)
    } else {
        ApiError::Network
    }
}

/// Decode a response body: JSON when possible, raw text otherwise, null
/// when empty.
async fn decode_body(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Chunk `data` and report cumulative progress as each chunk is pulled off
/// the stream.
fn progress_stream(
    data: Vec<u8>,
    total: u64,
    on_progress: ProgressFn,
) -> impl Stream<Item = Result<Bytes, std::convert::Infallible>> {
    let chunks: Vec<Bytes> = data
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(Bytes::copy_from_slice)
        .collect();
    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        on_progress(sent, total);
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let transport =
            HttpTransport::new(&ApiConfig::with_base_url("http://localhost:8000/api/")).unwrap();
        assert_eq!(transport.url("/tasks"), "http://localhost:8000/api/tasks");
    }

    #[tokio::test]
    async fn progress_stream_reports_cumulative_bytes() {
        let seen: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressFn = Arc::new(move |sent, total| sink.lock().push((sent, total)));

        let data = vec![0u8; UPLOAD_CHUNK_SIZE + 10];
        let total = data.len() as u64;
        let chunks: Vec<_> = progress_stream(data, total, callback).collect().await;

        assert_eq!(chunks.len(), 2);
        let seen = seen.lock();
        assert_eq!(*seen, vec![(UPLOAD_CHUNK_SIZE as u64, total), (total, total)]);
    }

    #[tokio::test]
    async fn progress_stream_empty_data_yields_nothing() {
        let callback: ProgressFn = Arc::new(|_, _| panic!("no progress expected"));
        let chunks: Vec<_> = progress_stream(Vec::new(), 0, callback).collect().await;
        assert!(chunks.is_empty());
    }
}
