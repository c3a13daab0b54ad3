//! Hosted Data & Realtime Service Client
//!
//! `RestService` speaks to the managed service over HTTP:
//!
//! - rows: `{base}/rest/v1/{table}` with filter predicates rendered into the
//!   query string
//! - functions: `{base}/functions/v1/{name}`, returning a `{ data, error }`
//!   envelope
//! - storage: `{base}/storage/v1/object/...`
//! - realtime: `{base}/realtime/v1/{channel}`, a long-lived response whose
//!   body is a stream of `data: {json}` lines, one change event per line
//!
//! The subscribe transport follows the long-lived-response pattern: a spawned
//! reader task parses the byte stream and forwards events into the
//! `Subscription` handle; dropping the handle aborts the reader.

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::shared::config::ServiceConfig;

use super::error::ServiceError;
use super::event::{ChangeEvent, SubscriptionDescriptor};
use super::filter::{Filter, Order};
use super::subscription::Subscription;
use super::DataService;

/// HTTP client for the managed Data & Realtime Service
#[derive(Clone)]
pub struct RestService {
    config: ServiceConfig,
    http: reqwest::Client,
}

impl RestService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn rows_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base(), table)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    /// Map non-success statuses onto the service error taxonomy
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            409 => Err(ServiceError::conflict(body)),
            404 => Err(ServiceError::not_found(body)),
            _ => Err(ServiceError::network(format!("HTTP {}: {}", status, body))),
        }
    }

    fn query_pairs(
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> Vec<(String, String)> {
        let mut pairs = filter.to_query_pairs();
        if let Some(order) = order {
            pairs.push(("order".to_string(), order.to_query_value()));
        }
        if let Some(limit) = limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Accumulates raw stream bytes and yields the payload of each complete
/// `data:` line.
///
/// The transport chunks at arbitrary byte offsets, so a multi-byte UTF-8
/// sequence can arrive split across chunks. Bytes stay unconverted in the
/// buffer; only a complete line (up to `\n`) is decoded, keeping split
/// sequences intact.
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.bytes.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(newline) = self.bytes.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.bytes.drain(..=newline).collect();
            match std::str::from_utf8(&line) {
                Ok(text) => {
                    if let Some(data) = text.trim().strip_prefix("data:") {
                        payloads.push(data.trim().to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!("[realtime] dropped non-utf8 line: {}", e);
                }
            }
        }
        payloads
    }
}

impl DataService for RestService {
    async fn select(
        &self,
        table: &str,
        filter: Filter,
        order: Option<Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ServiceError> {
        let pairs = Self::query_pairs(&filter, order.as_ref(), limit);
        let request = self.with_auth(self.http.get(self.rows_url(table))).query(&pairs);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, ServiceError> {
        let request = self
            .with_auth(self.http.post(self.rows_url(table)))
            .header("Prefer", "return=representation")
            .json(&row);
        let response = Self::check(request.send().await?).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(ServiceError::network("insert returned no representation"));
        }
        Ok(rows.remove(0))
    }

    async fn update(
        &self,
        table: &str,
        filter: Filter,
        changes: Value,
    ) -> Result<Vec<Value>, ServiceError> {
        let pairs = Self::query_pairs(&filter, None, None);
        let request = self
            .with_auth(self.http.patch(self.rows_url(table)))
            .header("Prefer", "return=representation")
            .query(&pairs)
            .json(&changes);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn delete(&self, table: &str, filter: Filter) -> Result<u64, ServiceError> {
        let pairs = Self::query_pairs(&filter, None, None);
        let request = self
            .with_auth(self.http.delete(self.rows_url(table)))
            .header("Prefer", "return=representation")
            .query(&pairs);
        let response = Self::check(request.send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        Ok(rows.len() as u64)
    }

    async fn subscribe(
        &self,
        channel: &str,
        descriptor: SubscriptionDescriptor,
    ) -> Result<Subscription, ServiceError> {
        let url = format!("{}/realtime/v1/{}", self.config.base(), channel);
        let request = self
            .with_auth(self.http.get(url))
            .query(&[("table", descriptor.table.as_str())]);
        let response = Self::check(request.send().await?).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let name = channel.to_string();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = LineBuffer::new();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!("[realtime] stream error on '{}': {}", task_name, e);
                        break;
                    }
                };
                for data in buffer.push(&chunk) {
                    match serde_json::from_str::<ChangeEvent>(&data) {
                        Ok(event) => {
                            if !descriptor.matches(&event) {
                                continue;
                            }
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                "[realtime] undecodable event on '{}': {}",
                                task_name,
                                e
                            );
                        }
                    }
                }
            }
            tracing::debug!("[realtime] stream for '{}' ended", task_name);
        });
        tracing::debug!("[realtime] subscription '{}' opened", name);
        Ok(Subscription::new(name, rx, task))
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, ServiceError> {
        let url = format!("{}/functions/v1/{}", self.config.base(), function);
        let request = self.with_auth(self.http.post(url)).json(&body);
        let response = Self::check(request.send().await?).await?;
        let envelope: Value = response.json().await?;
        if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(ServiceError::network(message));
        }
        Ok(envelope.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.config.base(), bucket, path);
        let request = self.with_auth(self.http.post(url)).body(bytes);
        Self::check(request.send().await?).await?;
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base(),
            bucket,
            path
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ServiceError> {
        let url = format!("{}/storage/v1/object/{}", self.config.base(), bucket);
        let request = self
            .with_auth(self.http.delete(url))
            .json(&serde_json::json!({ "prefixes": paths }));
        Self::check(request.send().await?).await?;
        Ok(())
    }
}
