//! In-Process Data & Realtime Service
//!
//! `MemoryService` is a complete implementation of the service boundary:
//! JSON-row tables with filter evaluation, unique indexes, registered
//! serverside functions, an object store, and change-event fan-out over a
//! `tokio::sync::broadcast` channel.
//!
//! It defines the reference semantics the client modules are written
//! against, and it is the double every integration test runs on.
//!
//! # Constraints
//!
//! `new()` installs the one constraint the hosted schema carries: a unique
//! index on the normalized (min, max) user pair of the `friendships` table.
//! An insert violating it fails with `ServiceError::Conflict`, which the
//! friends client maps to `AlreadyPending` - the canonical duplicate signal
//! that closes the check-then-insert race.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use super::error::ServiceError;
use super::event::{ChangeEvent, ChangeKind, SubscriptionDescriptor};
use super::filter::{Filter, Order};
use super::subscription::Subscription;
use super::DataService;

/// Broadcast capacity for change events
const EVENT_CAPACITY: usize = 1000;

/// A serverside function registered with the service
pub type ServiceFunction = Box<dyn Fn(Value) -> Result<Value, ServiceError> + Send + Sync>;

/// Derives the uniqueness key of a row; rows yielding the same `Some` key
/// collide
type UniqueKeyFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

struct UniqueIndex {
    name: String,
    key: UniqueKeyFn,
}

struct Inner {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    indexes: Mutex<HashMap<String, Vec<UniqueIndex>>>,
    functions: Mutex<HashMap<String, ServiceFunction>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    events: broadcast::Sender<ChangeEvent>,
}

/// In-process implementation of the Data & Realtime Service
#[derive(Clone)]
pub struct MemoryService {
    inner: Arc<Inner>,
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryService {
    /// Create an empty service with the standard schema constraints
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let service = Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(HashMap::new()),
                indexes: Mutex::new(HashMap::new()),
                functions: Mutex::new(HashMap::new()),
                objects: Mutex::new(HashMap::new()),
                events,
            }),
        };
        // Unique index on the unordered friendship pair
        service.register_unique("friendships", "friendships_pair_key", |row| {
            let sender = row.get("sender_id")?.as_str()?;
            let receiver = row.get("receiver_id")?.as_str()?;
            let (lo, hi) = if sender <= receiver {
                (sender, receiver)
            } else {
                (receiver, sender)
            };
            Some(format!("{}:{}", lo, hi))
        });
        service
    }

    /// Register a unique index on a table
    pub fn register_unique(
        &self,
        table: &str,
        name: &str,
        key: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) {
        let mut indexes = self.lock_indexes();
        indexes.entry(table.to_string()).or_default().push(UniqueIndex {
            name: name.to_string(),
            key: Box::new(key),
        });
    }

    /// Register a serverside function reachable through `invoke`
    pub fn register_function(
        &self,
        name: &str,
        function: impl Fn(Value) -> Result<Value, ServiceError> + Send + Sync + 'static,
    ) {
        let mut functions = self.lock_functions();
        functions.insert(name.to_string(), Box::new(function));
    }

    /// Number of rows currently in a table
    pub fn row_count(&self, table: &str) -> usize {
        self.lock_tables().get(table).map_or(0, |rows| rows.len())
    }

    /// Stored bytes for an object, if present
    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.lock_objects().get(&object_key(bucket, path)).cloned()
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.inner.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_indexes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<UniqueIndex>>> {
        self.inner.indexes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_functions(&self) -> std::sync::MutexGuard<'_, HashMap<String, ServiceFunction>> {
        self.inner.functions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.inner.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: ChangeEvent) {
        // No subscribers is fine; events are only fan-out
        match self.inner.events.send(event) {
            Ok(subscribers) => {
                tracing::debug!("[realtime] event delivered to {} subscribers", subscribers)
            }
            Err(_) => tracing::debug!("[realtime] no subscribers for event"),
        }
    }
}

impl DataService for MemoryService {
    async fn select(
        &self,
        table: &str,
        filter: Filter,
        order: Option<Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ServiceError> {
        let tables = self.lock_tables();
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = cmp_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, ServiceError> {
        if !row.is_object() {
            return Err(ServiceError::network("insert payload must be an object"));
        }
        {
            let mut tables = self.lock_tables();
            let indexes = self.lock_indexes();
            let existing = tables.entry(table.to_string()).or_default();
            if let Some(table_indexes) = indexes.get(table) {
                for index in table_indexes {
                    if let Some(new_key) = (index.key)(&row) {
                        let collides = existing
                            .iter()
                            .any(|r| (index.key)(r).as_deref() == Some(new_key.as_str()));
                        if collides {
                            return Err(ServiceError::conflict(format!(
                                "unique index '{}' violated",
                                index.name
                            )));
                        }
                    }
                }
            }
            existing.push(row.clone());
        }
        self.emit(ChangeEvent::insert(table, row.clone()));
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: Filter,
        changes: Value,
    ) -> Result<Vec<Value>, ServiceError> {
        let changed_fields = changes
            .as_object()
            .ok_or_else(|| ServiceError::network("update payload must be an object"))?
            .clone();

        let mut updated = Vec::new();
        {
            let mut tables = self.lock_tables();
            if let Some(rows) = tables.get_mut(table) {
                for row in rows.iter_mut() {
                    if !filter.matches(row) {
                        continue;
                    }
                    if let Some(object) = row.as_object_mut() {
                        for (key, value) in &changed_fields {
                            object.insert(key.clone(), value.clone());
                        }
                    }
                    updated.push(row.clone());
                }
            }
        }
        for row in &updated {
            self.emit(ChangeEvent::update(table, row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: Filter) -> Result<u64, ServiceError> {
        let mut removed = Vec::new();
        {
            let mut tables = self.lock_tables();
            if let Some(rows) = tables.get_mut(table) {
                rows.retain(|row| {
                    if filter.matches(row) {
                        removed.push(row.clone());
                        false
                    } else {
                        true
                    }
                });
            }
        }
        for row in &removed {
            self.emit(ChangeEvent::delete(table, row.clone()));
        }
        Ok(removed.len() as u64)
    }

    async fn subscribe(
        &self,
        channel: &str,
        descriptor: SubscriptionDescriptor,
    ) -> Result<Subscription, ServiceError> {
        let mut events = self.inner.events.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let name = channel.to_string();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if !descriptor.matches(&event) {
                            continue;
                        }
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[realtime] subscription '{}' lagged, skipped {} events",
                            task_name,
                            skipped
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        tracing::debug!("[realtime] subscription '{}' opened", name);
        Ok(Subscription::new(name, rx, task))
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, ServiceError> {
        let functions = self.lock_functions();
        let registered = functions
            .get(function)
            .ok_or_else(|| ServiceError::not_found(format!("function '{}'", function)))?;
        registered(body)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        self.lock_objects().insert(object_key(bucket, path), bytes);
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ServiceError> {
        let mut objects = self.lock_objects();
        for path in paths {
            objects.remove(&object_key(bucket, path));
        }
        Ok(())
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path)
}

/// Ordering over JSON values for `select` sorting. RFC3339 timestamp columns
/// sort correctly as strings.
fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
