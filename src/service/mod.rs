//! Data & Realtime Service Boundary
//!
//! The managed backend-as-a-service is consumed through one trait:
//! row CRUD with filter predicates, a realtime change-event subscription
//! primitive, serverside function invocation and object storage. Everything
//! the wider application treats as "the backend" (persistence, auth,
//! row-level policy, fan-out) lives behind this boundary.
//!
//! Two implementations ship with the crate:
//!
//! - `MemoryService` - complete in-process implementation; the reference
//!   semantics for the boundary and the double every test runs against
//! - `RestService` - HTTP client for a hosted service
//!
//! # Rows
//!
//! Rows cross the boundary as JSON objects (`serde_json::Value`); the typed
//! records in `shared::messaging` convert with `from_row`/`to_row`.
//!
//! # Delivery guarantees
//!
//! Subscriptions deliver change events at least once while active, with no
//! ordering guarantee between events for unrelated rows. Consumers must merge
//! idempotently; the client modules do so by identifier-dedup plus re-sort.

pub mod error;
pub mod event;
pub mod filter;
pub mod memory;
pub mod rest;
pub mod subscription;

pub use error::ServiceError;
pub use event::{ChangeEvent, ChangeKind, SubscriptionDescriptor};
pub use filter::{Filter, Order};
pub use memory::MemoryService;
pub use rest::RestService;
pub use subscription::Subscription;

use serde_json::Value;

/// The Data & Realtime Service consumed by the messaging client.
///
/// All row operations are last-writer-wins at the row level; conditional
/// behavior is expressed through filters (e.g. updating only rows still in an
/// expected status). `insert` surfaces uniqueness violations as
/// [`ServiceError::Conflict`].
#[allow(async_fn_in_trait)]
pub trait DataService {
    /// Query rows from a table
    async fn select(
        &self,
        table: &str,
        filter: Filter,
        order: Option<Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ServiceError>;

    /// Insert one row; returns the stored row
    async fn insert(&self, table: &str, row: Value) -> Result<Value, ServiceError>;

    /// Update all rows matching `filter` with the fields of `changes`;
    /// returns the updated rows
    async fn update(
        &self,
        table: &str,
        filter: Filter,
        changes: Value,
    ) -> Result<Vec<Value>, ServiceError>;

    /// Delete all rows matching `filter`; returns the number removed
    async fn delete(&self, table: &str, filter: Filter) -> Result<u64, ServiceError>;

    /// Open a realtime subscription under a caller-chosen channel name.
    ///
    /// The channel name does not scope delivery (the descriptor does); it
    /// exists so that both parties of a conversation derive the same name for
    /// log correlation.
    async fn subscribe(
        &self,
        channel: &str,
        descriptor: SubscriptionDescriptor,
    ) -> Result<Subscription, ServiceError>;

    /// Invoke a serverside function with a JSON body
    async fn invoke(&self, function: &str, body: Value) -> Result<Value, ServiceError>;

    /// Upload an object; returns the stored path
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>)
        -> Result<String, ServiceError>;

    /// Public URL for a stored object
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects from a bucket
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ServiceError>;
}
