//! GuildChat - Realtime Direct-Messaging Core
//!
//! GuildChat is the messaging core of a gaming-community application:
//! one-to-one conversations, live message delivery, unread tracking and the
//! friend-request lifecycle, implemented as a client of a managed
//! Data & Realtime Service.
//!
//! # Module Structure
//!
//! The library is organized into three main modules:
//!
//! - **`shared`** - Domain types and configuration
//!   - `Message`, `Friendship`, `Profile`, `ConversationSummary`
//!   - Error types and service configuration
//!
//! - **`service`** - The Data & Realtime Service boundary
//!   - `DataService` trait: row CRUD with filter predicates, realtime
//!     subscriptions, serverside function invocation, object storage
//!   - `MemoryService`: complete in-process implementation (also the test double)
//!   - `RestService`: HTTP implementation against a hosted service
//!
//! - **`client`** - The messaging subsystem proper
//!   - `FriendsApi`: request/accept/reject/cancel lifecycle
//!   - `ConversationsApi`: per-counterparty conversation summaries
//!   - `MessageChannel`: live, ordered, deduplicated message list for one
//!     conversation
//!
//! # Design
//!
//! Persistence, auth, fan-out and row-level authorization all live behind the
//! `DataService` boundary; this crate only adds local reconciliation logic on
//! top of it. Every operation takes the current user's identifier explicitly -
//! there is no ambient auth context - so the whole subsystem can be driven and
//! tested without any UI or network.
//!
//! # Error Handling
//!
//! - `service::ServiceError` for boundary failures (network, conflict, ...)
//! - `shared::ChatError` for client-level outcomes (`AlreadyPending`,
//!   `NotAddressed`, validation failures, ...)
//!
//! Read-state updates are fire-and-forget: failures are logged, never surfaced.

/// Domain types, errors and configuration
pub mod shared;

/// Data & Realtime Service boundary
pub mod service;

/// Messaging client: friends, conversations, live channels
pub mod client;
