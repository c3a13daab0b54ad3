//! Friendship State Machine
//!
//! Manages the friend-request lifecycle:
//! none -> pending -> { accepted, rejected, cancelled/deleted }.
//!
//! # Duplicate prevention
//!
//! `send_request` pre-checks for an existing record in BOTH orderings of the
//! user pair (either party could have asked first), then inserts. The
//! pre-check alone is race-prone - two simultaneous requests can both pass
//! it - so the storage layer carries a unique index on the normalized pair
//! and an insert `Conflict` is mapped to `AlreadyPending` as the canonical
//! signal.
//!
//! # Concurrent transitions
//!
//! `accept`, `reject` and `cancel` are conditional writes filtered on
//! `status = pending`: if the record changed underneath (double-click, or
//! the other party acted first), zero rows are affected and the caller gets
//! `Conflict` instead of silently re-writing a settled record.
//!
//! A `rejected` record is a soft no, not a permanent block: a later request
//! between the same pair replaces it.

use serde_json::json;
use uuid::Uuid;

use crate::service::{DataService, Filter, Order, ServiceError};
use crate::shared::error::ChatError;
use crate::shared::messaging::{Friendship, FriendshipStatus};

const FRIENDSHIPS: &str = "friendships";

/// Friend-request operations for one service connection
#[derive(Clone)]
pub struct FriendsApi<S> {
    service: S,
}

impl<S: DataService> FriendsApi<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Send a friend request from `me` to `target`.
    ///
    /// Fails with `AlreadyPending` if an active pending record exists in
    /// either direction, and with `AlreadyFriends` if the pair already has an
    /// accepted record. A stale rejected record is replaced.
    pub async fn send_request(&self, me: Uuid, target: Uuid) -> Result<Friendship, ChatError> {
        if me == target {
            return Err(ChatError::validation(
                "receiver_id",
                "cannot send a friend request to yourself",
            ));
        }

        if let Some(existing) = self.find_between(me, target).await? {
            match existing.status {
                FriendshipStatus::Pending => return Err(ChatError::AlreadyPending),
                FriendshipStatus::Accepted => return Err(ChatError::AlreadyFriends),
                FriendshipStatus::Rejected => {
                    // Soft no: clear the stale record so the pair can try again
                    self.service
                        .delete(FRIENDSHIPS, Filter::eq("id", existing.id.to_string()))
                        .await?;
                    tracing::debug!(
                        "[friends] replaced rejected record {} for new request",
                        existing.id
                    );
                }
            }
        }

        let friendship = Friendship::new(me, target);
        match self.service.insert(FRIENDSHIPS, friendship.to_row()?).await {
            Ok(row) => {
                tracing::info!("[friends] request {} sent from {} to {}", friendship.id, me, target);
                Ok(Friendship::from_row(&row)?)
            }
            // The unique pair index caught a concurrent request from either side
            Err(ServiceError::Conflict { .. }) => Err(ChatError::AlreadyPending),
            Err(e) => Err(e.into()),
        }
    }

    /// Accept a pending request addressed to `me`
    pub async fn accept(&self, me: Uuid, request_id: Uuid) -> Result<Friendship, ChatError> {
        self.transition(me, request_id, FriendshipStatus::Accepted).await
    }

    /// Reject a pending request addressed to `me`
    pub async fn reject(&self, me: Uuid, request_id: Uuid) -> Result<Friendship, ChatError> {
        self.transition(me, request_id, FriendshipStatus::Rejected).await
    }

    /// Cancel a pending request previously sent by `me` (deletes the record)
    pub async fn cancel(&self, me: Uuid, request_id: Uuid) -> Result<(), ChatError> {
        let existing = self.get(request_id).await?.ok_or(ChatError::NotFound)?;
        if existing.sender_id != me {
            return Err(ChatError::NotAddressed);
        }
        if !existing.is_pending() {
            return Err(ChatError::Conflict);
        }
        let removed = self
            .service
            .delete(
                FRIENDSHIPS,
                Filter::and(vec![
                    Filter::eq("id", request_id.to_string()),
                    Filter::eq("status", FriendshipStatus::Pending.as_str()),
                ]),
            )
            .await?;
        if removed == 0 {
            // The receiver settled the request while we were cancelling
            return Err(ChatError::Conflict);
        }
        tracing::info!("[friends] request {} cancelled by sender", request_id);
        Ok(())
    }

    /// Pending requests addressed to `me`, newest first
    pub async fn incoming(&self, me: Uuid) -> Result<Vec<Friendship>, ChatError> {
        self.list_pending(Filter::eq("receiver_id", me.to_string())).await
    }

    /// Pending requests sent by `me`, newest first
    pub async fn outgoing(&self, me: Uuid) -> Result<Vec<Friendship>, ChatError> {
        self.list_pending(Filter::eq("sender_id", me.to_string())).await
    }

    /// Accepted friendships involving `me`
    pub async fn friends(&self, me: Uuid) -> Result<Vec<Friendship>, ChatError> {
        let filter = Filter::and(vec![
            Filter::eq("status", FriendshipStatus::Accepted.as_str()),
            Filter::or(vec![
                Filter::eq("sender_id", me.to_string()),
                Filter::eq("receiver_id", me.to_string()),
            ]),
        ]);
        let rows = self
            .service
            .select(FRIENDSHIPS, filter, Some(Order::desc("created_at")), None)
            .await?;
        Ok(rows
            .iter()
            .map(Friendship::from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// The friendship record between two users, if any, testing both
    /// orderings of the pair
    pub async fn find_between(&self, a: Uuid, b: Uuid) -> Result<Option<Friendship>, ChatError> {
        let filter = Filter::or(vec![
            Filter::and(vec![
                Filter::eq("sender_id", a.to_string()),
                Filter::eq("receiver_id", b.to_string()),
            ]),
            Filter::and(vec![
                Filter::eq("sender_id", b.to_string()),
                Filter::eq("receiver_id", a.to_string()),
            ]),
        ]);
        let rows = self.service.select(FRIENDSHIPS, filter, None, Some(1)).await?;
        Ok(rows.first().map(Friendship::from_row).transpose()?)
    }

    async fn get(&self, request_id: Uuid) -> Result<Option<Friendship>, ChatError> {
        let rows = self
            .service
            .select(FRIENDSHIPS, Filter::eq("id", request_id.to_string()), None, Some(1))
            .await?;
        Ok(rows.first().map(Friendship::from_row).transpose()?)
    }

    async fn list_pending(&self, side: Filter) -> Result<Vec<Friendship>, ChatError> {
        let filter = Filter::and(vec![
            Filter::eq("status", FriendshipStatus::Pending.as_str()),
            side,
        ]);
        let rows = self
            .service
            .select(FRIENDSHIPS, filter, Some(Order::desc("created_at")), None)
            .await?;
        Ok(rows
            .iter()
            .map(Friendship::from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Status transition permitted only to the receiver of a pending record
    async fn transition(
        &self,
        me: Uuid,
        request_id: Uuid,
        to: FriendshipStatus,
    ) -> Result<Friendship, ChatError> {
        let existing = self.get(request_id).await?.ok_or(ChatError::NotFound)?;
        if existing.receiver_id != me {
            return Err(ChatError::NotAddressed);
        }
        if !existing.is_pending() {
            return Err(ChatError::Conflict);
        }

        // Conditional on the record still being pending
        let updated = self
            .service
            .update(
                FRIENDSHIPS,
                Filter::and(vec![
                    Filter::eq("id", request_id.to_string()),
                    Filter::eq("status", FriendshipStatus::Pending.as_str()),
                ]),
                json!({ "status": to.as_str() }),
            )
            .await?;

        match updated.into_iter().next() {
            Some(row) => {
                tracing::info!("[friends] request {} {}", request_id, to.as_str());
                Ok(Friendship::from_row(&row)?)
            }
            None => Err(ChatError::Conflict),
        }
    }
}
