//! Live Message Channel
//!
//! Keeps the message list of one selected conversation live: an initial
//! fetch, then a realtime subscription whose insert/update events are merged
//! into the local list.
//!
//! # Merge discipline
//!
//! Events can arrive in any order, interleaved with user actions, and may be
//! delivered more than once. The list stays correct under all of it because
//! merging is order-independent: inserts are deduplicated by identifier and
//! the list is re-sorted by `(created_at, id)` after every append, so the
//! final list is identical for every arrival order.
//!
//! # Sending
//!
//! `send` writes the row and deliberately leaves local state untouched - the
//! channel's own INSERT event (the subscription includes the sender's own
//! writes) is the single path by which the sender sees the message. A failed
//! send surfaces as a retryable error; nothing retries automatically.
//!
//! # Teardown
//!
//! The subscription is owned by the channel and is released when the channel
//! is dropped, so switching conversations can never leave two subscriptions
//! feeding one list.

use serde_json::json;
use uuid::Uuid;

use crate::service::{ChangeEvent, ChangeKind, DataService, Filter, Order, Subscription,
    SubscriptionDescriptor};
use crate::shared::error::ChatError;
use crate::shared::messaging::Message;

const MESSAGES: &str = "messages";

/// Deterministic channel name for a conversation, identical regardless of
/// which party derives it (the pair is sorted). Each client opens its own
/// subscription; the shared name exists for log correlation.
pub fn channel_name(a: Uuid, b: Uuid) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("dm:{}:{}", lo, hi)
}

/// An ordered, identifier-deduplicated message list.
///
/// This is the pure merge core of the channel; it holds no I/O so the
/// ordering properties can be tested directly.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| (m.created_at, m.id));
        messages.dedup_by_key(|m| m.id);
        Self { messages }
    }

    /// Append a message unless its identifier is already present, keeping
    /// the list sorted ascending by `(created_at, id)`
    pub fn insert(&mut self, message: Message) {
        if self.messages.iter().any(|m| m.id == message.id) {
            return;
        }
        self.messages.push(message);
        self.messages.sort_by_key(|m| (m.created_at, m.id));
    }

    /// Replace the message with the same identifier; unknown identifiers are
    /// ignored (the following insert carries the current row state)
    pub fn update(&mut self, message: Message) {
        if let Some(slot) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *slot = message;
        }
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The live view of one conversation
pub struct MessageChannel<S> {
    service: S,
    me: Uuid,
    counterparty: Uuid,
    log: MessageLog,
    subscription: Subscription,
}

impl<S: DataService> MessageChannel<S> {
    /// Open the conversation between `me` and `counterparty`: subscribe,
    /// then fetch the backlog (the dedup merge absorbs any overlap between
    /// the two).
    pub async fn open(service: S, me: Uuid, counterparty: Uuid) -> Result<Self, ChatError> {
        let name = channel_name(me, counterparty);
        let subscription = service
            .subscribe(&name, SubscriptionDescriptor::table(MESSAGES))
            .await?;

        let filter = pair_filter(me, counterparty);
        let rows = service
            .select(MESSAGES, filter, Some(Order::asc("created_at")), None)
            .await?;
        let messages = rows
            .iter()
            .map(Message::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            "[channel] opened '{}' with {} messages",
            name,
            messages.len()
        );

        Ok(Self {
            service,
            me,
            counterparty,
            log: MessageLog::new(messages),
            subscription,
        })
    }

    /// The counterparty this channel is scoped to
    pub fn counterparty(&self) -> Uuid {
        self.counterparty
    }

    /// The current message list, ascending by creation time
    pub fn messages(&self) -> &[Message] {
        self.log.as_slice()
    }

    /// Wait for the next subscription event and merge it.
    ///
    /// Returns `false` once the subscription transport has closed.
    pub async fn tick(&mut self) -> bool {
        match self.subscription.next().await {
            Some(event) => {
                self.apply_event(&event);
                true
            }
            None => false,
        }
    }

    /// Merge every event that has already been delivered, without waiting
    pub fn drain(&mut self) {
        while let Some(event) = self.subscription.try_next() {
            self.apply_event(&event);
        }
    }

    /// Merge one change event into the local list. Events for rows that do
    /// not touch exactly this (me, counterparty) pair are filtered out here;
    /// the transport cannot express that predicate.
    pub fn apply_event(&mut self, event: &ChangeEvent) {
        if event.table != MESSAGES {
            return;
        }
        let message = match Message::from_row(&event.row) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[channel] undecodable message row in event: {}", e);
                return;
            }
        };
        if !message.between(self.me, self.counterparty) {
            return;
        }
        match event.kind {
            ChangeKind::Insert => self.log.insert(message),
            ChangeKind::Update => self.log.update(message),
            // Messages are never deleted in any supported flow
            ChangeKind::Delete => {}
        }
    }

    /// Send a message to the counterparty.
    ///
    /// The local list is not touched on success; the subscription's insert
    /// event updates it.
    pub async fn send(&self, content: &str) -> Result<Message, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::validation(
                "content",
                "message content cannot be empty",
            ));
        }
        let message = Message::new(self.me, self.counterparty, content);
        let row = self.service.insert(MESSAGES, message.to_row()?).await?;
        Ok(Message::from_row(&row)?)
    }

    /// Mark every unread message from the counterparty as read.
    ///
    /// Fire-and-forget: marking read never blocks messaging, so failures are
    /// logged and swallowed. Idempotent - a second call finds nothing to
    /// update.
    pub async fn mark_read(&self) {
        let filter = Filter::and(vec![
            Filter::eq("sender_id", self.counterparty.to_string()),
            Filter::eq("receiver_id", self.me.to_string()),
            Filter::eq("read", false),
        ]);
        match self.service.update(MESSAGES, filter, json!({ "read": true })).await {
            Ok(updated) => {
                if !updated.is_empty() {
                    tracing::debug!("[channel] marked {} messages read", updated.len());
                }
            }
            Err(e) => {
                tracing::warn!("[channel] failed to mark conversation read: {}", e);
            }
        }
    }

    /// Close the channel, releasing the subscription
    pub fn close(self) {
        tracing::debug!("[channel] closed '{}'", self.subscription.channel());
        // Dropping self releases the subscription
    }
}

/// Messages exchanged between exactly this pair, in either direction
fn pair_filter(a: Uuid, b: Uuid) -> Filter {
    Filter::or(vec![
        Filter::and(vec![
            Filter::eq("sender_id", a.to_string()),
            Filter::eq("receiver_id", b.to_string()),
        ]),
        Filter::and(vec![
            Filter::eq("sender_id", b.to_string()),
            Filter::eq("receiver_id", a.to_string()),
        ]),
    ])
}
