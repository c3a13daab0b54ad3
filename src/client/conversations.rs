//! Conversation Aggregator
//!
//! Derives the conversation list from the flat message table: one summary
//! per counterparty with the most recent message and the unread count.
//!
//! There is no incremental state. Every trigger (mount, or any relevant
//! realtime event) re-derives from the authoritative row set, which makes
//! the output trivially idempotent: recomputing with no intervening writes
//! yields the identical list.

use std::collections::HashMap;

use uuid::Uuid;

use crate::service::{DataService, Filter, Order};
use crate::shared::error::ChatError;
use crate::shared::messaging::{ConversationSummary, Message};

use super::profiles;

const MESSAGES: &str = "messages";

/// Pure aggregation step: group messages by counterparty, pick the latest
/// message per group, count unread, sort by recency (newest conversation
/// first). Profiles are left unattached.
pub fn aggregate(messages: &[Message], me: Uuid) -> Vec<ConversationSummary> {
    let mut groups: HashMap<Uuid, (&Message, u32)> = HashMap::new();
    for message in messages {
        let Some(counterparty) = message.counterparty(me) else {
            continue;
        };
        let unread = u32::from(message.receiver_id == me && !message.read);
        groups
            .entry(counterparty)
            .and_modify(|(last, count)| {
                if (message.created_at, message.id) > (last.created_at, last.id) {
                    *last = message;
                }
                *count += unread;
            })
            .or_insert((message, unread));
    }

    let mut summaries: Vec<ConversationSummary> = groups
        .into_iter()
        .map(|(counterparty_id, (last, unread_count))| ConversationSummary {
            counterparty_id,
            profile: None,
            last_message: last.content.clone(),
            last_message_at: last.created_at,
            unread_count,
        })
        .collect();

    // Newest conversation first; counterparty id as a stable tie-break
    summaries.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.counterparty_id.cmp(&b.counterparty_id))
    });
    summaries
}

/// Conversation-list reads for one service connection
#[derive(Clone)]
pub struct ConversationsApi<S> {
    service: S,
}

impl<S: DataService> ConversationsApi<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Current conversation list for `me`, with counterparty profiles
    /// attached where they exist
    pub async fn summaries(&self, me: Uuid) -> Result<Vec<ConversationSummary>, ChatError> {
        let filter = Filter::or(vec![
            Filter::eq("sender_id", me.to_string()),
            Filter::eq("receiver_id", me.to_string()),
        ]);
        let rows = self
            .service
            .select(MESSAGES, filter, Some(Order::asc("created_at")), None)
            .await?;
        let messages = rows
            .iter()
            .map(Message::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let mut summaries = aggregate(&messages, me);

        let counterparties: Vec<Uuid> = summaries.iter().map(|s| s.counterparty_id).collect();
        let mut profiles = profiles::fetch(&self.service, &counterparties).await?;
        for summary in &mut summaries {
            summary.profile = profiles.remove(&summary.counterparty_id);
        }
        Ok(summaries)
    }
}
