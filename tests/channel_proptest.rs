//! Property tests for the channel merge discipline: for any set of messages
//! and any arrival order (duplicates included), the final list is the set
//! sorted ascending by creation time with no duplicate identifiers.

use chrono::{Duration, TimeZone, Utc};
use guildchat::client::MessageLog;
use guildchat::shared::messaging::Message;
use proptest::prelude::*;
use uuid::Uuid;

/// Deterministic Fisher-Yates driven by a seed, so the shuffle itself is
/// part of the generated input
fn shuffle<T>(items: &mut [T], mut seed: u64) {
    for i in (1..items.len()).rev() {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (seed >> 33) as usize % (i + 1);
        items.swap(i, j);
    }
}

fn build_messages(offsets: &[i64]) -> Vec<Message> {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().expect("valid base time");
    offsets
        .iter()
        .map(|&offset| {
            let mut message = Message::new(Uuid::new_v4(), Uuid::new_v4(), format!("m{}", offset));
            message.created_at = base + Duration::seconds(offset);
            message
        })
        .collect()
}

proptest! {
    #[test]
    fn final_list_is_independent_of_arrival_order(
        offsets in proptest::collection::vec(0i64..50, 1..12),
        seed in any::<u64>(),
    ) {
        let messages = build_messages(&offsets);

        // Reference: in-order, exactly-once delivery
        let mut reference = MessageLog::default();
        for message in &messages {
            reference.insert(message.clone());
        }

        // Shuffled, at-least-once delivery (every event twice)
        let mut arrivals: Vec<Message> = messages
            .iter()
            .chain(messages.iter())
            .cloned()
            .collect();
        shuffle(&mut arrivals, seed);
        let mut log = MessageLog::default();
        for message in arrivals {
            log.insert(message);
        }

        let reference_ids: Vec<Uuid> = reference.as_slice().iter().map(|m| m.id).collect();
        let ids: Vec<Uuid> = log.as_slice().iter().map(|m| m.id).collect();
        prop_assert_eq!(ids, reference_ids);

        // Sorted ascending, no duplicates
        let times: Vec<_> = log.as_slice().iter().map(|m| m.created_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        prop_assert_eq!(times, sorted);
        prop_assert_eq!(log.len(), messages.len());
    }

    #[test]
    fn updates_preserve_order_and_identity(
        offsets in proptest::collection::vec(0i64..50, 1..12),
        flip in any::<prop::sample::Index>(),
    ) {
        let messages = build_messages(&offsets);
        let mut log = MessageLog::default();
        for message in &messages {
            log.insert(message.clone());
        }

        // Flip one read flag through an update event
        let target = flip.get(&messages);
        let mut updated = target.clone();
        updated.read = true;
        log.update(updated);

        prop_assert_eq!(log.len(), messages.len());
        let read_count = log.as_slice().iter().filter(|m| m.read).count();
        prop_assert_eq!(read_count, 1);
        let times: Vec<_> = log.as_slice().iter().map(|m| m.created_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        prop_assert_eq!(times, sorted);
    }
}
