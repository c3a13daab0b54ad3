//! Friendship lifecycle integration tests

mod common;

use assert_matches::assert_matches;
use guildchat::client::FriendsApi;
use guildchat::shared::messaging::FriendshipStatus;
use guildchat::shared::ChatError;
use uuid::Uuid;

#[tokio::test]
async fn crossing_requests_leave_exactly_one_record() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let bob = common::seed_user(&service, "bob").await;
    let friends = FriendsApi::new(service.clone());

    friends.send_request(alice, bob).await.unwrap();
    // The "simultaneous" request from the other side must be refused
    let result = friends.send_request(bob, alice).await;
    assert_matches!(result, Err(ChatError::AlreadyPending));
    assert_eq!(service.row_count("friendships"), 1);
}

#[tokio::test]
async fn accept_is_receiver_only() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let bob = common::seed_user(&service, "bob").await;
    let friends = FriendsApi::new(service.clone());

    let request = friends.send_request(alice, bob).await.unwrap();

    // The sender cannot accept their own request
    let result = friends.accept(alice, request.id).await;
    assert_matches!(result, Err(ChatError::NotAddressed));
    let record = friends.find_between(alice, bob).await.unwrap().unwrap();
    assert_eq!(record.status, FriendshipStatus::Pending);

    // The receiver can
    let accepted = friends.accept(bob, request.id).await.unwrap();
    assert_eq!(accepted.status, FriendshipStatus::Accepted);
}

#[tokio::test]
async fn repeated_accept_is_a_conflict() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let bob = common::seed_user(&service, "bob").await;
    let friends = FriendsApi::new(service.clone());

    let request = friends.send_request(alice, bob).await.unwrap();
    friends.accept(bob, request.id).await.unwrap();

    // Double-click: the record is no longer pending
    let result = friends.accept(bob, request.id).await;
    assert_matches!(result, Err(ChatError::Conflict));
    let result = friends.reject(bob, request.id).await;
    assert_matches!(result, Err(ChatError::Conflict));
}

#[tokio::test]
async fn request_after_accept_reports_already_friends() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let bob = common::seed_user(&service, "bob").await;
    let friends = FriendsApi::new(service.clone());

    let request = friends.send_request(alice, bob).await.unwrap();
    friends.accept(bob, request.id).await.unwrap();

    assert_matches!(
        friends.send_request(alice, bob).await,
        Err(ChatError::AlreadyFriends)
    );
    assert_matches!(
        friends.send_request(bob, alice).await,
        Err(ChatError::AlreadyFriends)
    );
}

#[tokio::test]
async fn rejection_does_not_block_a_new_request() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let carol = common::seed_user(&service, "carol").await;
    let friends = FriendsApi::new(service.clone());

    let request = friends.send_request(alice, carol).await.unwrap();
    friends.reject(carol, request.id).await.unwrap();

    // Rejected is a soft no: a later request replaces the stale record
    let renewed = friends.send_request(alice, carol).await.unwrap();
    assert_eq!(renewed.status, FriendshipStatus::Pending);
    assert_ne!(renewed.id, request.id);
    assert_eq!(service.row_count("friendships"), 1);
}

#[tokio::test]
async fn cancel_deletes_a_pending_request() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let bob = common::seed_user(&service, "bob").await;
    let friends = FriendsApi::new(service.clone());

    let request = friends.send_request(alice, bob).await.unwrap();
    assert_eq!(friends.incoming(bob).await.unwrap().len(), 1);

    // Only the sender may cancel
    assert_matches!(
        friends.cancel(bob, request.id).await,
        Err(ChatError::NotAddressed)
    );

    friends.cancel(alice, request.id).await.unwrap();
    assert!(friends.incoming(bob).await.unwrap().is_empty());
    assert_eq!(service.row_count("friendships"), 0);

    // Cancelling again: the record is gone
    assert_matches!(friends.cancel(alice, request.id).await, Err(ChatError::NotFound));
}

#[tokio::test]
async fn self_request_is_rejected_before_dispatch() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let friends = FriendsApi::new(service.clone());

    let result = friends.send_request(alice, alice).await;
    assert_matches!(result, Err(ChatError::Validation { .. }));
    assert_eq!(service.row_count("friendships"), 0);
}

#[tokio::test]
async fn incoming_outgoing_and_friends_views() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let bob = common::seed_user(&service, "bob").await;
    let carol = common::seed_user(&service, "carol").await;
    let friends = FriendsApi::new(service.clone());

    let from_alice = friends.send_request(alice, bob).await.unwrap();
    friends.send_request(carol, bob).await.unwrap();

    let incoming = friends.incoming(bob).await.unwrap();
    assert_eq!(incoming.len(), 2);
    assert_eq!(friends.outgoing(alice).await.unwrap().len(), 1);

    friends.accept(bob, from_alice.id).await.unwrap();
    assert_eq!(friends.incoming(bob).await.unwrap().len(), 1);

    let bobs_friends = friends.friends(bob).await.unwrap();
    assert_eq!(bobs_friends.len(), 1);
    assert_eq!(bobs_friends[0].counterparty(bob), Some(alice));
    assert_eq!(friends.friends(alice).await.unwrap().len(), 1);
    assert!(friends.friends(carol).await.unwrap().is_empty());
}
