//! Profile avatar and coin wallet integration tests

mod common;

use std::collections::HashMap;
use std::sync::Mutex;

use assert_matches::assert_matches;
use guildchat::client::{ProfilesApi, WalletApi};
use guildchat::service::{MemoryService, ServiceError};
use guildchat::shared::ChatError;
use serde_json::json;
use uuid::Uuid;

/// Install a coin-balance function with per-user state behind the boundary
fn install_wallet(service: &MemoryService) {
    let balances: Mutex<HashMap<String, i64>> = Mutex::new(HashMap::new());
    service.register_function("coin-balance", move |body| {
        let user = body
            .get("user_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ServiceError::network("missing user_id"))?
            .to_string();
        let action = body.get("action").and_then(|v| v.as_str()).unwrap_or("");
        let amount = body.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);
        let mut balances = balances.lock().unwrap();
        let balance = balances.entry(user).or_insert(0);
        match action {
            "balance" => {}
            "award" => *balance += amount,
            "spend" => {
                if *balance < amount {
                    return Err(ServiceError::conflict("insufficient funds"));
                }
                *balance -= amount;
            }
            other => return Err(ServiceError::network(format!("unknown action '{}'", other))),
        }
        Ok(json!({ "balance": *balance }))
    });
}

#[tokio::test]
async fn wallet_round_trip() {
    let service = common::service();
    install_wallet(&service);
    let alice = common::seed_user(&service, "alice").await;
    let wallet = WalletApi::new(service.clone());

    assert_eq!(wallet.balance(alice).await.unwrap(), 0);
    assert_eq!(wallet.award(alice, 50, "daily mission").await.unwrap(), 50);
    assert_eq!(wallet.spend(alice, 20, "name color").await.unwrap(), 30);
    assert_eq!(wallet.balance(alice).await.unwrap(), 30);
}

#[tokio::test]
async fn overspend_is_refused_serverside() {
    let service = common::service();
    install_wallet(&service);
    let alice = common::seed_user(&service, "alice").await;
    let wallet = WalletApi::new(service.clone());

    wallet.award(alice, 10, "welcome").await.unwrap();
    let result = wallet.spend(alice, 25, "emote pack").await;
    assert_matches!(result, Err(ChatError::Service(ServiceError::Conflict { .. })));
    // The failed spend must not have touched the balance
    assert_eq!(wallet.balance(alice).await.unwrap(), 10);
}

#[tokio::test]
async fn avatar_upload_stores_the_object_and_updates_the_profile() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let profiles = ProfilesApi::new(service.clone(), "avatars");

    let url = profiles
        .update_avatar(alice, vec![0x89, 0x50, 0x4e, 0x47], "png")
        .await
        .unwrap();
    assert_eq!(url, format!("memory://avatars/{}/avatar.png", alice));
    assert_eq!(
        service.object("avatars", &format!("{}/avatar.png", alice)),
        Some(vec![0x89, 0x50, 0x4e, 0x47])
    );

    let profile = profiles.get(alice).await.unwrap().unwrap();
    assert_eq!(profile.avatar_url.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn replacing_an_avatar_removes_the_old_object() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let profiles = ProfilesApi::new(service.clone(), "avatars");

    profiles.update_avatar(alice, vec![1], "png").await.unwrap();
    let url = profiles.update_avatar(alice, vec![2], "jpg").await.unwrap();

    assert_eq!(url, format!("memory://avatars/{}/avatar.jpg", alice));
    assert_eq!(service.object("avatars", &format!("{}/avatar.png", alice)), None);
    assert_eq!(
        service.object("avatars", &format!("{}/avatar.jpg", alice)),
        Some(vec![2])
    );
}

#[tokio::test]
async fn empty_avatar_is_rejected_before_upload() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let profiles = ProfilesApi::new(service.clone(), "avatars");

    let result = profiles.update_avatar(alice, Vec::new(), "png").await;
    assert_matches!(result, Err(ChatError::Validation { .. }));
    assert_eq!(service.object("avatars", &format!("{}/avatar.png", alice)), None);
}

#[tokio::test]
async fn avatar_extension_with_path_syntax_is_rejected() {
    let service = common::service();
    let alice = common::seed_user(&service, "alice").await;
    let profiles = ProfilesApi::new(service.clone(), "avatars");

    // The extension lands in the storage path; it must not escape the
    // per-user prefix
    for extension in ["png/../../bob/avatar.png", "../escape", "png\n"] {
        let result = profiles.update_avatar(alice, vec![1, 2, 3], extension).await;
        assert_matches!(result, Err(ChatError::Validation { .. }), "accepted {:?}", extension);
    }
    let profile = profiles.get(alice).await.unwrap().unwrap();
    assert!(profile.avatar_url.is_none());
}

#[tokio::test]
async fn avatar_upload_without_a_profile_is_not_found() {
    let service = common::service();
    let ghost = Uuid::new_v4();
    let profiles = ProfilesApi::new(service.clone(), "avatars");

    let result = profiles.update_avatar(ghost, vec![1, 2, 3], "png").await;
    assert_matches!(result, Err(ChatError::NotFound));
}
