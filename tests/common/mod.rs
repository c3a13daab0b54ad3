//! Shared helpers for integration tests
#![allow(dead_code)]

use guildchat::service::{DataService, MemoryService};
use guildchat::shared::messaging::Profile;
use uuid::Uuid;

/// Install a test tracing subscriber (once per process)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("guildchat=debug")
        .with_test_writer()
        .try_init();
}

/// A fresh in-process service
pub fn service() -> MemoryService {
    init_tracing();
    MemoryService::new()
}

/// Create a user with a seeded profile row, returning the user id
pub async fn seed_user(service: &MemoryService, username: &str) -> Uuid {
    let profile = Profile::new(Uuid::new_v4(), username);
    service
        .insert("profiles", profile.to_row().expect("serialize profile"))
        .await
        .expect("seed profile");
    profile.id
}
