//! Coin balance passthrough.
//!
//! Balance mutations are privileged and must not be performed directly from
//! the client; they go through the serverside `coin-balance` function. This
//! is a thin typed wrapper over `invoke` - all validation lives serverside.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::service::{DataService, ServiceError};
use crate::shared::error::ChatError;

const COIN_FUNCTION: &str = "coin-balance";

/// Coin operations for one service connection
#[derive(Clone)]
pub struct WalletApi<S> {
    service: S,
}

impl<S: DataService> WalletApi<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Current coin balance for `me`
    pub async fn balance(&self, me: Uuid) -> Result<i64, ChatError> {
        let response = self
            .service
            .invoke(COIN_FUNCTION, json!({ "action": "balance", "user_id": me }))
            .await?;
        read_balance(&response)
    }

    /// Credit `amount` coins to `me` (e.g. a completed mission)
    pub async fn award(&self, me: Uuid, amount: i64, reason: &str) -> Result<i64, ChatError> {
        let response = self
            .service
            .invoke(
                COIN_FUNCTION,
                json!({ "action": "award", "user_id": me, "amount": amount, "reason": reason }),
            )
            .await?;
        read_balance(&response)
    }

    /// Spend `amount` coins from `me` (e.g. a shop purchase)
    pub async fn spend(&self, me: Uuid, amount: i64, reason: &str) -> Result<i64, ChatError> {
        let response = self
            .service
            .invoke(
                COIN_FUNCTION,
                json!({ "action": "spend", "user_id": me, "amount": amount, "reason": reason }),
            )
            .await?;
        read_balance(&response)
    }
}

fn read_balance(response: &Value) -> Result<i64, ChatError> {
    response
        .get("balance")
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            ChatError::Service(ServiceError::network("malformed coin-balance response"))
        })
}
