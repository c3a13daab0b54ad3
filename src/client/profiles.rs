//! Profile reads and avatar upload.
//!
//! Profiles belong to the wider application; this module only reads them for
//! display and writes the avatar URL after an upload.

use std::collections::HashMap;

use serde_json::json;
use uuid::Uuid;

use crate::service::{DataService, Filter};
use crate::shared::error::ChatError;
use crate::shared::messaging::Profile;

const PROFILES: &str = "profiles";

/// Fetch profiles for a set of user ids. Missing profiles are simply absent
/// from the result, never an error.
pub async fn fetch<S: DataService>(
    service: &S,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Profile>, ChatError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let filter = Filter::or(
        ids.iter()
            .map(|id| Filter::eq("id", id.to_string()))
            .collect(),
    );
    let rows = service.select(PROFILES, filter, None, None).await?;
    let mut profiles = HashMap::new();
    for row in &rows {
        let profile = Profile::from_row(row)?;
        profiles.insert(profile.id, profile);
    }
    Ok(profiles)
}

/// Profile operations for one service connection
#[derive(Clone)]
pub struct ProfilesApi<S> {
    service: S,
    bucket: String,
}

impl<S: DataService> ProfilesApi<S> {
    pub fn new(service: S, bucket: impl Into<String>) -> Self {
        Self {
            service,
            bucket: bucket.into(),
        }
    }

    /// A single user's profile, if one exists
    pub async fn get(&self, id: Uuid) -> Result<Option<Profile>, ChatError> {
        let rows = self
            .service
            .select(PROFILES, Filter::eq("id", id.to_string()), None, Some(1))
            .await?;
        Ok(rows.first().map(Profile::from_row).transpose()?)
    }

    /// Upload a new avatar for `me` and point the profile row at its public
    /// URL. The previous object, when replaced, is removed best-effort.
    pub async fn update_avatar(
        &self,
        me: Uuid,
        bytes: Vec<u8>,
        extension: &str,
    ) -> Result<String, ChatError> {
        if bytes.is_empty() {
            return Err(ChatError::validation("avatar", "avatar file is empty"));
        }
        if !valid_extension(extension) {
            return Err(ChatError::validation(
                "extension",
                "avatar extension must be a short alphanumeric token",
            ));
        }
        let previous = self.get(me).await?.and_then(|p| p.avatar_url);

        let path = format!("{}/avatar.{}", me, extension);
        let stored = self.service.upload(&self.bucket, &path, bytes).await?;
        let url = self.service.public_url(&self.bucket, &stored);

        let updated = self
            .service
            .update(
                PROFILES,
                Filter::eq("id", me.to_string()),
                json!({ "avatar_url": url }),
            )
            .await?;
        if updated.is_empty() {
            return Err(ChatError::NotFound);
        }
        tracing::info!("[profiles] avatar updated for {}", me);

        if let Some(previous_url) = previous {
            if previous_url != url {
                self.remove_previous(&previous_url, &path).await;
            }
        }
        Ok(url)
    }

    /// Best-effort removal of a replaced avatar object
    async fn remove_previous(&self, previous_url: &str, current_path: &str) {
        let marker = format!("/{}/", self.bucket);
        let Some((_, previous_path)) = previous_url.rsplit_once(marker.as_str()) else {
            return;
        };
        if previous_path == current_path {
            return;
        }
        if let Err(e) = self
            .service
            .remove(&self.bucket, &[previous_path.to_string()])
            .await
        {
            tracing::warn!("[profiles] failed to remove previous avatar: {}", e);
        }
    }
}

/// The extension becomes part of the storage path, so it must not carry path
/// syntax: a short ASCII-alphanumeric token only.
fn valid_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension.len() <= 8
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
}
