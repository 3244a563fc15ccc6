use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

use crate::core::ports::{ProfileStore, StoreError};
use crate::models::UserProfile;

/// Profile store held entirely in memory
///
/// Used for local development (seeded from a JSON file) and tests. Listing
/// order follows the underlying map and is not stable.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();

        Self {
            profiles: RwLock::new(profiles),
        }
    }

    /// Load a JSON array of profiles from disk
    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let profiles: Vec<UserProfile> = serde_json::from_str(&raw).map_err(|e| {
            StoreError::InvalidData(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!("Loaded {} profiles from {}", profiles.len(), path.display());

        Ok(Self::with_profiles(profiles))
    }

    /// Insert or replace a profile
    pub async fn insert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }

    pub async fn remove(&self, id: &str) -> Option<UserProfile> {
        self.profiles.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, id: &str) -> Result<UserProfile, StoreError> {
        self.profiles
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn query_all_except(&self, id: &str) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .filter(|profile| profile.id != id)
            .cloned()
            .collect())
    }
}
