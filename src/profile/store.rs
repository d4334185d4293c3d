//! Profile persistence and per-user write serialization

use super::models::StyleProfile;
use crate::error::{Error, Result};
use crate::metrics::METRICS;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Persisted profile storage keyed by external user id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<StyleProfile>>;
    async fn save(&self, profile: &StyleProfile) -> Result<()>;
}

/// Process-local store
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, StyleProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self, user_id: &str) -> Result<Option<StyleProfile>> {
        Ok(self.profiles.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, profile: &StyleProfile) -> Result<()> {
        if profile.user_id.is_empty() {
            return Err(Error::Storage("profile has no user id".to_string()));
        }
        self.profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

/// Caller identity as forwarded by the authenticating edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: String::new(),
            name: None,
        }
    }

    fn new_profile(&self) -> StyleProfile {
        StyleProfile::new(&self.user_id, &self.email, self.name.clone())
    }
}

/// Profile access with at most one writer per user at a time
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read a profile without creating it
    pub async fn find(&self, user_id: &str) -> Result<Option<StyleProfile>> {
        self.store.load(user_id).await
    }

    /// Load the caller's profile, creating and saving a default one on first use
    pub async fn get_or_create(&self, identity: &UserIdentity) -> Result<StyleProfile> {
        if let Some(profile) = self.store.load(&identity.user_id).await? {
            return Ok(profile);
        }

        let (profile, _) = self.update(identity, "create", |_| Ok(())).await?;
        Ok(profile)
    }

    /// Drop the user's lock once no caller holds or awaits it
    fn release_lock(&self, user_id: &str) {
        self.locks
            .remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Serialized load-modify-save.
    ///
    /// Concurrent updates for the same user run one after another, so none of
    /// them is lost. A failing `apply` leaves the stored profile untouched.
    pub async fn update<T, F>(
        &self,
        identity: &UserIdentity,
        operation: &str,
        apply: F,
    ) -> Result<(StyleProfile, T)>
    where
        F: FnOnce(&mut StyleProfile) -> Result<T> + Send,
        T: Send,
    {
        let lock = self.lock_for(&identity.user_id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_and_save(identity, operation, apply).await
        };
        drop(lock);
        self.release_lock(&identity.user_id);
        result
    }

    async fn apply_and_save<T, F>(
        &self,
        identity: &UserIdentity,
        operation: &str,
        apply: F,
    ) -> Result<(StyleProfile, T)>
    where
        F: FnOnce(&mut StyleProfile) -> Result<T> + Send,
        T: Send,
    {
        let mut profile = match self.store.load(&identity.user_id).await? {
            Some(profile) => profile,
            None => {
                info!("Creating profile for user {}", identity.user_id);
                identity.new_profile()
            }
        };

        let output = apply(&mut profile)?;
        profile.updated_at = Utc::now();
        self.store.save(&profile).await?;

        METRICS.record_profile_update(operation);
        debug!("Profile {} saved after {}", identity.user_id, operation);

        Ok((profile, output))
    }
}
