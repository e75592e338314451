use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::models::{Notification, User};
use crate::notify::NotificationSink;
use crate::validation::validate_name;

pub const PROFILE_KEY: &str = "@user_profile";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name cannot be longer than {0} characters")]
    NameTooLong(usize),
    #[error("Failed to save changes")]
    Persist(#[source] StoreError),
}

/// String values addressed by string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Keeps every key in one JSON object on disk. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut values = match self.read_all().await {
            Ok(values) => values,
            Err(StoreError::Corrupt(err)) => {
                warn!(path = %self.path.display(), error = %err, "overwriting corrupt store file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(&values)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

pub fn seed_user() -> User {
    User {
        id: "user-1".to_string(),
        name: "Rohan Kumar".to_string(),
        mobile: "+91 98765 43210".to_string(),
        credits: 12,
        city: "Mumbai, Maharashtra".to_string(),
        joined_date: "March 2024".to_string(),
        avatar: None,
    }
}

/// The single active user, mirrored to a [`KeyValueStore`] as a whole record.
pub struct ProfileStore {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn NotificationSink>,
    current: RwLock<User>,
}

impl ProfileStore {
    /// Never fails: unreadable or incompatible data falls back to the seed user.
    pub async fn load(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        let user = match store.get(PROFILE_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<User>(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "stored profile is incompatible, using seed profile");
                seed_user()
            }),
            Ok(None) => seed_user(),
            Err(err) => {
                warn!(error = %err, "failed to load profile, using seed profile");
                seed_user()
            }
        };

        Self {
            store,
            notifier,
            current: RwLock::new(user),
        }
    }

    pub async fn current(&self) -> User {
        self.current.read().await.clone()
    }

    /// Validates and stores `user`.
    ///
    /// An invalid name leaves everything untouched. If the write fails, the
    /// in-memory record keeps the edit and the error is still returned.
    pub async fn save(&self, mut user: User) -> Result<User, ProfileError> {
        user.name = validate_name(&user.name)?;

        *self.current.write().await = user.clone();

        let write = match serde_json::to_string(&user) {
            Ok(body) => self.store.set(PROFILE_KEY, &body).await,
            Err(err) => Err(err.into()),
        };

        match write {
            Ok(()) => {
                info!(user_id = %user.id, "profile saved");
                Ok(user)
            }
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "failed to persist profile");
                self.notifier
                    .notify(Notification::error("Error", "Failed to save changes"));
                Err(ProfileError::Persist(err))
            }
        }
    }

    pub async fn rename(&self, name: &str) -> Result<User, ProfileError> {
        let mut user = self.current().await;
        user.name = name.to_string();
        self.save(user).await
    }
}
