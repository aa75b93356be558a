//! Key-value persistence boundary for per-user state.
//!
//! Each user owns two JSON slices, one per container, stored under fixed
//! key prefixes. Backends only move strings; (de)serialization lives in
//! `load_json` / `save_json`.

pub mod file;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

pub const RESUME_STORAGE_PREFIX: &str = "resume-storage";
pub const JOB_STORAGE_PREFIX: &str = "job-storage";

pub fn resume_key(user_id: Uuid) -> String {
    format!("{RESUME_STORAGE_PREFIX}:{user_id}")
}

pub fn job_key(user_id: Uuid) -> String {
    format!("{JOB_STORAGE_PREFIX}:{user_id}")
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}
