// src/storage/mod.rs

//! Persistence seam for the journey core.
//!
//! Every document read is decoded into a typed entity here, once. Services
//! never see rows or raw JSON.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{Config, StorageBackend},
    error::AppError,
    models::{
        progress::Progress,
        quiz_result::{NewQuizResult, QuizResult, QuizResultFilter},
        stage_attempt::{AttemptFilter, NewStageAttempt, StageAttempt},
        user::{UpsertUserRequest, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Capabilities the core consumes from the backing database.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Creates the user when absent, otherwise overwrites the supplied fields.
    async fn upsert_user(&self, user_id: &str, fields: &UpsertUserRequest)
    -> Result<User, AppError>;

    /// Appends one attempt. Never overwrites.
    async fn insert_stage_attempt(&self, attempt: &NewStageAttempt)
    -> Result<StageAttempt, AppError>;

    /// Attempts matching `filter`, newest first.
    async fn list_stage_attempts(&self, filter: &AttemptFilter)
    -> Result<Vec<StageAttempt>, AppError>;

    /// Appends one quiz result. Never overwrites.
    async fn insert_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult, AppError>;

    /// Quiz results matching `filter`, newest first.
    async fn list_quiz_results(&self, filter: &QuizResultFilter)
    -> Result<Vec<QuizResult>, AppError>;

    /// The user's progress list; empty when the user has none (or is unknown).
    async fn get_progress(&self, user_id: &str) -> Result<Vec<Progress>, AppError>;

    /// Atomically replaces or appends the entry for `entry.level_id` and
    /// returns the resulting list. Fails with `UserNotFound` for unknown users.
    async fn upsert_progress(&self, user_id: &str, entry: &Progress)
    -> Result<Vec<Progress>, AppError>;
}

/// Storage client handed to every service at startup.
#[derive(Clone)]
pub enum Storage {
    Connected(Arc<dyn Store>),
    Unavailable(String),
}

impl Storage {
    pub fn connected<S: Store + 'static>(store: S) -> Self {
        Storage::Connected(Arc::new(store))
    }

    pub fn memory() -> Self {
        Storage::connected(MemoryStore::new())
    }

    /// Builds the configured backend. A database that cannot be reached
    /// yields `Unavailable` rather than aborting startup.
    pub async fn from_config(config: &Config) -> Self {
        match config.storage_backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Storage::memory()
            }
            StorageBackend::Postgres => match PgStore::connect(config).await {
                Ok(store) => Storage::connected(store),
                Err(e) => {
                    tracing::error!("Storage unavailable: {}", e);
                    Storage::Unavailable(e.to_string())
                }
            },
        }
    }

    /// The live store, or `StorageUnavailable`.
    pub fn store(&self) -> Result<&dyn Store, AppError> {
        match self {
            Storage::Connected(store) => Ok(store.as_ref()),
            Storage::Unavailable(reason) => Err(AppError::StorageUnavailable(reason.clone())),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Storage::Connected(_))
    }
}
