// src/services/progress.rs

use validator::Validate;

use crate::{
    error::AppError,
    models::progress::{Progress, UpsertProgressRequest},
    storage::Storage,
    utils::ident::is_identifier,
};

/// Per-user, per-level completion state.
#[derive(Clone)]
pub struct ProgressStore {
    storage: Storage,
}

impl ProgressStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Current progress list. Users without a record get an empty list.
    pub async fn get_progress(&self, user_id: &str) -> Result<Vec<Progress>, AppError> {
        if !is_identifier(user_id) {
            return Err(AppError::InvalidInput("userId is missing or malformed".to_string()));
        }
        self.storage.store()?.get_progress(user_id).await
    }

    /// Replaces the entry for `level_id`, or appends it. Repeating the same
    /// request leaves a single entry.
    pub async fn upsert_progress(
        &self,
        request: &UpsertProgressRequest,
    ) -> Result<Vec<Progress>, AppError> {
        request.validate()?;
        let store = self.storage.store()?;

        let entry = Progress::stamped(
            request.level_id.clone(),
            request.score,
            request.completed,
            chrono::Utc::now(),
        );
        let progress = store.upsert_progress(&request.user_id, &entry).await?;

        tracing::info!(
            user_id = %request.user_id,
            level_id = %request.level_id,
            completed = request.completed,
            "Progress updated"
        );
        Ok(progress)
    }
}
