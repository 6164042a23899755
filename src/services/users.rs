// src/services/users.rs

use validator::Validate;

use crate::{
    error::AppError,
    models::user::{UpsertUserRequest, User},
    storage::Storage,
    utils::ident::is_identifier,
};

/// Thin access to user profiles so progress can attach to a known identity.
#[derive(Clone)]
pub struct UserDirectory {
    storage: Storage,
}

impl UserDirectory {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        check_user_id(user_id)?;
        self.storage
            .store()?
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(format!("User '{}' not found", user_id)))
    }

    pub async fn create_or_update_user(
        &self,
        user_id: &str,
        fields: &UpsertUserRequest,
    ) -> Result<User, AppError> {
        check_user_id(user_id)?;
        fields.validate()?;

        let user = self.storage.store()?.upsert_user(user_id, fields).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User profile saved");
        Ok(user)
    }
}

fn check_user_id(user_id: &str) -> Result<(), AppError> {
    if is_identifier(user_id) {
        Ok(())
    } else {
        Err(AppError::InvalidInput("userId is missing or malformed".to_string()))
    }
}
