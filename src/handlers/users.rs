// src/handlers/users.rs

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::{AppJson, AppPath},
    models::user::UpsertUserRequest,
    services::UserDirectory,
};

pub async fn get_user(
    State(users): State<UserDirectory>,
    AppPath(user_id): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = users.get_user(&user_id).await?;

    Ok(Json(user))
}

/// Creates the profile or overwrites the supplied fields. No credentials are stored.
pub async fn put_user(
    State(users): State<UserDirectory>,
    AppPath(user_id): AppPath<String>,
    AppJson(req): AppJson<UpsertUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = users.create_or_update_user(&user_id, &req).await?;

    Ok(Json(user))
}
