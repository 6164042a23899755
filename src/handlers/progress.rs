// src/handlers/progress.rs

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::{AppJson, AppPath},
    models::progress::{ProgressResponse, UpsertProgressRequest},
    services::ProgressStore,
};

/// Current level progress. Unknown users get an empty list.
pub async fn get_progress(
    State(progress): State<ProgressStore>,
    AppPath(user_id): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let list = progress.get_progress(&user_id).await?;

    Ok(Json(ProgressResponse::from(list)))
}

/// Upserts one level's progress. The user must already exist.
pub async fn upsert_progress(
    State(progress): State<ProgressStore>,
    AppJson(req): AppJson<UpsertProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    let list = progress.upsert_progress(&req).await?;

    Ok(Json(ProgressResponse::from(list)))
}
