// src/handlers/stages.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::{AppJson, AppPath, AppQuery},
    models::stage_attempt::{AttemptFilter, SubmitAttemptRequest, SubmitAttemptResponse},
    services::StageProgressionService,
};

/// Records one stage attempt.
///
/// * Validates identifiers, answers, score and the optional passing score.
/// * Appends to the attempt log; level progress is not touched.
/// * Returns 201 Created with the new attempt id.
pub async fn submit_attempt(
    State(stages): State<StageProgressionService>,
    AppJson(req): AppJson<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt_id = stages.submit_attempt(req).await?;

    Ok((StatusCode::CREATED, Json(SubmitAttemptResponse { attempt_id })))
}

/// Lists attempts, newest first. Without `userId` this spans every user.
pub async fn list_attempts(
    State(stages): State<StageProgressionService>,
    AppQuery(filter): AppQuery<AttemptFilter>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = stages.list_attempts(&filter).await?;

    Ok(Json(attempts))
}

/// Attempt history plus the latest outcome per stage for one user.
pub async fn get_stage_status(
    State(stages): State<StageProgressionService>,
    AppPath(user_id): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let status = stages.stage_status(&user_id).await?;

    Ok(Json(status))
}
