// src/handlers/quiz.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::{AppJson, AppPath, AppQuery},
    models::quiz_result::{LeaderboardParams, QuizResultFilter, SubmitQuizRequest, SubmitQuizResponse},
    services::{LeaderboardAggregator, QuizService},
};

/// Submits a career adaptability quiz.
///
/// * Evaluates the ratings server-side (category sums, total, percent, band).
/// * Appends the result to the quiz log.
/// * Returns 201 Created with the quiz id and the evaluation.
pub async fn submit_quiz(
    State(quiz): State<QuizService>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = quiz.submit(req).await?;

    Ok((StatusCode::CREATED, Json(SubmitQuizResponse::from(&result))))
}

/// Lists quiz results, newest first.
pub async fn list_results(
    State(quiz): State<QuizService>,
    AppQuery(filter): AppQuery<QuizResultFilter>,
) -> Result<impl IntoResponse, AppError> {
    let results = quiz.history(&filter).await?;

    Ok(Json(results))
}

/// Latest pretest vs latest posttest for one user.
pub async fn get_growth(
    State(quiz): State<QuizService>,
    AppPath(user_id): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let growth = quiz.growth(&user_id).await?;

    Ok(Json(growth))
}

/// Retrieves the top posttest scores, one entry per user.
pub async fn get_leaderboard(
    State(leaderboard): State<LeaderboardAggregator>,
    AppQuery(params): AppQuery<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let entries = leaderboard.compute_leaderboard(params.limit).await?;

    Ok(Json(entries))
}
