// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{health, progress, quiz, stages, users},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (stages, quiz, progress, users, health).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (storage handle and services).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring malformed CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let stage_routes = Router::new()
        .route(
            "/attempts",
            post(stages::submit_attempt).get(stages::list_attempts),
        )
        .route("/status/{user_id}", get(stages::get_stage_status));

    let quiz_routes = Router::new()
        .route("/results", post(quiz::submit_quiz).get(quiz::list_results))
        .route("/growth/{user_id}", get(quiz::get_growth))
        .route("/leaderboard", get(quiz::get_leaderboard));

    let user_routes = Router::new().route("/{user_id}", get(users::get_user).put(users::put_user));

    Router::new()
        .nest("/api/stages", stage_routes)
        .nest("/api/quiz", quiz_routes)
        .route("/api/progress", put(progress::upsert_progress))
        .route("/api/progress/{user_id}", get(progress::get_progress))
        .nest("/api/users", user_routes)
        .route("/api/health", get(health::health))
        // Global Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
