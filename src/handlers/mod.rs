// src/handlers/mod.rs

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

pub mod health;
pub mod progress;
pub mod quiz;
pub mod stages;
pub mod users;

/// `Json` extractor whose rejections come back as `AppError::InvalidInput`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query` extractor with the same structured rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `Path` extractor with the same structured rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
