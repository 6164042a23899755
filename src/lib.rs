// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Integration tests and main build the app through this
pub use routes::create_router;
