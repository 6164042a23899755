// src/models/mod.rs

pub mod progress;
pub mod quiz_result;
pub mod stage_attempt;
pub mod user;
