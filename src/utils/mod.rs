// src/utils/mod.rs

pub mod ident;
