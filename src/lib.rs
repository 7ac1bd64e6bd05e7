// src/lib.rs

//! Novelti book search library
//!
//! Fronts the Google Books volumes API with normalization, cover
//! resolution and a TTL result cache. [`services::BookResolver`] is the
//! entry point; everything else is a collaborator it is built from.

pub mod cache;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use cache::ResultCache;
pub use error::{AppError, Result};
pub use models::{Book, Config, SearchMode, SearchRequest};
pub use services::BookResolver;
