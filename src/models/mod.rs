// src/models/mod.rs

//! Domain models for the resolution engine.
//!
//! This module contains the data structures shared across services,
//! organized by their primary purpose.

mod book;
mod config;
mod search;

// Re-export all public types
pub use book::{Book, UNKNOWN_AUTHOR};
pub use config::{
    CacheConfig, Config, LoggingConfig, MAX_PAGE_SIZE, ThumbnailConfig, UpstreamConfig,
};
pub use search::{SearchMode, SearchRequest};
