//! Service layer for the resolution engine.
//!
//! This module contains the business logic for:
//! - Query construction (`QueryBuilder`)
//! - Upstream access (`BookSource`, `HttpBookSource`)
//! - Response normalization (`normalize`)
//! - Cover resolution (`ThumbnailResolver`)
//! - Orchestration (`BookResolver`)

pub mod normalize;
pub mod query;
pub mod resolver;
pub mod thumbnails;
pub mod upstream;

pub use normalize::Draft;
pub use query::QueryBuilder;
pub use resolver::BookResolver;
pub use thumbnails::ThumbnailResolver;
pub use upstream::{BookSource, HttpBookSource};
