//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Largest page size the upstream API accepts.
pub const MAX_PAGE_SIZE: u32 = 40;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API and HTTP client settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Result cache sizing
    #[serde(default)]
    pub cache: CacheConfig,

    /// Cover resolution settings
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.upstream.base_url)
            .map_err(|e| AppError::validation(format!("upstream.base_url is invalid: {e}")))?;
        if self.upstream.user_agent.trim().is_empty() {
            return Err(AppError::validation("upstream.user_agent is empty"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(AppError::validation("upstream.timeout_secs must be > 0"));
        }
        if self.upstream.page_size == 0 || self.upstream.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "upstream.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        if self.cache.capacity == 0 {
            return Err(AppError::validation("cache.capacity must be > 0"));
        }
        if self.thumbnails.lookup_timeout_ms == 0 {
            return Err(AppError::validation(
                "thumbnails.lookup_timeout_ms must be > 0",
            ));
        }
        if self.thumbnails.max_concurrent == 0 {
            return Err(AppError::validation(
                "thumbnails.max_concurrent must be > 0",
            ));
        }
        if !self.thumbnails.cover_template.contains("{id}") {
            return Err(AppError::validation(
                "thumbnails.cover_template must contain {id}",
            ));
        }
        Ok(())
    }
}

/// Upstream API and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Volumes endpoint of the book API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// `maxResults` sent with every collection query
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Optional `orderBy` hint
    #[serde(default = "defaults::order_by")]
    pub order_by: Option<String>,

    /// Appended to free-text terms to bias results toward books
    #[serde(default = "defaults::free_text_suffix")]
    pub free_text_suffix: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
            order_by: defaults::order_by(),
            free_text_suffix: defaults::free_text_suffix(),
        }
    }
}

/// Result cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds
    #[serde(default = "defaults::ttl")]
    pub ttl_secs: u64,

    /// Maximum number of cached pages before LRU eviction
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::ttl(),
            capacity: defaults::capacity(),
        }
    }
}

/// Cover resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Directory holding `thumbnails.json`
    #[serde(default = "defaults::store_dir")]
    pub store_dir: PathBuf,

    /// Store lookup timeout in milliseconds
    #[serde(default = "defaults::lookup_timeout")]
    pub lookup_timeout_ms: u64,

    /// Maximum concurrent store lookups per response
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Derived cover URL; `{id}` is replaced with the volume ID
    #[serde(default = "defaults::cover_template")]
    pub cover_template: String,
}

impl ThumbnailConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            store_dir: defaults::store_dir(),
            lookup_timeout_ms: defaults::lookup_timeout(),
            max_concurrent: defaults::max_concurrent(),
            cover_template: defaults::cover_template(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Upstream defaults
    pub fn base_url() -> String {
        "https://www.googleapis.com/books/v1/volumes".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; novelti/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn page_size() -> u32 {
        20
    }
    pub fn order_by() -> Option<String> {
        Some("relevance".into())
    }
    pub fn free_text_suffix() -> String {
        "books".into()
    }

    // Cache defaults
    pub fn ttl() -> u64 {
        600
    }
    pub fn capacity() -> usize {
        1024
    }

    // Thumbnail defaults
    pub fn store_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn lookup_timeout() -> u64 {
        500
    }
    pub fn max_concurrent() -> usize {
        8
    }
    pub fn cover_template() -> String {
        "https://books.google.com/books/publisher/content/images/frontcover/{id}?fife=w600-h800&source=gbs_api".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_oversized_page() {
        let mut config = Config::default();
        config.upstream.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.thumbnails.cover_template = "https://covers.example.com/static.jpg".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl_secs = 30

            [upstream]
            page_size = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.capacity, 1024);
        assert_eq!(config.upstream.page_size, 10);
        assert_eq!(config.upstream.free_text_suffix, "books");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_survives_missing_file() {
        let config = Config::load_or_default("/nonexistent/novelti.toml");
        assert_eq!(config.cache.ttl_secs, 600);
    }
}
