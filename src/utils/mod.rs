//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::{AppError, Result};

/// Parse a user-supplied image URL, accepting only http(s).
pub fn parse_image_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(AppError::validation(format!(
            "Thumbnail URL must be http(s) with a host, got scheme '{scheme}'"
        ))),
    }
}
