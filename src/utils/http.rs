// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::UpstreamConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &UpstreamConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_from_default_config() {
        assert!(create_async_client(&UpstreamConfig::default()).is_ok());
    }
}
