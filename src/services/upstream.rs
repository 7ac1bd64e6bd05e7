// src/services/upstream.rs

//! Upstream book API client.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::UpstreamConfig;
use crate::utils::http::create_async_client;

/// Source of raw upstream payloads.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Fetch the raw body for a request target.
    ///
    /// Transport failures and non-2xx statuses are `UpstreamUnavailable`.
    async fn fetch(&self, target: &str) -> Result<Vec<u8>>;
}

/// HTTP implementation of [`BookSource`].
#[derive(Clone)]
pub struct HttpBookSource {
    client: Client,
}

impl HttpBookSource {
    /// Create a client with the configured user agent and timeout.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookSource for HttpBookSource {
    async fn fetch(&self, target: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", target);

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| AppError::upstream(target, e))?;

        let status = response.status();
        if !status.is_success() {
            // Dropping the response releases the connection.
            drop(response);
            return Err(AppError::upstream(target, format!("HTTP status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::upstream(target, e))?;
        Ok(body.to_vec())
    }
}
