//! HTTP client with error classification. Requests are sent once; there is
//! no retry loop, and the timeout configured on the inner client bounds each
//! call.

use anyhow::{Context, Result};
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::error::check_status;

/// Thin wrapper over a configured reqwest `Client`.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let response = check_status(response)?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Performs a GET request and returns the body bytes, or `None` on 404.
    /// Every other failure is returned as an error.
    #[tracing::instrument(skip(self))]
    pub async fn get_bytes_if_found(&self, url: &str, accept: &str) -> Result<Option<Vec<u8>>> {
        debug!("GET {} (accept: {})...", url, accept);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("{} not found", url);
            return Ok(None);
        }

        let response = check_status(response)?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        Ok(Some(bytes.to_vec()))
    }
}
