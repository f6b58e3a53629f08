//! Classification of HTTP failures.
//!
//! A 404 is the only status the index builder recovers from; everything else
//! is reported with a user-facing message and aborts the run.

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// HTTP failures with a known status.
#[derive(Debug)]
pub enum HttpError {
    /// Rate limit exceeded (HTTP 429, or 403 with no requests remaining)
    RateLimitExceeded(String),
    /// Authentication failed (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// Forbidden access (HTTP 403 non-rate-limit)
    Forbidden(String),
    /// Other 4xx responses
    ClientError(String),
    /// 5xx responses
    ServerError(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::RateLimitExceeded(msg) => {
                write!(
                    f,
                    "Rate limit exceeded: {}. Try again later or set GITHUB_TOKEN environment variable.",
                    msg
                )
            }
            HttpError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check your GITHUB_TOKEN.", msg)
            }
            HttpError::NotFound(msg) => write!(f, "Not found: {}", msg),
            HttpError::Forbidden(msg) => {
                write!(f, "Access forbidden: {}. You may need authentication.", msg)
            }
            HttpError::ClientError(msg) => write!(f, "Request error: {}", msg),
            HttpError::ServerError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Maps a status-bearing reqwest error to an [`HttpError`]. Connection
/// errors and timeouts carry no status and yield `None`.
pub fn classify_error(error: &reqwest::Error) -> Option<HttpError> {
    let status = error.status()?;
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "unknown URL".to_string());

    Some(match status {
        StatusCode::UNAUTHORIZED => {
            HttpError::AuthenticationFailed("Invalid or missing authentication token".to_string())
        }
        StatusCode::FORBIDDEN => HttpError::Forbidden(url),
        StatusCode::TOO_MANY_REQUESTS => {
            HttpError::RateLimitExceeded("Too many requests".to_string())
        }
        StatusCode::NOT_FOUND => HttpError::NotFound(url),
        s if s.is_client_error() => HttpError::ClientError(format!("HTTP {} from {}", s.as_u16(), url)),
        s => HttpError::ServerError(format!("HTTP {} from {}", s.as_u16(), url)),
    })
}

/// Passes successful responses through and turns error statuses into an
/// `anyhow::Error`. GitHub reports an exhausted rate limit as a 403 that only
/// the `x-ratelimit-remaining: 0` header distinguishes from other 403s.
pub fn check_status(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    let limited = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;
    if limited && rate_limit_exhausted(response.headers()) {
        return Err(HttpError::RateLimitExceeded(format!(
            "GitHub API rate limit exceeded for {}",
            response.url()
        ))
        .into());
    }
    response.error_for_status().map_err(classify)
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Converts an error from `error_for_status()` into an `anyhow::Error`,
/// replacing it with an [`HttpError`] when the status is known.
pub fn classify(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Some(classified) => anyhow::Error::from(classified),
        None => anyhow::Error::from(error),
    }
}
