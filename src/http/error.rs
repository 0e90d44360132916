//! Typed errors for calls to external HTTP services.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the adapters that talk to external services.
///
/// Requests are never retried, so every variant is final for the call that
/// produced it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rate limit exceeded (HTTP 403 with rate limit message or 429)
    #[error("Rate limit exceeded: {0}. Try again later.")]
    RateLimited(String),

    /// HTTP 401
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// HTTP 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 403 without a rate limit message
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Any other non-2xx status.
    #[error("Request failed with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response.
    #[error("Failed to send request: {0}")]
    Network(#[source] reqwest::Error),

    /// The response body did not match the expected schema.
    #[error("Unexpected response body: {0}")]
    Parse(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited(_) => Some(429),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Forbidden(_) => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::InvalidUrl(_) | ApiError::Network(_) | ApiError::Parse(_) => None,
        }
    }
}

/// Classifies a non-success response into an [`ApiError`].
pub fn classify_status(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => {
            ApiError::Unauthorized("Invalid or missing authentication token".to_string())
        }
        StatusCode::FORBIDDEN => {
            if body.to_lowercase().contains("rate limit") {
                ApiError::RateLimited("API rate limit exceeded".to_string())
            } else {
                ApiError::Forbidden("Access to this resource is forbidden".to_string())
            }
        }
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited("Too many requests".to_string()),
        StatusCode::NOT_FOUND => {
            ApiError::NotFound("The requested resource was not found".to_string())
        }
        s => ApiError::Status {
            status: s.as_u16(),
            message: summarize_body(body, s),
        },
    }
}

fn summarize_body(body: &str, status: StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string();
    }
    // Keep log lines and error output readable for HTML error pages.
    let mut summary: String = trimmed.chars().take(200).collect();
    if trimmed.chars().count() > 200 {
        summary.push_str("...");
    }
    summary
}
