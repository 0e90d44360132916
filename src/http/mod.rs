//! HTTP client module with typed error classification.

mod client;
mod error;

pub use client::{HttpClient, build_client};
pub use error::{ApiError, classify_status};
