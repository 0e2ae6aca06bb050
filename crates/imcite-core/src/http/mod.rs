//! HTTP client abstraction for sources and lookup services

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
    #[error("Timeout")]
    Timeout,
    #[error("Rate limited")]
    RateLimited,
    #[error("Parse error: {message}")]
    ParseError { message: String },
}

impl HttpError {
    /// Failures worth retrying: timeouts, rate limiting and network errors
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HttpError::Timeout | HttpError::RateLimited | HttpError::RequestFailed { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: std::collections::HashMap<String, String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET-only transport used by every upstream client.
///
/// The native implementation is [`HttpClient`]; tests substitute scripted
/// responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET, optionally with an `Accept` header
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, HttpError>;
}

/// Build a URL with encoded query parameters
pub fn url_with_params(base: &str, params: &[(&str, &str)]) -> Result<String, HttpError> {
    url::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|_| HttpError::InvalidUrl {
            url: base.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_params_encodes() {
        let url = url_with_params(
            "https://example.org/efetch.fcgi",
            &[("db", "pubmed"), ("id", "1 2")],
        )
        .unwrap();
        assert_eq!(url, "https://example.org/efetch.fcgi?db=pubmed&id=1+2");
    }

    #[test]
    fn test_transient_classification() {
        assert!(HttpError::Timeout.is_transient());
        assert!(HttpError::RateLimited.is_transient());
        assert!(!HttpError::InvalidUrl { url: "x".into() }.is_transient());
    }
}
