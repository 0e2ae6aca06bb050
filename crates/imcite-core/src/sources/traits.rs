//! Common types for source plugins

use imcite_domain::{FetchStatus, IdentifierKind, Source};
use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(HttpError),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimit,
    #[error("Not found")]
    NotFound,
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<HttpError> for SourceError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::RateLimited => SourceError::RateLimit,
            other => SourceError::Http(other),
        }
    }
}

impl SourceError {
    /// Classify into the status recorded on the raw record
    pub fn to_status(&self) -> FetchStatus {
        match self {
            SourceError::NotFound => FetchStatus::NotFound,
            SourceError::RateLimit => FetchStatus::TransientError(self.to_string()),
            SourceError::Http(e) if e.is_transient() => {
                FetchStatus::TransientError(self.to_string())
            }
            SourceError::Status(status) if *status >= 500 => {
                FetchStatus::TransientError(self.to_string())
            }
            SourceError::Status(404) | SourceError::Status(410) => FetchStatus::NotFound,
            SourceError::Http(_)
            | SourceError::Status(_)
            | SourceError::Parse(_)
            | SourceError::InvalidQuery(_) => FetchStatus::PermanentError(self.to_string()),
        }
    }
}

/// Return the body of a successful response, classifying everything else
pub fn check_status(response: HttpResponse) -> Result<String, SourceError> {
    match response.status {
        200..=299 => Ok(response.body),
        429 => Err(SourceError::RateLimit),
        status => Err(SourceError::Status(status)),
    }
}

/// Metadata about a source
pub struct SourceMetadata {
    pub source: Source,
    pub name: &'static str,
    pub description: &'static str,
    /// The identifier the source is queried with
    pub identifier: IdentifierKind,
    /// Graph item cited as "stated in" for statements from this source
    pub reference_item: &'static str,
}
