//! Error types for imcite-core

use imcite_domain::ItemStatus;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for per-item pipeline stages
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Per-item pipeline errors.
///
/// None of these abort a batch; each is converted into the item's outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The entry carries no identifier at all
    #[error("Invalid manifest entry: {0}")]
    InvalidManifestEntry(String),

    /// Network failure, rate limiting or 5xx that outlived its retries
    #[error("Transient error: {0}")]
    TransientError(String),

    /// Malformed identifier or a 4xx response
    #[error("Permanent error: {0}")]
    PermanentError(String),

    /// Valid request, no data
    #[error("Not found: {0}")]
    NotFound(String),

    /// The merged record lacks a title or any identifier
    #[error("Record invalid: {0}")]
    RecordInvalid(String),

    /// The graph write failed; never retried automatically
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),
}

impl PipelineError {
    /// The status this error gives the item
    pub fn item_status(&self) -> ItemStatus {
        match self {
            PipelineError::RecordInvalid(_)
            | PipelineError::NotFound(_)
            | PipelineError::PermanentError(_) => ItemStatus::Skipped,
            PipelineError::InvalidManifestEntry(_)
            | PipelineError::TransientError(_)
            | PipelineError::SubmissionFailed(_) => ItemStatus::Failed,
        }
    }

    /// Human-readable reason for the outcome report
    pub fn detail(&self) -> &str {
        match self {
            PipelineError::InvalidManifestEntry(msg)
            | PipelineError::TransientError(msg)
            | PipelineError::PermanentError(msg)
            | PipelineError::NotFound(msg)
            | PipelineError::RecordInvalid(msg)
            | PipelineError::SubmissionFailed(msg) => msg,
        }
    }
}

/// Errors that stop a whole batch run
#[derive(Error, Debug)]
pub enum BatchError {
    /// The shared throttle could not be created
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_status_mapping() {
        assert_eq!(
            PipelineError::RecordInvalid("no title".into()).item_status(),
            ItemStatus::Skipped
        );
        assert_eq!(
            PipelineError::SubmissionFailed("503".into()).item_status(),
            ItemStatus::Failed
        );
        assert_eq!(
            PipelineError::InvalidManifestEntry("empty".into()).item_status(),
            ItemStatus::Failed
        );
    }

    #[test]
    fn test_detail_omits_prefix() {
        let err = PipelineError::RecordInvalid("no identifiers resolved, no title".into());
        assert_eq!(err.detail(), "no identifiers resolved, no title");
        assert_eq!(
            err.to_string(),
            "Record invalid: no identifiers resolved, no title"
        );
    }
}
