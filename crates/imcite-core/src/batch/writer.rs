//! Graph-write collaborator boundary

use async_trait::async_trait;
use imcite_domain::NewItem;
use thiserror::Error;

use crate::error::PipelineError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphWriteError {
    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Write failed: {0}")]
    Network(String),
}

impl From<GraphWriteError> for PipelineError {
    fn from(e: GraphWriteError) -> Self {
        PipelineError::SubmissionFailed(e.to_string())
    }
}

/// Creates new graph items.
///
/// `Statement` is the client's own statement type; caller-supplied extras
/// arrive as `Claim::Supplied` values of it. Each item is submitted at most
/// once, so implementations must not retry internally on the pipeline's
/// behalf.
#[async_trait]
pub trait GraphWriter: Send + Sync {
    type Statement: Clone + Send + Sync;

    /// Create an item and return its entity id
    async fn create(&self, item: NewItem<Self::Statement>) -> Result<String, GraphWriteError>;
}
