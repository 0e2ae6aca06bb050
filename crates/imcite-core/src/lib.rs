//! imcite Core - Journal-article import pipeline
//!
//! Turns manifest entries carrying any subset of DOI / PMID / PMCID into new
//! knowledge-graph items:
//!
//! - **Resolver**: fills missing identifiers through the NCBI ID converter
//! - **Sources**: PubMed (efetch XML), PubMed Central (esummary JSON) and the
//!   DOI registry (CSL JSON), each reporting failure as a fetch status
//! - **Merge**: one canonical record per work from a static priority table
//! - **Journals**: ISSN → journal item via the SPARQL endpoint
//! - **Statements**: canonical record → ordered statements with references
//! - **Batch**: per-entry fault isolation, shared throttle, ordered outcomes
//! - **Config**: HTTP, endpoints, throttle, retry and statement settings
//!
//! # Pipeline
//!
//! ```text
//! entry → resolve → fetch (concurrent) → merge → journal → build → create
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod http;
pub mod journals;
pub mod merge;
pub mod resolver;
pub mod retry;
pub mod sources;
pub mod statements;
pub mod throttle;

pub use batch::{BatchRunner, GraphWriteError, GraphWriter};
pub use config::{
    ConfigError, EndpointConfig, HttpConfig, PipelineConfig, RetryConfig, StatementConfig,
    ThrottleConfig,
};
pub use error::{BatchError, PipelineError, Result};
#[cfg(feature = "native")]
pub use http::HttpClient;
pub use http::{HttpError, HttpResponse, Transport};
pub use journals::{JournalIndex, SparqlJournalIndex};
pub use merge::{merge, MergeError};
pub use resolver::{CrossReferenceService, IdConverterClient, IdentifierResolver};
pub use retry::RetryPolicy;
pub use sources::{SourceError, SourceFetcher};
pub use statements::{build, BuildContext, BuildError};
pub use throttle::{GateError, RequestGate};

pub use imcite_domain::{
    BatchReport, CanonicalRecord, Claim, IdentifierKind, Identifiers, ItemCreationOutcome,
    ItemStatus, ManifestEntry, NewItem, RawSourceRecord, Source, Statement,
};
