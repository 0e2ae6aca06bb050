//! Domain types for imcite
//!
//! imcite turns partially identified journal articles (DOI, PMID, PMCID) into
//! new knowledge-graph items. This crate holds the plain data that flows
//! between the pipeline stages:
//!
//! - **Manifest**: caller-supplied work units with optional extra statements
//! - **Identifiers**: DOI / PMID / PMCID triples and their provenance
//! - **Source records**: raw per-source field maps with a fetch status
//! - **Canonical records**: merged fields with provenance and discarded candidates
//! - **Statements**: claims with qualifiers and references, ready for submission
//! - **Outcomes**: per-item results of a batch run

pub mod canonical;
pub mod identifiers;
pub mod manifest;
pub mod outcome;
pub mod source;
pub mod statement;

pub use canonical::{Candidate, CanonicalField, CanonicalRecord, Origin, SourceCitation};
pub use identifiers::{IdOrigin, IdentifierKind, Identifiers, ResolvedId, ResolvedIdentifiers};
pub use manifest::ManifestEntry;
pub use outcome::{BatchReport, ItemCreationOutcome, ItemStatus, StatusCounts};
pub use source::{
    DatePrecision, FetchStatus, Field, FieldValue, PublicationDate, RawSourceRecord, Source,
};
pub use statement::{Claim, NewItem, Reference, Snak, Statement, Value};

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
