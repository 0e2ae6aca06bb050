//! Identifier validation and normalization for scholarly works
//!
//! This crate provides tools for working with the identifiers imcite accepts:
//! - DOI normalization (URL and `doi:` prefixes, trailing punctuation)
//! - PMID and PMCID validation, with the `PMC` prefix stripped
//! - Landing-page URLs for each identifier kind

pub mod urls;
pub mod validators;

pub use urls::*;
pub use validators::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
