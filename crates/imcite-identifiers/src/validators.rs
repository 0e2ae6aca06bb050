//! Identifier validation and normalization functions

use imcite_domain::IdentifierKind;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // DOI validation regex: directory indicator, registrant code, suffix
    static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d+(\.\d+)*/\S+$").unwrap();

    // PMIDs and unprefixed PMCIDs are plain positive integers
    static ref NUMERIC_ID_PATTERN: Regex = Regex::new(r"^[1-9]\d{0,9}$").unwrap();

    static ref PMID_PREFIX: Regex = Regex::new(r"(?i)^pmid:\s*").unwrap();
    static ref PMC_PREFIX: Regex = Regex::new(r"(?i)^pmc(id)?:?\s*").unwrap();
}

pub fn is_valid_doi(doi: &str) -> bool {
    DOI_PATTERN.is_match(doi)
}

pub fn is_valid_pmid(pmid: &str) -> bool {
    NUMERIC_ID_PATTERN.is_match(pmid)
}

/// Validate an unprefixed PMCID
pub fn is_valid_pmcid(pmcid: &str) -> bool {
    NUMERIC_ID_PATTERN.is_match(pmcid)
}

pub fn is_valid(kind: IdentifierKind, value: &str) -> bool {
    match kind {
        IdentifierKind::Doi => is_valid_doi(value),
        IdentifierKind::Pmid => is_valid_pmid(value),
        IdentifierKind::Pmcid => is_valid_pmcid(value),
    }
}

pub fn normalize_doi(doi: &str) -> String {
    let mut result = doi.trim().to_string();

    // Remove common prefixes
    let prefixes = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
        "DOI:",
    ];

    for prefix in prefixes {
        if let Some(stripped) = result.strip_prefix(prefix) {
            result = stripped.trim_start().to_string();
            break;
        }
    }

    // Remove trailing punctuation
    while let Some(c) = result.chars().last() {
        if c == '.' || c == ',' || c == ';' {
            result.pop();
        } else {
            break;
        }
    }

    result
}

pub fn normalize_pmid(pmid: &str) -> String {
    PMID_PREFIX.replace(pmid.trim(), "").trim().to_string()
}

/// Strip any `PMC` prefix; PMCIDs are stored unprefixed
pub fn normalize_pmcid(pmcid: &str) -> String {
    PMC_PREFIX.replace(pmcid.trim(), "").trim().to_string()
}

/// Normalize without validating; malformed values are reported by the
/// fetcher that would use them.
pub fn normalize(kind: IdentifierKind, value: &str) -> String {
    match kind {
        IdentifierKind::Doi => normalize_doi(value),
        IdentifierKind::Pmid => normalize_pmid(value),
        IdentifierKind::Pmcid => normalize_pmcid(value),
    }
}

/// DOIs are case-insensitive; the numeric identifiers compare after normalization
pub fn identifiers_equal(kind: IdentifierKind, a: &str, b: &str) -> bool {
    let (a, b) = (normalize(kind, a), normalize(kind, b));
    match kind {
        IdentifierKind::Doi => a.eq_ignore_ascii_case(&b),
        IdentifierKind::Pmid | IdentifierKind::Pmcid => a == b,
    }
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn normalize_doi_ffi(doi: String) -> String {
    normalize_doi(&doi)
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn normalize_pmcid_ffi(pmcid: String) -> String {
    normalize_pmcid(&pmcid)
}
