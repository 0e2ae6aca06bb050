//! Journal lookup: ISSN → graph item via the SPARQL endpoint
//!
//! Only a unique match is accepted; zero or several matching items leave
//! the work without a "published in" statement.

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::http::Transport;
use crate::statements::properties::ISSN;
use crate::throttle::RequestGate;

lazy_static! {
    static ref ISSN_PATTERN: Regex = Regex::new(r"^\d{4}-\d{3}[\dX]$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("Invalid ISSN: {0}")]
    InvalidIssn(String),
    #[error("Transient journal lookup failure: {0}")]
    Transient(String),
    #[error("Journal lookup failed: {0}")]
    Failed(String),
}

impl JournalError {
    pub fn is_transient(&self) -> bool {
        matches!(self, JournalError::Transient(_))
    }
}

#[async_trait]
pub trait JournalIndex: Send + Sync {
    /// The journal item for an ISSN, if exactly one exists
    async fn journal_for_issn(&self, issn: &str) -> Result<Option<String>, JournalError>;
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    item: SparqlValue,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// Upper-case and hyphenate an ISSN, rejecting anything else
pub fn normalize_issn(raw: &str) -> Result<String, JournalError> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();
    let issn = if compact.len() == 8 && compact.is_ascii() {
        format!("{}-{}", &compact[..4], &compact[4..])
    } else {
        compact
    };
    if ISSN_PATTERN.is_match(&issn) {
        Ok(issn)
    } else {
        Err(JournalError::InvalidIssn(raw.to_string()))
    }
}

/// Item ids from a SPARQL JSON result, keeping only a unique match
pub fn parse_sparql_response(json: &str) -> Result<Option<String>, JournalError> {
    let response: SparqlResponse = serde_json::from_str(json)
        .map_err(|e| JournalError::Failed(format!("Invalid SPARQL JSON: {}", e)))?;

    let mut items: Vec<String> = response
        .results
        .bindings
        .into_iter()
        .filter_map(|b| b.item.value.rsplit('/').next().map(str::to_string))
        .filter(|id| id.starts_with('Q'))
        .collect();
    items.sort();
    items.dedup();

    Ok(match items.len() {
        1 => items.pop(),
        _ => None,
    })
}

pub struct SparqlJournalIndex<T: ?Sized> {
    transport: Arc<T>,
    gate: RequestGate,
    endpoint: String,
}

impl<T: Transport + ?Sized> SparqlJournalIndex<T> {
    pub fn new(transport: Arc<T>, gate: RequestGate, config: &PipelineConfig) -> Self {
        Self {
            transport,
            gate,
            endpoint: config.endpoints.sparql_endpoint.clone(),
        }
    }

    pub fn query_url(&self, issn: &str) -> String {
        let query = format!("SELECT ?item WHERE {{ ?item wdt:{} \"{}\" }}", ISSN, issn);
        format!(
            "{}?format=json&query={}",
            self.endpoint,
            urlencoding::encode(&query)
        )
    }
}

#[async_trait]
impl<T: Transport + ?Sized> JournalIndex for SparqlJournalIndex<T> {
    async fn journal_for_issn(&self, issn: &str) -> Result<Option<String>, JournalError> {
        let issn = normalize_issn(issn)?;
        let url = self.query_url(&issn);

        let response = {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| JournalError::Transient(e.to_string()))?;
            self.transport
                .get(&url, Some("application/sparql-results+json"))
                .await
        };

        let response = response.map_err(|e| {
            if e.is_transient() {
                JournalError::Transient(e.to_string())
            } else {
                JournalError::Failed(e.to_string())
            }
        })?;

        match response.status {
            200..=299 => parse_sparql_response(&response.body),
            429 | 500..=599 => Err(JournalError::Transient(format!(
                "status {}",
                response.status
            ))),
            status => Err(JournalError::Failed(format!("status {}", status))),
        }
    }
}
