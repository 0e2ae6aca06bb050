//! Source plugins for fetching one work's metadata from each upstream
//!
//! The set of sources is closed; [`SourceFetcher::fetch`] dispatches on
//! [`Source`] and never fails. Every outcome, including network errors, is
//! recorded as the [`FetchStatus`] of the returned record.

pub mod doi_registry;
pub mod pmc;
pub mod pubmed;
pub mod text;
pub mod traits;

pub use doi_registry::*;
pub use pmc::*;
pub use pubmed::*;
pub use traits::*;

use std::sync::Arc;

use futures::future::join_all;
use imcite_domain::{FetchStatus, Identifiers, RawSourceRecord, Source};
use imcite_identifiers::{is_valid, normalize};

use crate::config::{EndpointConfig, HttpConfig, PipelineConfig};
use crate::http::{HttpError, Transport};
use crate::retry::{retry_while, RetryPolicy};
use crate::throttle::RequestGate;

/// Metadata for any source
pub fn source_metadata(source: Source) -> SourceMetadata {
    match source {
        Source::PubMed => PubMedSource::metadata(),
        Source::PubMedCentral => PmcSource::metadata(),
        Source::DoiRegistry => DoiRegistrySource::metadata(),
    }
}

/// Fetches raw records through the shared transport and request gate
pub struct SourceFetcher<T: ?Sized> {
    transport: Arc<T>,
    gate: RequestGate,
    endpoints: EndpointConfig,
    http: HttpConfig,
    retry: RetryPolicy,
}

impl<T: Transport + ?Sized> SourceFetcher<T> {
    pub fn new(transport: Arc<T>, gate: RequestGate, config: &PipelineConfig) -> Self {
        Self {
            transport,
            gate,
            endpoints: config.endpoints.clone(),
            http: config.http.clone(),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    /// Fetch one work from one source.
    ///
    /// Malformed identifiers are rejected locally as `PermanentError`;
    /// transient failures are retried per the retry policy.
    pub async fn fetch(&self, source: Source, identifier: &str) -> RawSourceRecord {
        let kind = source.required_identifier();
        let value = normalize(kind, identifier);

        if !is_valid(kind, &value) {
            tracing::debug!(source = source.as_str(), identifier, "malformed identifier, not fetched");
            return RawSourceRecord::permanent(
                source,
                identifier,
                format!("malformed {}: {}", kind, identifier),
            );
        }

        let value = value.as_str();
        let record = retry_while(
            &self.retry,
            source.as_str(),
            move || self.fetch_once(source, value),
            |record: &RawSourceRecord| record.status.is_transient(),
        )
        .await;

        match &record.status {
            FetchStatus::Success => {
                tracing::debug!(source = source.as_str(), identifier = value, fields = record.fields.len(), "fetched")
            }
            FetchStatus::NotFound => {
                tracing::info!(source = source.as_str(), identifier = value, "no record")
            }
            FetchStatus::TransientError(msg) | FetchStatus::PermanentError(msg) => {
                tracing::warn!(source = source.as_str(), identifier = value, error = %msg, "fetch failed")
            }
        }

        record
    }

    /// Fetch every source whose identifier is known, concurrently.
    ///
    /// Sources without an identifier are skipped and produce no record.
    pub async fn fetch_all(&self, ids: &Identifiers) -> Vec<RawSourceRecord> {
        let fetches = Source::all().iter().filter_map(|source| {
            ids.get(source.required_identifier())
                .map(|id| self.fetch(*source, id))
        });
        join_all(fetches).await
    }

    fn request(&self, source: Source, id: &str) -> Result<(String, Option<&'static str>), HttpError> {
        match source {
            Source::PubMed => {
                PubMedSource::efetch_url(&self.endpoints, &self.http, id).map(|url| (url, None))
            }
            Source::PubMedCentral => {
                PmcSource::esummary_url(&self.endpoints, &self.http, id).map(|url| (url, None))
            }
            Source::DoiRegistry => Ok((
                DoiRegistrySource::resolve_url(&self.endpoints, id),
                Some(CSL_JSON),
            )),
        }
    }

    async fn fetch_once(&self, source: Source, id: &str) -> RawSourceRecord {
        let (url, accept) = match self.request(source, id) {
            Ok(request) => request,
            Err(e) => return RawSourceRecord::new(source, id, SourceError::from(e).to_status()),
        };

        let response = match self.gate.acquire().await {
            Ok(_permit) => self.transport.get(&url, accept).await,
            Err(e) => return RawSourceRecord::transient(source, id, e.to_string()).with_url(url),
        };

        let parsed = response
            .map_err(SourceError::from)
            .and_then(check_status)
            .and_then(|body| match source {
                Source::PubMed => PubMedSource::parse_efetch_response(&body, id),
                Source::PubMedCentral => PmcSource::parse_esummary_response(&body, id),
                Source::DoiRegistry => DoiRegistrySource::parse_csl_response(&body, id),
            });

        match parsed {
            Ok(record) => record.with_url(url),
            Err(e) => RawSourceRecord::new(source, id, e.to_status()).with_url(url),
        }
    }
}
