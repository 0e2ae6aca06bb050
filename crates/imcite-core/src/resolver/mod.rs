//! Identifier resolution: fill in missing DOI / PMID / PMCID values through
//! a cross-reference service.

pub mod idconv;

pub use idconv::*;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use imcite_domain::{IdOrigin, IdentifierKind, Identifiers, ResolvedId, ResolvedIdentifiers};
use imcite_identifiers::{identifiers_equal, is_valid, normalize};
use thiserror::Error;

use crate::error::PipelineError;
use crate::retry::{retry_while, RetryPolicy};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Network failure, rate limiting or 5xx
    #[error("Transient lookup failure: {0}")]
    Transient(String),
    #[error("No cross references found")]
    NotFound,
    #[error("Lookup rejected: {0}")]
    Permanent(String),
}

impl LookupError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Transient(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("entry has no identifiers")]
    NoIdentifiers,
}

impl From<ResolveError> for PipelineError {
    fn from(e: ResolveError) -> Self {
        PipelineError::InvalidManifestEntry(e.to_string())
    }
}

/// One identifier set returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCandidate {
    /// The query as echoed by the service
    pub requested: Option<String>,
    pub ids: Identifiers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResponse {
    /// Request URL, kept for provenance
    pub url: String,
    pub candidates: Vec<IdCandidate>,
}

/// A service mapping one identifier to the others
#[async_trait]
pub trait CrossReferenceService: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, kind: IdentifierKind, value: &str)
        -> Result<LookupResponse, LookupError>;
}

pub struct IdentifierResolver<S: ?Sized> {
    service: Arc<S>,
    retry: RetryPolicy,
}

impl<S: CrossReferenceService + ?Sized> IdentifierResolver<S> {
    pub fn new(service: Arc<S>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    /// Resolve a partial identifier set.
    ///
    /// Values are normalized but not validated here; a malformed value is
    /// kept so the fetcher keyed on it can report it. Malformed values are
    /// never used as lookup keys. Identifiers no lookup could supply stay
    /// absent.
    pub async fn resolve(&self, partial: &Identifiers) -> Result<ResolvedIdentifiers, ResolveError> {
        let mut normalized = Identifiers::default();
        for kind in partial.present() {
            let value = partial.get(kind).map(|v| normalize(kind, v));
            normalized.set(kind, value.filter(|v| !v.is_empty()));
        }

        if normalized.is_empty() {
            return Err(ResolveError::NoIdentifiers);
        }

        let mut resolved = ResolvedIdentifiers::from_caller(&normalized);

        for kind in IdentifierKind::all().iter().copied() {
            if resolved.values().is_complete() {
                break;
            }
            let Some(value) = normalized.get(kind).filter(|v| is_valid(kind, v)) else {
                continue;
            };

            match self.lookup_with_retry(kind, value).await {
                Ok(response) => self.apply(&mut resolved, kind, value, response),
                Err(LookupError::NotFound) => {
                    tracing::debug!(query = %kind, value, "no cross references");
                }
                Err(e) => {
                    tracing::warn!(query = %kind, value, error = %e, "lookup failed, continuing with partial identifiers");
                }
            }
        }

        Ok(resolved)
    }

    async fn lookup_with_retry(
        &self,
        kind: IdentifierKind,
        value: &str,
    ) -> Result<LookupResponse, LookupError> {
        let service = self.service.as_ref();
        retry_while(
            &self.retry,
            service.name(),
            move || service.lookup(kind, value),
            |result: &Result<LookupResponse, LookupError>| {
                matches!(result, Err(e) if e.is_transient())
            },
        )
        .await
    }

    fn apply(
        &self,
        resolved: &mut ResolvedIdentifiers,
        kind: IdentifierKind,
        value: &str,
        response: LookupResponse,
    ) {
        let exact: Vec<&IdCandidate> = response
            .candidates
            .iter()
            .filter(|c| {
                c.requested
                    .as_deref()
                    .is_some_and(|r| identifiers_equal(kind, r, value))
            })
            .collect();
        let ambiguous = response.candidates.len() > 1;

        let Some(chosen) = exact.first() else {
            tracing::warn!(query = %kind, value, candidates = response.candidates.len(), "no candidate matches the query");
            return;
        };
        if ambiguous {
            tracing::warn!(query = %kind, value, candidates = response.candidates.len(), "ambiguous cross reference, using first exact match");
        }

        for missing in resolved.values().missing() {
            let Some(found) = chosen.ids.get(missing).filter(|v| is_valid(missing, v)) else {
                continue;
            };
            tracing::debug!(query = %kind, found = %missing, value = found, "identifier resolved");
            resolved.set(
                missing,
                ResolvedId {
                    value: found.to_string(),
                    origin: IdOrigin::Lookup {
                        service: self.service.name().to_string(),
                        query: kind,
                        url: response.url.clone(),
                        retrieved_on: Utc::now().date_naive(),
                        ambiguous,
                    },
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns canned responses keyed by query value and records every call
    struct FakeService {
        responses: Vec<(String, Result<LookupResponse, LookupError>)>,
        calls: Mutex<Vec<(IdentifierKind, String)>>,
    }

    impl FakeService {
        fn new(responses: Vec<(&str, Result<LookupResponse, LookupError>)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CrossReferenceService for FakeService {
        fn name(&self) -> &str {
            "fake"
        }

        async fn lookup(
            &self,
            kind: IdentifierKind,
            value: &str,
        ) -> Result<LookupResponse, LookupError> {
            self.calls.lock().unwrap().push((kind, value.to_string()));
            self.responses
                .iter()
                .find(|(k, _)| k == value)
                .map(|(_, v)| v.clone())
                .unwrap_or(Err(LookupError::NotFound))
        }
    }

    fn response(requested: &str, ids: Identifiers) -> Result<LookupResponse, LookupError> {
        Ok(LookupResponse {
            url: format!("https://idconv.test/?ids={}", requested),
            candidates: vec![IdCandidate {
                requested: Some(requested.to_string()),
                ids,
            }],
        })
    }

    fn ids(doi: Option<&str>, pmid: Option<&str>, pmcid: Option<&str>) -> Identifiers {
        Identifiers {
            doi: doi.map(str::to_string),
            pmid: pmid.map(str::to_string),
            pmcid: pmcid.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_empty_input_fails_without_lookups() {
        let service = Arc::new(FakeService::new(vec![]));
        let resolver = IdentifierResolver::new(service.clone(), RetryPolicy::none());
        let result = resolver.resolve(&Identifiers::default()).await;
        assert_eq!(result, Err(ResolveError::NoIdentifiers));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_triple_needs_no_lookup() {
        let service = Arc::new(FakeService::new(vec![]));
        let resolver = IdentifierResolver::new(service.clone(), RetryPolicy::none());
        let input = ids(Some("10.1/abc"), Some("111"), Some("PMC222"));
        let resolved = resolver.resolve(&input).await.unwrap();
        assert_eq!(service.call_count(), 0);
        assert_eq!(resolved.values(), ids(Some("10.1/abc"), Some("111"), Some("222")));
    }

    #[tokio::test]
    async fn test_doi_fills_missing_ids() {
        let service = Arc::new(FakeService::new(vec![(
            "10.1/abc",
            response("10.1/abc", ids(Some("10.1/abc"), Some("111"), Some("222"))),
        )]));
        let resolver = IdentifierResolver::new(service.clone(), RetryPolicy::none());
        let resolved = resolver.resolve(&ids(Some("10.1/abc"), None, None)).await.unwrap();

        assert_eq!(service.call_count(), 1);
        assert_eq!(resolved.values(), ids(Some("10.1/abc"), Some("111"), Some("222")));
        assert_eq!(resolved.doi.as_ref().map(|d| &d.origin), Some(&IdOrigin::Caller));
        assert!(matches!(
            resolved.pmid.as_ref().map(|p| &p.origin),
            Some(IdOrigin::Lookup { query: IdentifierKind::Doi, ambiguous: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_ambiguous_picks_exact_match() {
        let service = Arc::new(FakeService::new(vec![(
            "111",
            Ok(LookupResponse {
                url: "https://idconv.test/?ids=111".to_string(),
                candidates: vec![
                    IdCandidate {
                        requested: Some("999".to_string()),
                        ids: ids(None, Some("999"), Some("888")),
                    },
                    IdCandidate {
                        requested: Some("111".to_string()),
                        ids: ids(None, Some("111"), Some("222")),
                    },
                ],
            }),
        )]));
        let resolver = IdentifierResolver::new(service, RetryPolicy::none());
        let resolved = resolver.resolve(&ids(None, Some("111"), None)).await.unwrap();

        assert_eq!(resolved.values().pmcid.as_deref(), Some("222"));
        assert!(matches!(
            resolved.pmcid.as_ref().map(|p| &p.origin),
            Some(IdOrigin::Lookup { ambiguous: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_not_found_leaves_ids_absent() {
        let service = Arc::new(FakeService::new(vec![]));
        let resolver = IdentifierResolver::new(service, RetryPolicy::none());
        let resolved = resolver.resolve(&ids(None, Some("111"), None)).await.unwrap();
        assert_eq!(resolved.values(), ids(None, Some("111"), None));
    }

    #[tokio::test]
    async fn test_malformed_value_kept_but_not_queried() {
        let service = Arc::new(FakeService::new(vec![]));
        let resolver = IdentifierResolver::new(service.clone(), RetryPolicy::none());
        let resolved = resolver.resolve(&ids(Some("bad"), None, None)).await.unwrap();
        assert_eq!(service.call_count(), 0);
        assert_eq!(resolved.values().doi.as_deref(), Some("bad"));
    }

    #[tokio::test]
    async fn test_transient_failure_continues_with_partial_ids() {
        let service = Arc::new(FakeService::new(vec![(
            "111",
            Err(LookupError::Transient("503".to_string())),
        )]));
        let resolver = IdentifierResolver::new(service.clone(), RetryPolicy::none());
        let resolved = resolver.resolve(&ids(None, Some("111"), None)).await.unwrap();
        assert_eq!(resolved.values(), ids(None, Some("111"), None));
        assert_eq!(service.call_count(), 1);
    }
}
