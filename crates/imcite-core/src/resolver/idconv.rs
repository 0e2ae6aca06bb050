//! NCBI PMC ID converter client
//!
//! API docs: https://www.ncbi.nlm.nih.gov/pmc/tools/id-converter-api/
//! One request maps a DOI, PMID or PMCID to the other two.

use std::sync::Arc;

use async_trait::async_trait;
use imcite_domain::{IdentifierKind, Identifiers};
use imcite_identifiers::{normalize_doi, normalize_pmcid, normalize_pmid};
use serde::Deserialize;

use super::{CrossReferenceService, IdCandidate, LookupError, LookupResponse};
use crate::config::{EndpointConfig, HttpConfig, PipelineConfig};
use crate::http::{url_with_params, Transport};
use crate::throttle::RequestGate;

#[derive(Debug, Deserialize)]
struct IdConvResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    records: Vec<IdConvRecord>,
}

#[derive(Debug, Deserialize)]
struct IdConvRecord {
    #[serde(rename = "requested-id")]
    requested_id: Option<String>,
    pmcid: Option<String>,
    pmid: Option<String>,
    doi: Option<String>,
    status: Option<String>,
}

pub struct IdConverterClient<T: ?Sized> {
    transport: Arc<T>,
    gate: RequestGate,
    endpoints: EndpointConfig,
    http: HttpConfig,
}

impl<T: Transport + ?Sized> IdConverterClient<T> {
    pub const SERVICE_NAME: &'static str = "NCBI ID converter";

    pub fn new(transport: Arc<T>, gate: RequestGate, config: &PipelineConfig) -> Self {
        Self {
            transport,
            gate,
            endpoints: config.endpoints.clone(),
            http: config.http.clone(),
        }
    }

    pub fn lookup_url(&self, kind: IdentifierKind, value: &str) -> Result<String, LookupError> {
        // The converter expects prefixed PMCIDs
        let id = match kind {
            IdentifierKind::Pmcid => format!("PMC{}", value),
            IdentifierKind::Doi | IdentifierKind::Pmid => value.to_string(),
        };
        let base = format!("{}/", self.endpoints.idconv_base.trim_end_matches('/'));
        let mut params = vec![
            ("ids", id.as_str()),
            ("format", "json"),
            ("tool", self.http.tool.as_str()),
        ];
        if let Some(email) = &self.http.email {
            params.push(("email", email.as_str()));
        }
        url_with_params(&base, &params).map_err(|e| LookupError::Permanent(e.to_string()))
    }
}

/// Parse an ID converter JSON response
pub fn parse_idconv_response(json: &str) -> Result<Vec<IdCandidate>, LookupError> {
    let response: IdConvResponse = serde_json::from_str(json)
        .map_err(|e| LookupError::Permanent(format!("Invalid ID converter JSON: {}", e)))?;

    if response.status.as_deref() == Some("error") {
        return Err(LookupError::Permanent(
            response.message.unwrap_or_else(|| "ID converter error".to_string()),
        ));
    }

    let candidates: Vec<IdCandidate> = response
        .records
        .into_iter()
        .filter(|r| r.status.as_deref() != Some("error"))
        .map(|r| IdCandidate {
            requested: r.requested_id,
            ids: Identifiers {
                doi: r.doi.as_deref().map(normalize_doi),
                pmid: r.pmid.as_deref().map(normalize_pmid),
                pmcid: r.pmcid.as_deref().map(normalize_pmcid),
            },
        })
        .filter(|c| !c.ids.is_empty())
        .collect();

    if candidates.is_empty() {
        Err(LookupError::NotFound)
    } else {
        Ok(candidates)
    }
}

#[async_trait]
impl<T: Transport + ?Sized> CrossReferenceService for IdConverterClient<T> {
    fn name(&self) -> &str {
        Self::SERVICE_NAME
    }

    async fn lookup(&self, kind: IdentifierKind, value: &str) -> Result<LookupResponse, LookupError> {
        let url = self.lookup_url(kind, value)?;

        let response = {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| LookupError::Transient(e.to_string()))?;
            self.transport.get(&url, None).await
        };

        let response = response.map_err(|e| {
            if e.is_transient() {
                LookupError::Transient(e.to_string())
            } else {
                LookupError::Permanent(e.to_string())
            }
        })?;

        match response.status {
            200..=299 => {}
            404 => return Err(LookupError::NotFound),
            429 | 500..=599 => {
                return Err(LookupError::Transient(format!("status {}", response.status)))
            }
            status => return Err(LookupError::Permanent(format!("status {}", status))),
        }

        let candidates = parse_idconv_response(&response.body)?;
        Ok(LookupResponse { url, candidates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_idconv_response() {
        let json = r#"{
          "status": "ok",
          "responseDate": "2024-01-01 00:00:00",
          "request": "ids=10.1371%2Fjournal.pone.0022594;format=json",
          "records": [
            {
              "pmcid": "PMC3148254",
              "pmid": "21841758",
              "doi": "10.1371/journal.pone.0022594",
              "requested-id": "10.1371/journal.pone.0022594"
            }
          ]
        }"#;
        let candidates = parse_idconv_response(json).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ids.pmcid.as_deref(), Some("3148254"));
        assert_eq!(candidates[0].ids.pmid.as_deref(), Some("21841758"));
        assert_eq!(
            candidates[0].requested.as_deref(),
            Some("10.1371/journal.pone.0022594")
        );
    }

    #[test]
    fn test_error_records_are_not_found() {
        let json = r#"{"status": "ok", "records": [
            {"requested-id": "10.1/abc", "status": "error", "errmsg": "invalid article id"}
        ]}"#;
        assert!(matches!(
            parse_idconv_response(json),
            Err(LookupError::NotFound)
        ));
    }

    #[test]
    fn test_request_error_is_permanent() {
        let json = r#"{"status": "error", "message": "invalid 'ids' parameter"}"#;
        assert!(matches!(
            parse_idconv_response(json),
            Err(LookupError::Permanent(_))
        ));
    }
}
