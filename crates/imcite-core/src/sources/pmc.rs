//! PubMed Central source plugin
//!
//! Uses the E-utilities esummary endpoint with `db=pmc` and JSON output.

use super::text::{clean_text, clean_title, parse_pubmed_date};
use super::traits::{SourceError, SourceMetadata};
use crate::config::{EndpointConfig, HttpConfig};
use crate::http::{url_with_params, HttpError};
use imcite_domain::{Field, FieldValue, IdentifierKind, RawSourceRecord, Source};
use imcite_identifiers::{normalize_doi, normalize_pmcid};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    result: Option<serde_json::Map<String, serde_json::Value>>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PmcSummary {
    uid: String,
    error: Option<String>,
    title: String,
    authors: Vec<PmcAuthor>,
    fulljournalname: String,
    source: String,
    issn: String,
    essn: String,
    volume: String,
    issue: String,
    pages: String,
    pubdate: String,
    epubdate: String,
    lang: Vec<String>,
    pubtype: Vec<String>,
    articleids: Vec<PmcArticleId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PmcAuthor {
    name: String,
    authtype: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PmcArticleId {
    idtype: String,
    value: String,
}

pub struct PmcSource;

impl PmcSource {
    pub fn metadata() -> SourceMetadata {
        SourceMetadata {
            source: Source::PubMedCentral,
            name: "PubMed Central",
            description: "Free full-text archive of biomedical and life sciences literature",
            identifier: IdentifierKind::Pmcid,
            reference_item: "Q229883",
        }
    }

    /// esummary request for a single unprefixed PMCID
    pub fn esummary_url(
        endpoints: &EndpointConfig,
        http: &HttpConfig,
        pmcid: &str,
    ) -> Result<String, HttpError> {
        let base = format!("{}/esummary.fcgi", endpoints.eutils_base.trim_end_matches('/'));
        let mut params = vec![
            ("db", "pmc"),
            ("retmode", "json"),
            ("tool", http.tool.as_str()),
            ("id", pmcid),
        ];
        if let Some(email) = &http.email {
            params.push(("email", email.as_str()));
        }
        url_with_params(&base, &params)
    }

    /// Parse an esummary JSON response into the record for `pmcid`
    pub fn parse_esummary_response(json: &str, pmcid: &str) -> Result<RawSourceRecord, SourceError> {
        let response: EsummaryResponse = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid esummary JSON: {}", e)))?;

        if let Some(error) = response.error {
            return Err(SourceError::InvalidQuery(error));
        }

        let result = response.result.ok_or(SourceError::NotFound)?;
        let doc = result
            .iter()
            .filter(|(key, _)| key.as_str() != "uids")
            .map(|(_, value)| value)
            .find(|value| {
                value
                    .get("uid")
                    .and_then(|uid| uid.as_str())
                    .map(normalize_pmcid)
                    .is_some_and(|uid| uid == pmcid)
            })
            .ok_or(SourceError::NotFound)?;

        let summary: PmcSummary = serde_json::from_value(doc.clone())
            .map_err(|e| SourceError::Parse(format!("Invalid esummary document: {}", e)))?;

        if summary.error.is_some() {
            return Err(SourceError::NotFound);
        }

        Ok(Self::into_record(summary, pmcid))
    }

    fn into_record(summary: PmcSummary, pmcid: &str) -> RawSourceRecord {
        let mut record = RawSourceRecord::success(Source::PubMedCentral, pmcid);

        record.insert_text(Field::Pmcid, Some(normalize_pmcid(&summary.uid)));
        record.insert(Field::Title, FieldValue::Text(clean_title(&summary.title)));

        let journal = if summary.fulljournalname.trim().is_empty() {
            &summary.source
        } else {
            &summary.fulljournalname
        };
        record.insert(Field::Journal, FieldValue::Text(clean_text(journal)));

        let issn = if summary.issn.trim().is_empty() {
            summary.essn
        } else {
            summary.issn
        };
        record.insert_text(Field::Issn, Some(issn));
        record.insert_text(Field::Volume, Some(summary.volume));
        record.insert_text(Field::Issue, Some(summary.issue));
        record.insert_text(Field::Pages, Some(summary.pages));
        record.insert_text(Field::Language, summary.lang.into_iter().next());
        record.insert_text(Field::WorkType, summary.pubtype.into_iter().next());

        let date = parse_pubmed_date(&summary.pubdate).or_else(|| parse_pubmed_date(&summary.epubdate));
        if let Some(date) = date {
            record.insert(Field::PublicationDate, FieldValue::Date(date));
        }

        for id in summary.articleids {
            match id.idtype.as_str() {
                "pmid" if id.value.trim() != "0" => {
                    record.insert_text(Field::Pmid, Some(id.value))
                }
                "doi" => record.insert_text(Field::Doi, Some(normalize_doi(&id.value))),
                _ => {}
            }
        }

        // Editors and collective entries are not authors of the work
        let authors: Vec<String> = summary
            .authors
            .into_iter()
            .filter(|a| a.authtype == "Author")
            .map(|a| clean_text(&a.name))
            .filter(|name| !name.is_empty())
            .collect();
        if !authors.is_empty() {
            record.insert(Field::Authors, FieldValue::Names(authors));
        }

        record
    }
}
