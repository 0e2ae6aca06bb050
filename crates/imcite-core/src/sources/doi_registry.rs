//! DOI registry source plugin
//!
//! Resolves DOIs through doi.org content negotiation, asking the
//! registration agency (Crossref, DataCite, mEDRA...) for CSL JSON.

use super::text::{clean_text, clean_title, date_from_parts};
use super::traits::{SourceError, SourceMetadata};
use crate::config::EndpointConfig;
use imcite_domain::{Field, FieldValue, IdentifierKind, RawSourceRecord, Source};
use imcite_identifiers::normalize_doi;
use serde::Deserialize;

pub const CSL_JSON: &str = "application/vnd.citationstyles.csl+json";

/// Registries disagree on whether these are strings, numbers or lists
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TextValue {
    One(String),
    Many(Vec<String>),
    Number(i64),
}

impl TextValue {
    fn first(self) -> Option<String> {
        match self {
            TextValue::One(s) => Some(s),
            TextValue::Many(list) => list.into_iter().find(|s| !s.trim().is_empty()),
            TextValue::Number(n) => Some(n.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CslWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    title: Option<TextValue>,
    author: Option<Vec<CslName>>,
    #[serde(rename = "container-title")]
    container_title: Option<TextValue>,
    #[serde(rename = "ISSN")]
    issn: Option<TextValue>,
    volume: Option<TextValue>,
    issue: Option<TextValue>,
    page: Option<TextValue>,
    issued: Option<CslDate>,
    #[serde(rename = "published-print")]
    published_print: Option<CslDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CslDate>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CslName {
    given: Option<String>,
    family: Option<String>,
    literal: Option<String>,
    name: Option<String>,
}

impl CslName {
    fn display_name(&self) -> Option<String> {
        if let Some(literal) = self.literal.as_deref().or(self.name.as_deref()) {
            let literal = clean_text(literal);
            return (!literal.is_empty()).then_some(literal);
        }
        let family = clean_text(self.family.as_deref()?);
        match self.given.as_deref().map(clean_text) {
            Some(given) if !given.is_empty() => Some(format!("{} {}", given, family)),
            _ => (!family.is_empty()).then_some(family),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CslDate {
    #[serde(rename = "date-parts")]
    date_parts: Option<Vec<Vec<Option<serde_json::Value>>>>,
}

impl CslDate {
    fn to_publication_date(&self) -> Option<imcite_domain::PublicationDate> {
        let parts = self.date_parts.as_ref()?.first()?;
        let number = |i: usize| -> Option<i64> {
            match parts.get(i)?.as_ref()? {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        };
        let year = i32::try_from(number(0)?).ok()?;
        let month = number(1).and_then(|m| u32::try_from(m).ok());
        let day = number(2).and_then(|d| u32::try_from(d).ok());
        date_from_parts(year, month, day)
    }
}

pub struct DoiRegistrySource;

impl DoiRegistrySource {
    pub fn metadata() -> SourceMetadata {
        SourceMetadata {
            source: Source::DoiRegistry,
            name: "DOI registry",
            description: "Registration agency metadata via doi.org content negotiation",
            identifier: IdentifierKind::Doi,
            reference_item: "Q28946522",
        }
    }

    /// Resolver URL for a DOI, each path segment percent-encoded
    pub fn resolve_url(endpoints: &EndpointConfig, doi: &str) -> String {
        let encoded: Vec<String> = doi
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/{}",
            endpoints.doi_base.trim_end_matches('/'),
            encoded.join("/")
        )
    }

    /// Parse a CSL JSON response into the record for `doi`
    pub fn parse_csl_response(json: &str, doi: &str) -> Result<RawSourceRecord, SourceError> {
        let work: CslWork = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid CSL JSON: {}", e)))?;

        let mut record = RawSourceRecord::success(Source::DoiRegistry, doi);

        record.insert_text(Field::Doi, work.doi.as_deref().map(normalize_doi));
        if let Some(title) = work.title.and_then(TextValue::first) {
            record.insert(Field::Title, FieldValue::Text(clean_title(&title)));
        }
        if let Some(journal) = work.container_title.and_then(TextValue::first) {
            record.insert(Field::Journal, FieldValue::Text(clean_text(&journal)));
        }
        record.insert_text(Field::Issn, work.issn.and_then(TextValue::first));
        record.insert_text(Field::Volume, work.volume.and_then(TextValue::first));
        record.insert_text(Field::Issue, work.issue.and_then(TextValue::first));
        record.insert_text(Field::Pages, work.page.and_then(TextValue::first));
        record.insert_text(Field::Language, work.language);
        record.insert_text(Field::WorkType, work.work_type);

        let date = [&work.issued, &work.published_print, &work.published_online]
            .into_iter()
            .flatten()
            .find_map(CslDate::to_publication_date);
        if let Some(date) = date {
            record.insert(Field::PublicationDate, FieldValue::Date(date));
        }

        let authors: Vec<String> = work
            .author
            .unwrap_or_default()
            .iter()
            .filter_map(CslName::display_name)
            .collect();
        if !authors.is_empty() {
            record.insert(Field::Authors, FieldValue::Names(authors));
        }

        Ok(record)
    }
}
