//! Raw per-source metadata records

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::identifiers::IdentifierKind;

/// The metadata sources a work can be fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum Source {
    /// Biomedical literature index, keyed by PMID
    PubMed,
    /// Full-text archive, keyed by PMCID
    PubMedCentral,
    /// DOI registration agency, keyed by DOI
    DoiRegistry,
}

impl Source {
    pub fn all() -> &'static [Source] {
        &[Source::PubMed, Source::PubMedCentral, Source::DoiRegistry]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::PubMed => "pubmed",
            Source::PubMedCentral => "pmc",
            Source::DoiRegistry => "doi",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Source::PubMed => "PubMed",
            Source::PubMedCentral => "PubMed Central",
            Source::DoiRegistry => "DOI registry",
        }
    }

    /// The single identifier kind this source is queried with
    pub fn required_identifier(&self) -> IdentifierKind {
        match self {
            Source::PubMed => IdentifierKind::Pmid,
            Source::PubMedCentral => IdentifierKind::Pmcid,
            Source::DoiRegistry => IdentifierKind::Doi,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result classification of one fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    Success,
    /// Valid request, the source has no such record
    NotFound,
    /// Network failure, timeout, 5xx or rate limiting; worth retrying
    TransientError(String),
    /// Malformed identifier, other 4xx, or unparseable response
    PermanentError(String),
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Success)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, FetchStatus::TransientError(_))
    }
}

/// Bibliographic fields shared by all sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Title,
    Authors,
    Journal,
    Issn,
    Volume,
    Issue,
    Pages,
    PublicationDate,
    Language,
    WorkType,
    Doi,
    Pmid,
    Pmcid,
}

impl Field {
    pub fn all() -> &'static [Field] {
        &[
            Field::Title,
            Field::Authors,
            Field::Journal,
            Field::Issn,
            Field::Volume,
            Field::Issue,
            Field::Pages,
            Field::PublicationDate,
            Field::Language,
            Field::WorkType,
            Field::Doi,
            Field::Pmid,
            Field::Pmcid,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Authors => "authors",
            Field::Journal => "journal",
            Field::Issn => "issn",
            Field::Volume => "volume",
            Field::Issue => "issue",
            Field::Pages => "pages",
            Field::PublicationDate => "publication_date",
            Field::Language => "language",
            Field::WorkType => "work_type",
            Field::Doi => "doi",
            Field::Pmid => "pmid",
            Field::Pmcid => "pmcid",
        }
    }

    /// The identifier field for an identifier kind
    pub fn for_identifier(kind: IdentifierKind) -> Field {
        match kind {
            IdentifierKind::Doi => Field::Doi,
            IdentifierKind::Pmid => Field::Pmid,
            IdentifierKind::Pmcid => Field::Pmcid,
        }
    }

    pub fn identifier_kind(&self) -> Option<IdentifierKind> {
        match self {
            Field::Doi => Some(IdentifierKind::Doi),
            Field::Pmid => Some(IdentifierKind::Pmid),
            Field::Pmcid => Some(IdentifierKind::Pmcid),
            _ => None,
        }
    }
}

/// Granularity of a publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A calendar date that may only be known to the month or year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct PublicationDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PublicationDate {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self::day(date.year(), date.month(), date.day())
    }

    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), None) => DatePrecision::Month,
            _ => DatePrecision::Year,
        }
    }
}

/// A raw field value as reported by a source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    /// Ordered author names
    Names(Vec<String>),
    Date(PublicationDate),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Names(names) => names.iter().all(|n| n.trim().is_empty()),
            FieldValue::Date(_) => false,
        }
    }

    /// How much information the value carries; larger is more complete
    pub fn completeness(&self) -> usize {
        match self {
            FieldValue::Text(s) => s.trim().chars().count(),
            FieldValue::Names(names) => names.len(),
            FieldValue::Date(date) => match date.precision() {
                DatePrecision::Year => 1,
                DatePrecision::Month => 2,
                DatePrecision::Day => 3,
            },
        }
    }

    /// Compare ignoring case, surrounding whitespace and Unicode composition
    pub fn same_as(&self, other: &FieldValue) -> bool {
        fn fold(s: &str) -> String {
            s.trim().nfc().collect::<String>().to_lowercase()
        }
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => fold(a) == fold(b),
            (FieldValue::Names(a), FieldValue::Names(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| fold(x) == fold(y))
            }
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            _ => false,
        }
    }
}

/// Raw metadata for one (work, source) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSourceRecord {
    pub source: Source,
    pub status: FetchStatus,
    /// The identifier value the source was queried with
    pub queried_with: String,
    /// Request URL, used as the statement reference
    pub request_url: Option<String>,
    pub retrieved_on: NaiveDate,
    pub fields: BTreeMap<Field, FieldValue>,
}

impl RawSourceRecord {
    pub fn new(source: Source, queried_with: impl Into<String>, status: FetchStatus) -> Self {
        Self {
            source,
            status,
            queried_with: queried_with.into(),
            request_url: None,
            retrieved_on: Utc::now().date_naive(),
            fields: BTreeMap::new(),
        }
    }

    pub fn success(source: Source, queried_with: impl Into<String>) -> Self {
        Self::new(source, queried_with, FetchStatus::Success)
    }

    pub fn not_found(source: Source, queried_with: impl Into<String>) -> Self {
        Self::new(source, queried_with, FetchStatus::NotFound)
    }

    pub fn transient(source: Source, queried_with: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(source, queried_with, FetchStatus::TransientError(msg.into()))
    }

    pub fn permanent(source: Source, queried_with: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(source, queried_with, FetchStatus::PermanentError(msg.into()))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.request_url = Some(url.into());
        self
    }

    /// Set a field, ignoring empty values
    pub fn with_field(mut self, field: Field, value: FieldValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: Field, value: FieldValue) {
        if !value.is_empty() {
            self.fields.insert(field, value);
        }
    }

    pub fn insert_text(&mut self, field: Field, value: Option<String>) {
        if let Some(v) = value {
            self.insert(field, FieldValue::Text(v.trim().to_string()));
        }
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }
}
