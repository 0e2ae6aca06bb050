//! Graph vocabulary: property ids, item ids and the static mapping tables

use imcite_domain::Field;

pub const INSTANCE_OF: &str = "P31";
pub const TITLE: &str = "P1476";
pub const AUTHOR_NAME_STRING: &str = "P2093";
pub const SERIES_ORDINAL: &str = "P1545";
pub const DOI: &str = "P356";
pub const PUBMED_ID: &str = "P698";
pub const PMCID: &str = "P932";
pub const PUBLISHED_IN: &str = "P1433";
pub const VOLUME: &str = "P478";
pub const ISSUE: &str = "P433";
pub const PAGES: &str = "P304";
pub const PUBLICATION_DATE: &str = "P577";
pub const LANGUAGE_OF_WORK: &str = "P407";
pub const ISSN: &str = "P236";

// Reference parts
pub const STATED_IN: &str = "P248";
pub const REFERENCE_URL: &str = "P854";
pub const RETRIEVED: &str = "P813";

pub const SCHOLARLY_ARTICLE: &str = "Q13442814";

/// Identifier fields and their properties, in statement order
pub const IDENTIFIER_PROPERTIES: &[(Field, &str)] = &[
    (Field::Doi, DOI),
    (Field::Pmid, PUBMED_ID),
    (Field::Pmcid, PMCID),
];

/// Plain single-valued bibliographic fields, emitted after "published in".
///
/// Title, authors, work type, journal and language need special handling
/// and are not listed.
pub const DETAIL_PROPERTIES: &[(Field, &str)] = &[
    (Field::Volume, VOLUME),
    (Field::Issue, ISSUE),
    (Field::Pages, PAGES),
    (Field::PublicationDate, PUBLICATION_DATE),
];

// Lower-cased raw work types from PubMed, PMC and CSL
const WORK_TYPES: &[(&str, &str)] = &[
    ("journal article", SCHOLARLY_ARTICLE),
    ("article-journal", SCHOLARLY_ARTICLE),
    ("journal-article", SCHOLARLY_ARTICLE),
    ("review", "Q7318358"),
    ("systematic review", "Q1504425"),
    ("letter", "Q133492"),
    ("editorial", "Q871232"),
    ("case reports", "Q2782326"),
    ("posted-content", "Q580922"),
    ("preprint", "Q580922"),
    ("book-chapter", "Q1980247"),
    ("chapter", "Q1980247"),
];

/// (raw codes, ISO 639-1 code, language item)
const LANGUAGES: &[(&[&str], &str, &str)] = &[
    (&["eng", "en", "english"], "en", "Q1860"),
    (&["fre", "fra", "fr", "french"], "fr", "Q150"),
    (&["ger", "deu", "de", "german"], "de", "Q188"),
    (&["spa", "es", "spanish"], "es", "Q1321"),
    (&["ita", "it", "italian"], "it", "Q652"),
    (&["por", "pt", "portuguese"], "pt", "Q5146"),
    (&["dut", "nld", "nl", "dutch"], "nl", "Q7411"),
    (&["rus", "ru", "russian"], "ru", "Q7737"),
    (&["jpn", "ja", "japanese"], "ja", "Q5287"),
    (&["chi", "zho", "zh", "chinese"], "zh", "Q7850"),
];

/// Item for a raw work type; anything unmapped is a scholarly article
pub fn work_type_item(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return SCHOLARLY_ARTICLE;
    };
    let lower = raw.trim().to_lowercase();
    WORK_TYPES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, item)| *item)
        .unwrap_or(SCHOLARLY_ARTICLE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Code used for monolingual text values
    pub code: &'static str,
    pub item: &'static str,
}

/// Map a PubMed (ISO 639-2) or CSL (ISO 639-1 / BCP 47) language
pub fn language(raw: &str) -> Option<Language> {
    let lower = raw.trim().to_lowercase();
    // "en-US" → "en"
    let primary = lower.split(['-', '_']).next().unwrap_or(&lower);
    LANGUAGES
        .iter()
        .find(|(codes, _, _)| codes.contains(&primary))
        .map(|(_, code, item)| Language { code: *code, item: *item })
}
