//! PubMed source plugin for biomedical literature
//!
//! API docs: https://www.ncbi.nlm.nih.gov/books/NBK25501/
//! Rate limit: 3 requests/second without API key, 10 with key

use super::text::{clean_text, clean_title, date_from_parts, parse_pubmed_date};
use super::traits::{SourceError, SourceMetadata};
use crate::config::{EndpointConfig, HttpConfig};
use crate::http::{url_with_params, HttpError};
use imcite_domain::{Field, FieldValue, IdentifierKind, RawSourceRecord, Source};
use imcite_identifiers::normalize_pmcid;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

// Inline markup inside titles; text goes to the enclosing element
const INLINE_TAGS: &[&str] = &["i", "b", "u", "sub", "sup"];

pub struct PubMedSource;

#[derive(Default)]
struct ArticleState {
    pmid: String,
    title: String,
    journal: String,
    issn: String,
    issn_linking: String,
    volume: String,
    issue: String,
    pages: String,
    year: String,
    month: String,
    day: String,
    medline_date: String,
    language: String,
    publication_types: Vec<String>,
    authors: Vec<String>,
    doi: String,
    pmcid: String,
}

#[derive(Default)]
struct AuthorState {
    last: String,
    fore: String,
    collective: String,
}

impl AuthorState {
    fn display_name(&self) -> Option<String> {
        let collective = clean_text(&self.collective);
        if !collective.is_empty() {
            return Some(collective);
        }
        let last = clean_text(&self.last);
        if last.is_empty() {
            return None;
        }
        let fore = clean_text(&self.fore);
        if fore.is_empty() {
            Some(last)
        } else {
            Some(format!("{} {}", fore, last))
        }
    }
}

impl PubMedSource {
    pub fn metadata() -> SourceMetadata {
        SourceMetadata {
            source: Source::PubMed,
            name: "PubMed",
            description: "Biomedical literature from MEDLINE and life science journals",
            identifier: IdentifierKind::Pmid,
            reference_item: "Q180686",
        }
    }

    /// efetch request for a single PMID
    pub fn efetch_url(
        endpoints: &EndpointConfig,
        http: &HttpConfig,
        pmid: &str,
    ) -> Result<String, HttpError> {
        let base = format!("{}/efetch.fcgi", endpoints.eutils_base.trim_end_matches('/'));
        let mut params = vec![
            ("db", "pubmed"),
            ("retmode", "xml"),
            ("tool", http.tool.as_str()),
            ("id", pmid),
        ];
        if let Some(email) = &http.email {
            params.push(("email", email.as_str()));
        }
        url_with_params(&base, &params)
    }

    /// Parse an efetch XML response into the record for `pmid`.
    ///
    /// An empty article set is `NotFound`.
    pub fn parse_efetch_response(xml: &str, pmid: &str) -> Result<RawSourceRecord, SourceError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut article: Option<ArticleState> = None;
        let mut author: Option<AuthorState> = None;
        let mut article_id_type = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    match name.as_str() {
                        "PubmedArticle" if article.is_none() => {
                            article = Some(ArticleState::default());
                        }
                        "Author" if article.is_some() => author = Some(AuthorState::default()),
                        "ArticleId" => article_id_type = attribute(e, b"IdType").unwrap_or_default(),
                        _ => {}
                    }
                    stack.push(name);
                }
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if name == "Author" {
                        if let (Some(state), Some(a)) = (article.as_mut(), author.take()) {
                            if let Some(display) = a.display_name() {
                                state.authors.push(display);
                            }
                        }
                    } else if name == "PubmedArticle" && article.is_some() {
                        // Only the first article of the set is used
                        break;
                    }
                    stack.pop();
                }
                Ok(Event::Text(e)) if article.is_some() => {
                    let Some(state) = article.as_mut() else {
                        continue;
                    };
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());

                    let mut path = stack
                        .iter()
                        .rev()
                        .map(String::as_str)
                        .skip_while(|n| INLINE_TAGS.contains(n));
                    let element = path.next().unwrap_or_default();
                    let parent = path.next().unwrap_or_default();
                    let grandparent = path.next().unwrap_or_default();

                    match (element, parent) {
                        ("PMID", "MedlineCitation") if state.pmid.is_empty() => {
                            state.pmid = text
                        }
                        ("ArticleTitle", _) => state.title.push_str(&text),
                        ("Title", "Journal") => state.journal.push_str(&text),
                        ("ISSN", "Journal") if state.issn.is_empty() => state.issn = text,
                        ("ISSNLinking", _) => state.issn_linking = text,
                        ("Volume", "JournalIssue") => state.volume = text,
                        ("Issue", "JournalIssue") => state.issue = text,
                        ("MedlinePgn", _) => state.pages = text,
                        ("Year", "PubDate") => state.year = text,
                        ("Month", "PubDate") => state.month = text,
                        ("Day", "PubDate") => state.day = text,
                        ("MedlineDate", "PubDate") => state.medline_date = text,
                        ("Language", _) if state.language.is_empty() => state.language = text,
                        ("PublicationType", _) => state.publication_types.push(text),
                        ("LastName", "Author") => {
                            if let Some(a) = author.as_mut() {
                                a.last.push_str(&text);
                            }
                        }
                        ("ForeName", "Author") => {
                            if let Some(a) = author.as_mut() {
                                a.fore.push_str(&text);
                            }
                        }
                        ("CollectiveName", "Author") => {
                            if let Some(a) = author.as_mut() {
                                a.collective.push_str(&text);
                            }
                        }
                        // Reference lists carry their own ArticleIdList; only
                        // the article's own ids are wanted
                        ("ArticleId", "ArticleIdList") if grandparent == "PubmedData" => {
                            match article_id_type.as_str() {
                                "doi" => state.doi = text,
                                "pmc" => state.pmcid = text,
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(SourceError::Parse(format!("XML parse error: {}", e))),
                _ => {}
            }
            buf.clear();
        }

        let state = article.ok_or(SourceError::NotFound)?;
        Ok(Self::into_record(state, pmid))
    }

    fn into_record(state: ArticleState, pmid: &str) -> RawSourceRecord {
        let mut record = RawSourceRecord::success(Source::PubMed, pmid);

        record.insert_text(Field::Pmid, Some(state.pmid));
        record.insert(Field::Title, FieldValue::Text(clean_title(&state.title)));
        record.insert(Field::Journal, FieldValue::Text(clean_text(&state.journal)));
        let issn = if state.issn.trim().is_empty() {
            state.issn_linking
        } else {
            state.issn
        };
        record.insert_text(Field::Issn, Some(issn));
        record.insert_text(Field::Volume, Some(state.volume));
        record.insert_text(Field::Issue, Some(state.issue));
        record.insert_text(Field::Pages, Some(state.pages));
        record.insert_text(Field::Language, Some(state.language));
        record.insert_text(Field::Doi, Some(state.doi));
        record.insert_text(Field::Pmcid, Some(normalize_pmcid(&state.pmcid)));

        let work_type = state
            .publication_types
            .iter()
            .find(|t| t.trim() == "Review")
            .or_else(|| state.publication_types.first())
            .cloned();
        record.insert_text(Field::WorkType, work_type);

        let date = if state.year.trim().is_empty() {
            parse_pubmed_date(&state.medline_date)
        } else {
            state.year.trim().parse().ok().and_then(|year| {
                let month = parse_pubmed_date(&format!("{} {}", year, state.month.trim()))
                    .and_then(|d| d.month);
                let day = state.day.trim().parse().ok();
                date_from_parts(year, month, day)
            })
        };
        if let Some(date) = date {
            record.insert(Field::PublicationDate, FieldValue::Date(date));
        }

        if !state.authors.is_empty() {
            record.insert(Field::Authors, FieldValue::Names(state.authors));
        }

        record
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
