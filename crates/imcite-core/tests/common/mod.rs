//! Shared helpers for imcite-core integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use imcite_core::{
    GraphWriteError, GraphWriter, HttpError, HttpResponse, NewItem, PipelineConfig, RequestGate,
    Transport,
};
use tokio_util::sync::CancellationToken;

pub const EUTILS: &str = "https://eutils.test/entrez/eutils";
pub const IDCONV: &str = "https://idconv.test/v1.0";
pub const DOI_BASE: &str = "https://doi.test";
pub const SPARQL: &str = "https://sparql.test/sparql";

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config pointing at the mock hosts, with fast retries and no journal lookups
pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.endpoints.eutils_base = EUTILS.to_string();
    config.endpoints.idconv_base = IDCONV.to_string();
    config.endpoints.doi_base = DOI_BASE.to_string();
    config.endpoints.sparql_endpoint = SPARQL.to_string();
    config.throttle.requests_per_second = 1000;
    config.throttle.burst = 1000;
    config.retry.max_attempts = 3;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 4;
    config.statements.resolve_journals = false;
    config
}

pub fn ok(body: &str) -> Result<HttpResponse, HttpError> {
    status(200, body)
}

pub fn status(status: u16, body: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
        headers: HashMap::new(),
    })
}

struct Route {
    pattern: String,
    responses: VecDeque<Result<HttpResponse, HttpError>>,
}

/// URL-routed scripted transport.
///
/// The first route whose pattern is a substring of the URL answers. A
/// route plays its responses in order and repeats the last one. Unrouted
/// URLs get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, pattern: &str, response: Result<HttpResponse, HttpError>) -> Self {
        self.route_sequence(pattern, vec![response])
    }

    pub fn route_sequence(
        self,
        pattern: &str,
        responses: Vec<Result<HttpResponse, HttpError>>,
    ) -> Self {
        self.routes.lock().unwrap().push(Route {
            pattern: pattern.to_string(),
            responses: responses.into(),
        });
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_matching(&self, pattern: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, _accept: Option<&str>) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.iter_mut().find(|r| url.contains(&r.pattern)) else {
            return status(404, "");
        };
        if route.responses.len() > 1 {
            route.responses.pop_front().unwrap()
        } else {
            route.responses.front().cloned().unwrap_or_else(|| status(404, ""))
        }
    }
}

/// Graph writer that records every created item
pub struct RecordingWriter {
    created: Mutex<Vec<NewItem<String>>>,
    next_id: AtomicU32,
    failure: Option<GraphWriteError>,
    cancel_on_create: Option<CancellationToken>,
    gate: Option<RequestGate>,
    free_slots_seen: Mutex<Vec<usize>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1000),
            failure: None,
            cancel_on_create: None,
            gate: None,
            free_slots_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GraphWriteError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    /// Cancel `token` as soon as the first item is created
    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel_on_create: Some(token),
            ..Self::new()
        }
    }

    /// Note the free slots of `gate` at every create
    pub fn watching(gate: RequestGate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn free_slots_seen(&self) -> Vec<usize> {
        self.free_slots_seen.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NewItem<String>> {
        self.created.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.next_id.load(Ordering::SeqCst) - 1000
    }
}

#[async_trait]
impl GraphWriter for RecordingWriter {
    type Statement = String;

    async fn create(&self, item: NewItem<String>) -> Result<String, GraphWriteError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            self.free_slots_seen.lock().unwrap().push(gate.available_slots());
        }
        if let Some(token) = &self.cancel_on_create {
            token.cancel();
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.created.lock().unwrap().push(item);
        Ok(format!("Q{}", n))
    }
}

/// Minimal efetch document for one article
pub fn efetch_xml(pmid: &str, doi: Option<&str>, title: &str, authors: &[(&str, &str)]) -> String {
    let authors: String = authors
        .iter()
        .map(|(fore, last)| {
            format!(
                "<Author><LastName>{}</LastName><ForeName>{}</ForeName></Author>",
                last, fore
            )
        })
        .collect();
    let doi = doi
        .map(|d| format!(r#"<ArticleId IdType="doi">{}</ArticleId>"#, d))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0"?>
<PubmedArticleSet><PubmedArticle>
  <MedlineCitation>
    <PMID Version="1">{pmid}</PMID>
    <Article>
      <Journal>
        <ISSN IssnType="Electronic">1932-6203</ISSN>
        <JournalIssue><Volume>6</Volume><PubDate><Year>2011</Year><Month>Aug</Month></PubDate></JournalIssue>
        <Title>PloS one</Title>
      </Journal>
      <ArticleTitle>{title}</ArticleTitle>
      <AuthorList>{authors}</AuthorList>
      <Language>eng</Language>
    </Article>
  </MedlineCitation>
  <PubmedData><ArticleIdList>
    <ArticleId IdType="pubmed">{pmid}</ArticleId>
    {doi}
  </ArticleIdList></PubmedData>
</PubmedArticle></PubmedArticleSet>"#
    )
}

pub const EMPTY_EFETCH: &str = r#"<?xml version="1.0"?><PubmedArticleSet></PubmedArticleSet>"#;

/// CSL JSON as served by the DOI registry
pub fn csl_json(doi: &str, title: &str) -> String {
    serde_json::json!({
        "type": "article-journal",
        "DOI": doi,
        "title": title,
        "container-title": "PLoS ONE",
        "issued": {"date-parts": [[2011, 8, 4]]}
    })
    .to_string()
}

pub fn esummary_json(pmcid: &str, title: &str) -> String {
    serde_json::json!({
        "header": {"type": "esummary", "version": "0.3"},
        "result": {
            "uids": [pmcid],
            pmcid: {
                "uid": pmcid,
                "title": title,
                "pubdate": "2011 Aug 4",
                "fulljournalname": "PloS one",
                "authors": [{"name": "Smith J", "authtype": "Author"}],
                "articleids": []
            }
        }
    })
    .to_string()
}

/// ID converter reply with one record
pub fn idconv_json(requested: &str, doi: Option<&str>, pmid: Option<&str>, pmcid: Option<&str>) -> String {
    let mut record = serde_json::json!({ "requested-id": requested });
    if let Some(doi) = doi {
        record["doi"] = doi.into();
    }
    if let Some(pmid) = pmid {
        record["pmid"] = pmid.into();
    }
    if let Some(pmcid) = pmcid {
        record["pmcid"] = pmcid.into();
    }
    serde_json::json!({ "status": "ok", "records": [record] }).to_string()
}

pub fn idconv_not_found(requested: &str) -> String {
    serde_json::json!({
        "status": "ok",
        "records": [{"requested-id": requested, "status": "error", "errmsg": "invalid article id"}]
    })
    .to_string()
}
