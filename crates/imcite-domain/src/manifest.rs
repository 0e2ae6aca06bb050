//! Manifest entries: the unit of work handed to a batch run

use serde::{Deserialize, Serialize};

use crate::identifiers::Identifiers;

/// One partially identified work plus optional caller statements.
///
/// `X` is the statement type of the graph-write client. The pipeline never
/// inspects these values; they are appended after the generated statements.
/// In JSON manifests they live under the `data` key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry<X = serde_json::Value> {
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub pmid: Option<String>,
    #[serde(default)]
    pub pmcid: Option<String>,
    #[serde(default = "Vec::new", rename = "data")]
    pub extra_statements: Vec<X>,
}

impl<X> Default for ManifestEntry<X> {
    fn default() -> Self {
        Self {
            doi: None,
            pmid: None,
            pmcid: None,
            extra_statements: Vec::new(),
        }
    }
}

impl<X> ManifestEntry<X> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_pmid(mut self, pmid: impl Into<String>) -> Self {
        self.pmid = Some(pmid.into());
        self
    }

    pub fn with_pmcid(mut self, pmcid: impl Into<String>) -> Self {
        self.pmcid = Some(pmcid.into());
        self
    }

    pub fn with_extra_statements(mut self, extra: Vec<X>) -> Self {
        self.extra_statements = extra;
        self
    }

    /// The raw identifiers as supplied, blank strings treated as absent
    pub fn identifiers(&self) -> Identifiers {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Identifiers {
            doi: clean(&self.doi),
            pmid: clean(&self.pmid),
            pmcid: clean(&self.pmcid),
        }
    }

    /// Short label for logs and outcome reports
    pub fn describe(&self) -> String {
        let ids = self.identifiers();
        let parts: Vec<String> = ids
            .present()
            .into_iter()
            .filter_map(|kind| ids.get(kind).map(|v| format!("{}:{}", kind.as_str(), v)))
            .collect();
        if parts.is_empty() {
            "<no identifiers>".to_string()
        } else {
            parts.join(" ")
        }
    }
}
