//! Work identifiers and where they came from

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The identifier types a manifest entry can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum IdentifierKind {
    /// Digital Object Identifier
    Doi,
    /// PubMed identifier
    Pmid,
    /// PubMed Central identifier, stored without the `PMC` prefix
    Pmcid,
}

impl IdentifierKind {
    /// All kinds, in resolution order
    pub fn all() -> &'static [IdentifierKind] {
        &[
            IdentifierKind::Doi,
            IdentifierKind::Pmid,
            IdentifierKind::Pmcid,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "doi",
            IdentifierKind::Pmid => "pmid",
            IdentifierKind::Pmcid => "pmcid",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "DOI",
            IdentifierKind::Pmid => "PMID",
            IdentifierKind::Pmcid => "PMCID",
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A DOI / PMID / PMCID triple, any of which may be absent
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Identifiers {
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub pmcid: Option<String>,
}

impl Identifiers {
    /// Check if all identifiers are empty
    pub fn is_empty(&self) -> bool {
        self.doi.is_none() && self.pmid.is_none() && self.pmcid.is_none()
    }

    /// Check if every identifier is known
    pub fn is_complete(&self) -> bool {
        self.doi.is_some() && self.pmid.is_some() && self.pmcid.is_some()
    }

    pub fn get(&self, kind: IdentifierKind) -> Option<&str> {
        match kind {
            IdentifierKind::Doi => self.doi.as_deref(),
            IdentifierKind::Pmid => self.pmid.as_deref(),
            IdentifierKind::Pmcid => self.pmcid.as_deref(),
        }
    }

    pub fn set(&mut self, kind: IdentifierKind, value: Option<String>) {
        match kind {
            IdentifierKind::Doi => self.doi = value,
            IdentifierKind::Pmid => self.pmid = value,
            IdentifierKind::Pmcid => self.pmcid = value,
        }
    }

    /// Kinds that are currently absent
    pub fn missing(&self) -> Vec<IdentifierKind> {
        IdentifierKind::all()
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    /// Kinds that are currently known
    pub fn present(&self) -> Vec<IdentifierKind> {
        IdentifierKind::all()
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }
}

/// How an identifier became known for a work
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdOrigin {
    /// Supplied in the manifest entry
    Caller,
    /// Found by a cross-reference lookup
    Lookup {
        /// Name of the lookup service
        service: String,
        /// The identifier kind the lookup was keyed on
        query: IdentifierKind,
        /// The exact request URL, kept for statement references
        url: String,
        /// Day the lookup answered
        retrieved_on: NaiveDate,
        /// More than one candidate came back; the first exact match was kept
        ambiguous: bool,
    },
}

/// A single resolved identifier value with its provenance note
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedId {
    pub value: String,
    pub origin: IdOrigin,
}

impl ResolvedId {
    pub fn from_caller(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: IdOrigin::Caller,
        }
    }
}

/// Result of identifier resolution for one work
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedIdentifiers {
    pub doi: Option<ResolvedId>,
    pub pmid: Option<ResolvedId>,
    pub pmcid: Option<ResolvedId>,
}

impl ResolvedIdentifiers {
    /// Wrap caller-supplied identifiers without any lookups
    pub fn from_caller(ids: &Identifiers) -> Self {
        Self {
            doi: ids.doi.clone().map(ResolvedId::from_caller),
            pmid: ids.pmid.clone().map(ResolvedId::from_caller),
            pmcid: ids.pmcid.clone().map(ResolvedId::from_caller),
        }
    }

    pub fn get(&self, kind: IdentifierKind) -> Option<&ResolvedId> {
        match kind {
            IdentifierKind::Doi => self.doi.as_ref(),
            IdentifierKind::Pmid => self.pmid.as_ref(),
            IdentifierKind::Pmcid => self.pmcid.as_ref(),
        }
    }

    pub fn set(&mut self, kind: IdentifierKind, value: ResolvedId) {
        match kind {
            IdentifierKind::Doi => self.doi = Some(value),
            IdentifierKind::Pmid => self.pmid = Some(value),
            IdentifierKind::Pmcid => self.pmcid = Some(value),
        }
    }

    /// Plain identifier values without provenance
    pub fn values(&self) -> Identifiers {
        Identifiers {
            doi: self.doi.as_ref().map(|id| id.value.clone()),
            pmid: self.pmid.as_ref().map(|id| id.value.clone()),
            pmcid: self.pmcid.as_ref().map(|id| id.value.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}
