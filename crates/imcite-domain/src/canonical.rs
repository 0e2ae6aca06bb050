//! Canonical records: merged bibliographic truth with provenance

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identifiers::{IdentifierKind, Identifiers};
use crate::source::{Field, FieldValue, Source};

/// Where a canonical field value came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Taken from a successful source record
    Source(Source),
    /// Given in the manifest entry
    Caller,
    /// Found by a cross-reference lookup
    Lookup {
        service: String,
        /// The identifier kind the lookup was keyed on
        query: IdentifierKind,
        url: String,
        retrieved_on: NaiveDate,
        /// Several candidates came back for the query
        ambiguous: bool,
    },
}

/// A value that was considered but not chosen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub origin: Origin,
    pub value: FieldValue,
}

/// A merged field with its provenance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalField {
    pub value: FieldValue,
    pub origin: Origin,
    /// Differing values from other origins, kept for auditing
    pub alternatives: Vec<Candidate>,
}

/// How to cite a source in statement references
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub url: String,
    pub retrieved_on: NaiveDate,
}

/// The reconciled metadata for one work
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub fields: BTreeMap<Field, CanonicalField>,
    /// Reference data for every source that contributed
    pub citations: BTreeMap<Source, SourceCitation>,
}

impl CanonicalRecord {
    pub fn get(&self, field: Field) -> Option<&CanonicalField> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field).map(|f| &f.value)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.value(field).and_then(FieldValue::as_text)
    }

    pub fn title(&self) -> Option<&str> {
        self.text(Field::Title)
    }

    pub fn identifiers(&self) -> Identifiers {
        let mut ids = Identifiers::default();
        for kind in IdentifierKind::all() {
            ids.set(
                *kind,
                self.text(Field::for_identifier(*kind)).map(str::to_string),
            );
        }
        ids
    }

    pub fn citation(&self, source: Source) -> Option<&SourceCitation> {
        self.citations.get(&source)
    }
}
