//! Graph statements built from canonical records

use serde::{Deserialize, Serialize};

use crate::source::PublicationDate;

/// A statement value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Reference to another graph item, e.g. `Q1860`
    Item(String),
    String(String),
    MonolingualText { text: String, language: String },
    Time(PublicationDate),
    Url(String),
}

/// A property/value pair used for qualifiers and reference parts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snak {
    pub property: String,
    pub value: Value,
}

impl Snak {
    pub fn new(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

/// Provenance block attached to a statement
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub snaks: Vec<Snak>,
}

/// A claim about the new item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub property: String,
    pub value: Value,
    pub qualifiers: Vec<Snak>,
    pub references: Vec<Reference>,
}

impl Statement {
    pub fn new(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
            qualifiers: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: Snak) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn with_reference(mut self, reference: Option<Reference>) -> Self {
        if let Some(r) = reference {
            self.references.push(r);
        }
        self
    }
}

/// Either a generated statement or an opaque caller-supplied one
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Claim<X> {
    Generated(Statement),
    Supplied(X),
}

impl<X> Claim<X> {
    pub fn as_generated(&self) -> Option<&Statement> {
        match self {
            Claim::Generated(s) => Some(s),
            Claim::Supplied(_) => None,
        }
    }
}

/// Everything the graph writer needs to create one item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewItem<X> {
    pub label: String,
    pub claims: Vec<Claim<X>>,
}

impl<X> NewItem<X> {
    pub fn generated(&self) -> impl Iterator<Item = &Statement> {
        self.claims.iter().filter_map(Claim::as_generated)
    }

    /// Generated statements for one property, in order
    pub fn statements_for<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a Statement> {
        self.generated().filter(move |s| s.property == property)
    }
}
