//! Static field → source priority table
//!
//! Each row lists tiers in order; sources inside one tier compete on
//! completeness. Every row names all three sources so that a field reported
//! by any successful source is never dropped.

use imcite_domain::{Field, Source};

pub type Tiers = &'static [&'static [Source]];

/// The registry of record first, then the NCBI sources as equals
const REGISTRY_FIRST: Tiers = &[
    &[Source::DoiRegistry],
    &[Source::PubMed, Source::PubMedCentral],
];

const PUBMED_FIRST: Tiers = &[
    &[Source::PubMed],
    &[Source::PubMedCentral],
    &[Source::DoiRegistry],
];

const PMC_FIRST: Tiers = &[
    &[Source::PubMedCentral],
    &[Source::PubMed],
    &[Source::DoiRegistry],
];

pub struct FieldPriority {
    pub field: Field,
    pub tiers: Tiers,
}

pub const PRIORITY_TABLE: &[FieldPriority] = &[
    FieldPriority { field: Field::Title, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Authors, tiers: PUBMED_FIRST },
    FieldPriority { field: Field::Journal, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Issn, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Volume, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Issue, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Pages, tiers: PUBMED_FIRST },
    FieldPriority { field: Field::PublicationDate, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Language, tiers: PUBMED_FIRST },
    FieldPriority { field: Field::WorkType, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Doi, tiers: REGISTRY_FIRST },
    FieldPriority { field: Field::Pmid, tiers: PUBMED_FIRST },
    FieldPriority { field: Field::Pmcid, tiers: PMC_FIRST },
];

pub fn tiers_for(field: Field) -> Tiers {
    PRIORITY_TABLE
        .iter()
        .find(|row| row.field == field)
        .map(|row| row.tiers)
        .unwrap_or(PUBMED_FIRST)
}
