//! Landing-page URLs for identifiers

use imcite_domain::IdentifierKind;

pub fn identifier_url_prefix(kind: IdentifierKind) -> &'static str {
    match kind {
        IdentifierKind::Doi => "https://doi.org/",
        IdentifierKind::Pmid => "https://pubmed.ncbi.nlm.nih.gov/",
        IdentifierKind::Pmcid => "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC",
    }
}

pub fn identifier_url(kind: IdentifierKind, value: &str) -> String {
    format!("{}{}", identifier_url_prefix(kind), value)
}
