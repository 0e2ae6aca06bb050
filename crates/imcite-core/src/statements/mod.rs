//! Statement building: canonical record → ordered graph statements
//!
//! Pure mapping, no I/O. Each generated statement cites the source that
//! supplied its value (stated in, reference URL, retrieval date).
//! Identifiers taken from the manifest carry no reference.

pub mod properties;

use imcite_domain::{
    CanonicalField, CanonicalRecord, Claim, Field, FieldValue, NewItem, Origin, PublicationDate,
    Reference, Snak, Statement, Value,
};
use thiserror::Error;

use crate::error::PipelineError;
use crate::sources::source_metadata;
use properties::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no title")]
    MissingTitle,
    #[error("no identifiers resolved")]
    MissingIdentifiers,
}

impl From<BuildError> for PipelineError {
    fn from(e: BuildError) -> Self {
        PipelineError::RecordInvalid(e.to_string())
    }
}

/// Values resolved outside the canonical record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Journal item found for the record's ISSN
    pub journal_item: Option<String>,
    /// Title language when the record's language is unknown
    pub default_language: String,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            journal_item: None,
            default_language: "en".to_string(),
        }
    }
}

/// Build the new item for a canonical record.
///
/// `extra` statements are appended verbatim after the generated ones.
pub fn build<X>(
    record: &CanonicalRecord,
    context: &BuildContext,
    extra: Vec<X>,
) -> Result<NewItem<X>, BuildError> {
    let title = record.title().ok_or(BuildError::MissingTitle)?;
    if record.identifiers().is_empty() {
        return Err(BuildError::MissingIdentifiers);
    }

    let mut statements = Vec::new();

    let work_type = record.get(Field::WorkType);
    statements.push(
        Statement::new(
            INSTANCE_OF,
            Value::Item(work_type_item(record.text(Field::WorkType)).to_string()),
        )
        .with_reference(work_type.and_then(|f| reference(record, f))),
    );

    let language = record.text(Field::Language).and_then(properties::language);
    let title_language = language
        .map(|l| l.code.to_string())
        .unwrap_or_else(|| context.default_language.clone());
    if let Some(field) = record.get(Field::Title) {
        statements.push(
            Statement::new(
                TITLE,
                Value::MonolingualText {
                    text: title.to_string(),
                    language: title_language,
                },
            )
            .with_reference(reference(record, field)),
        );
    }

    if let Some(field) = record.get(Field::Authors) {
        if let FieldValue::Names(names) = &field.value {
            let citation = reference(record, field);
            for (i, name) in names.iter().enumerate() {
                statements.push(
                    Statement::new(AUTHOR_NAME_STRING, Value::String(name.clone()))
                        .with_qualifier(Snak::new(SERIES_ORDINAL, Value::String((i + 1).to_string())))
                        .with_reference(citation.clone()),
                );
            }
        }
    }

    push_fields(&mut statements, record, IDENTIFIER_PROPERTIES);

    if let Some(journal) = &context.journal_item {
        let source_field = record.get(Field::Issn).or(record.get(Field::Journal));
        statements.push(
            Statement::new(PUBLISHED_IN, Value::Item(journal.clone()))
                .with_reference(source_field.and_then(|f| reference(record, f))),
        );
    }

    push_fields(&mut statements, record, DETAIL_PROPERTIES);

    if let (Some(language), Some(field)) = (language, record.get(Field::Language)) {
        statements.push(
            Statement::new(LANGUAGE_OF_WORK, Value::Item(language.item.to_string()))
                .with_reference(reference(record, field)),
        );
    }

    let claims = statements
        .into_iter()
        .map(Claim::Generated)
        .chain(extra.into_iter().map(Claim::Supplied))
        .collect();

    Ok(NewItem {
        label: title.to_string(),
        claims,
    })
}

/// One statement per populated single-valued field
fn push_fields(statements: &mut Vec<Statement>, record: &CanonicalRecord, table: &[(Field, &str)]) {
    for (field, property) in table {
        let Some(canonical) = record.get(*field) else {
            continue;
        };
        let value = match &canonical.value {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Date(date) => Value::Time(*date),
            FieldValue::Names(_) => continue,
        };
        statements.push(Statement::new(*property, value).with_reference(reference(record, canonical)));
    }
}

/// Reference block for the origin of a field
fn reference(record: &CanonicalRecord, field: &CanonicalField) -> Option<Reference> {
    match &field.origin {
        Origin::Caller => None,
        Origin::Source(source) => {
            let mut snaks = vec![Snak::new(
                STATED_IN,
                Value::Item(source_metadata(*source).reference_item.to_string()),
            )];
            if let Some(citation) = record.citation(*source) {
                snaks.push(Snak::new(REFERENCE_URL, Value::Url(citation.url.clone())));
                snaks.push(Snak::new(
                    RETRIEVED,
                    Value::Time(PublicationDate::from_naive(citation.retrieved_on)),
                ));
            }
            Some(Reference { snaks })
        }
        Origin::Lookup {
            url, retrieved_on, ..
        } => Some(Reference {
            snaks: vec![
                Snak::new(REFERENCE_URL, Value::Url(url.clone())),
                Snak::new(RETRIEVED, Value::Time(PublicationDate::from_naive(*retrieved_on))),
            ],
        }),
    }
}
