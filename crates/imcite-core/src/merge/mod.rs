//! Merge raw source records into one canonical record

pub mod priority;

pub use priority::*;

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use imcite_domain::{
    Candidate, CanonicalField, CanonicalRecord, Field, FieldValue, IdOrigin,
    IdentifierKind, Origin, RawSourceRecord, ResolvedId, ResolvedIdentifiers, Source,
    SourceCitation,
};
use imcite_identifiers::{identifiers_equal, is_valid};
use thiserror::Error;

use crate::error::PipelineError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("{}", .reasons.join(", "))]
    RecordInvalid { reasons: Vec<String> },
}

impl From<MergeError> for PipelineError {
    fn from(e: MergeError) -> Self {
        PipelineError::RecordInvalid(e.to_string())
    }
}

/// Merge the fetched records of one work.
///
/// Only `Success` records contribute values. The result does not depend on
/// the order of `records`.
pub fn merge(
    resolved: &ResolvedIdentifiers,
    records: &[RawSourceRecord],
) -> Result<CanonicalRecord, MergeError> {
    let successful = successful_by_source(records);
    let mut canonical = CanonicalRecord::default();

    for field in Field::all().iter().copied() {
        let merged = match field.identifier_kind() {
            Some(kind) => merge_identifier(kind, resolved, &successful),
            None => merge_field(field, &successful),
        };
        if let Some(merged) = merged {
            canonical.fields.insert(field, merged);
        }
    }

    for (source, record) in &successful {
        if let Some(url) = &record.request_url {
            canonical.citations.insert(
                *source,
                SourceCitation {
                    url: url.clone(),
                    retrieved_on: record.retrieved_on,
                },
            );
        }
    }

    let mut reasons = Vec::new();
    if canonical.identifiers().is_empty() {
        reasons.push("no identifiers resolved".to_string());
    }
    if canonical.title().is_none() {
        reasons.push("no title".to_string());
    }
    if !reasons.is_empty() {
        return Err(MergeError::RecordInvalid { reasons });
    }

    Ok(canonical)
}

/// One successful record per source; duplicates resolve to the fullest record
fn successful_by_source(records: &[RawSourceRecord]) -> BTreeMap<Source, &RawSourceRecord> {
    let mut by_source: BTreeMap<Source, &RawSourceRecord> = BTreeMap::new();
    for record in records.iter().filter(|r| r.status.is_success()) {
        let replace = match by_source.get(&record.source) {
            Some(existing) => fullness(record) > fullness(existing),
            None => true,
        };
        if replace {
            by_source.insert(record.source, record);
        }
    }
    by_source
}

/// Total order on records of one source: more fields first, then the
/// smaller query, then the values themselves
fn fullness(
    record: &RawSourceRecord,
) -> (
    usize,
    Reverse<&str>,
    &BTreeMap<Field, FieldValue>,
    Option<&str>,
    NaiveDate,
) {
    (
        record.fields.len(),
        Reverse(record.queried_with.as_str()),
        &record.fields,
        record.request_url.as_deref(),
        record.retrieved_on,
    )
}

fn candidates(field: Field, successful: &BTreeMap<Source, &RawSourceRecord>) -> Vec<Candidate> {
    successful
        .iter()
        .filter_map(|(source, record)| {
            record.get(field).map(|value| Candidate {
                origin: Origin::Source(*source),
                value: value.clone(),
            })
        })
        .collect()
}

/// Highest-priority tier with a value wins; inside a tier the most complete
/// value wins, then the earlier source in the tier
fn choose(field: Field, candidates: &[Candidate]) -> Option<usize> {
    for tier in tiers_for(field) {
        let best = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match &c.origin {
                Origin::Source(s) => tier.iter().position(|t| t == s).map(|rank| (i, rank, c)),
                _ => None,
            })
            .min_by_key(|(_, rank, c)| (Reverse(c.value.completeness()), *rank))
            .map(|(i, _, _)| i);
        if best.is_some() {
            return best;
        }
    }
    None
}

fn alternatives(chosen: &FieldValue, candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| !c.value.same_as(chosen))
        .collect()
}

fn merge_field(field: Field, successful: &BTreeMap<Source, &RawSourceRecord>) -> Option<CanonicalField> {
    let mut all = candidates(field, successful);
    let winner = all.remove(choose(field, &all)?);
    Some(CanonicalField {
        alternatives: alternatives(&winner.value, all),
        value: winner.value,
        origin: winner.origin,
    })
}

fn merge_identifier(
    kind: IdentifierKind,
    resolved: &ResolvedIdentifiers,
    successful: &BTreeMap<Source, &RawSourceRecord>,
) -> Option<CanonicalField> {
    let field = Field::for_identifier(kind);

    // Source-reported identifiers must be well formed to compete
    let all: Vec<Candidate> = candidates(field, successful)
        .into_iter()
        .filter(|c| c.value.as_text().is_some_and(|v| is_valid(kind, v)))
        .collect();

    let Some(known) = resolved.get(kind).filter(|id| survives(kind, id)) else {
        let mut all = all;
        let winner = all.remove(choose(field, &all)?);
        return Some(CanonicalField {
            alternatives: alternatives(&winner.value, all),
            value: winner.value,
            origin: winner.origin,
        });
    };

    let (agreeing, differing): (Vec<Candidate>, Vec<Candidate>) = all.into_iter().partition(|c| {
        c.value
            .as_text()
            .is_some_and(|v| identifiers_equal(kind, v, &known.value))
    });

    // A source confirming the value becomes its origin
    let origin = match choose(field, &agreeing) {
        Some(i) => agreeing[i].origin.clone(),
        None => resolved_origin(known),
    };

    Some(CanonicalField {
        value: FieldValue::Text(known.value.clone()),
        origin,
        alternatives: differing,
    })
}

/// A known identifier survives unless it is malformed
fn survives(kind: IdentifierKind, id: &ResolvedId) -> bool {
    let valid = is_valid(kind, &id.value);
    if !valid {
        tracing::debug!(kind = %kind, value = %id.value, "malformed identifier dropped");
    }
    valid
}

fn resolved_origin(id: &ResolvedId) -> Origin {
    match &id.origin {
        IdOrigin::Caller => Origin::Caller,
        IdOrigin::Lookup {
            service,
            query,
            url,
            retrieved_on,
            ambiguous,
        } => Origin::Lookup {
            service: service.clone(),
            query: *query,
            url: url.clone(),
            retrieved_on: *retrieved_on,
            ambiguous: *ambiguous,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imcite_domain::{Identifiers, PublicationDate};

    fn caller(ids: Identifiers) -> ResolvedIdentifiers {
        ResolvedIdentifiers::from_caller(&ids)
    }

    #[test]
    fn test_registry_title_wins_and_alternatives_kept() {
        let records = vec![
            RawSourceRecord::success(Source::PubMed, "111")
                .with_field(Field::Title, FieldValue::text("A much longer PubMed title")),
            RawSourceRecord::success(Source::DoiRegistry, "10.1/abc")
                .with_field(Field::Title, FieldValue::text("Registry title")),
        ];
        let resolved = caller(Identifiers {
            doi: Some("10.1/abc".into()),
            pmid: Some("111".into()),
            pmcid: None,
        });
        let record = merge(&resolved, &records).unwrap();
        let title = record.get(Field::Title).unwrap();
        assert_eq!(title.value, FieldValue::text("Registry title"));
        assert_eq!(title.origin, Origin::Source(Source::DoiRegistry));
        assert_eq!(title.alternatives.len(), 1);
        assert_eq!(title.alternatives[0].origin, Origin::Source(Source::PubMed));
    }

    #[test]
    fn test_lower_tier_fills_gaps() {
        let records = vec![
            RawSourceRecord::success(Source::DoiRegistry, "10.1/abc")
                .with_field(Field::Title, FieldValue::text("Title")),
            RawSourceRecord::success(Source::PubMedCentral, "222")
                .with_field(Field::Volume, FieldValue::text("6")),
        ];
        let resolved = caller(Identifiers {
            doi: Some("10.1/abc".into()),
            pmid: None,
            pmcid: Some("222".into()),
        });
        let record = merge(&resolved, &records).unwrap();
        assert_eq!(record.text(Field::Volume), Some("6"));
        assert_eq!(
            record.get(Field::Volume).map(|f| &f.origin),
            Some(&Origin::Source(Source::PubMedCentral))
        );
    }

    #[test]
    fn test_equal_tier_prefers_more_complete() {
        let records = vec![
            RawSourceRecord::success(Source::PubMed, "111")
                .with_field(Field::Title, FieldValue::text("T"))
                .with_field(
                    Field::PublicationDate,
                    FieldValue::Date(PublicationDate::year(2011)),
                ),
            RawSourceRecord::success(Source::PubMedCentral, "222").with_field(
                Field::PublicationDate,
                FieldValue::Date(PublicationDate::day(2011, 8, 4)),
            ),
        ];
        let resolved = caller(Identifiers {
            doi: None,
            pmid: Some("111".into()),
            pmcid: Some("222".into()),
        });
        let record = merge(&resolved, &records).unwrap();
        assert_eq!(
            record.value(Field::PublicationDate),
            Some(&FieldValue::Date(PublicationDate::day(2011, 8, 4)))
        );
    }

    #[test]
    fn test_failed_records_do_not_contribute() {
        let mut failed = RawSourceRecord::transient(Source::DoiRegistry, "10.1/abc", "timeout");
        failed.fields.insert(Field::Title, FieldValue::text("Ghost"));
        let resolved = caller(Identifiers {
            doi: Some("10.1/abc".into()),
            ..Default::default()
        });
        let err = merge(&resolved, &[failed]).unwrap_err();
        assert_eq!(err.to_string(), "no title");
    }

    #[test]
    fn test_malformed_caller_id_is_dropped() {
        let records = vec![RawSourceRecord::permanent(
            Source::DoiRegistry,
            "bad",
            "malformed DOI: bad",
        )];
        let resolved = caller(Identifiers {
            doi: Some("bad".into()),
            ..Default::default()
        });
        let err = merge(&resolved, &records).unwrap_err();
        assert_eq!(err.to_string(), "no identifiers resolved, no title");
    }

    #[test]
    fn test_valid_caller_id_survives_source_rejection() {
        // The registry answered with something it could not parse
        let records = vec![
            RawSourceRecord::permanent(
                Source::DoiRegistry,
                "10.1234/valid.doi",
                "invalid JSON: expected value at line 1 column 1",
            ),
            RawSourceRecord::success(Source::PubMed, "111")
                .with_field(Field::Title, FieldValue::text("T")),
        ];
        let resolved = caller(Identifiers {
            doi: Some("10.1234/valid.doi".into()),
            pmid: Some("111".into()),
            pmcid: None,
        });
        let record = merge(&resolved, &records).unwrap();

        let doi = record.get(Field::Doi).unwrap();
        assert_eq!(doi.value, FieldValue::text("10.1234/valid.doi"));
        assert_eq!(doi.origin, Origin::Caller);
        assert!(record.citation(Source::DoiRegistry).is_none());
    }

    #[test]
    fn test_lookup_provenance_carried_into_record() {
        let looked_up_on = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut resolved = caller(Identifiers {
            pmid: Some("111".into()),
            ..Default::default()
        });
        resolved.doi = Some(ResolvedId {
            value: "10.1/abc".into(),
            origin: IdOrigin::Lookup {
                service: "NCBI ID Converter".into(),
                query: IdentifierKind::Pmid,
                url: "https://idconv.test/v1.0/?ids=111".into(),
                retrieved_on: looked_up_on,
                ambiguous: true,
            },
        });
        let records = vec![RawSourceRecord::success(Source::PubMed, "111")
            .with_field(Field::Title, FieldValue::text("T"))];

        let record = merge(&resolved, &records).unwrap();
        assert_eq!(
            record.get(Field::Doi).unwrap().origin,
            Origin::Lookup {
                service: "NCBI ID Converter".into(),
                query: IdentifierKind::Pmid,
                url: "https://idconv.test/v1.0/?ids=111".into(),
                retrieved_on: looked_up_on,
                ambiguous: true,
            }
        );
    }

    #[test]
    fn test_duplicate_source_records_merge_in_any_order() {
        let first = RawSourceRecord::success(Source::PubMed, "111")
            .with_field(Field::Title, FieldValue::text("First"));
        let second = RawSourceRecord::success(Source::PubMed, "111")
            .with_field(Field::Title, FieldValue::text("Second"));
        let resolved = caller(Identifiers {
            pmid: Some("111".into()),
            ..Default::default()
        });

        let forward = merge(&resolved, &[first.clone(), second.clone()]).unwrap();
        let backward = merge(&resolved, &[second, first]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_source_confirms_caller_identifier() {
        let records = vec![RawSourceRecord::success(Source::PubMed, "111")
            .with_field(Field::Title, FieldValue::text("T"))
            .with_field(Field::Pmid, FieldValue::text("111"))
            .with_field(Field::Doi, FieldValue::text("10.1/OTHER"))];
        let resolved = caller(Identifiers {
            doi: Some("10.1/abc".into()),
            pmid: Some("111".into()),
            pmcid: None,
        });
        let record = merge(&resolved, &records).unwrap();

        let pmid = record.get(Field::Pmid).unwrap();
        assert_eq!(pmid.origin, Origin::Source(Source::PubMed));

        let doi = record.get(Field::Doi).unwrap();
        assert_eq!(doi.value, FieldValue::text("10.1/abc"));
        assert_eq!(doi.origin, Origin::Caller);
        assert_eq!(doi.alternatives.len(), 1);
    }

    #[test]
    fn test_source_supplies_unresolved_identifier() {
        let records = vec![RawSourceRecord::success(Source::PubMed, "111")
            .with_field(Field::Title, FieldValue::text("T"))
            .with_field(Field::Pmcid, FieldValue::text("222"))];
        let resolved = caller(Identifiers {
            pmid: Some("111".into()),
            ..Default::default()
        });
        let record = merge(&resolved, &records).unwrap();
        assert_eq!(record.text(Field::Pmcid), Some("222"));
        assert_eq!(record.identifiers().pmid.as_deref(), Some("111"));
    }

    #[test]
    fn test_citations_from_successful_records() {
        let records = vec![
            RawSourceRecord::success(Source::PubMed, "111")
                .with_url("https://eutils.test/efetch?id=111")
                .with_field(Field::Title, FieldValue::text("T")),
            RawSourceRecord::not_found(Source::PubMedCentral, "222")
                .with_url("https://eutils.test/esummary?id=222"),
        ];
        let resolved = caller(Identifiers {
            pmid: Some("111".into()),
            pmcid: Some("222".into()),
            ..Default::default()
        });
        let record = merge(&resolved, &records).unwrap();
        assert!(record.citation(Source::PubMed).is_some());
        assert!(record.citation(Source::PubMedCentral).is_none());
    }
}
