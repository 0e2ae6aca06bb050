//! Merge properties over generated source records

use imcite_core::merge;
use imcite_domain::{
    Field, FieldValue, Identifiers, PublicationDate, RawSourceRecord, ResolvedIdentifiers, Source,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Reported {
    title: Option<String>,
    authors: Vec<String>,
    volume: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
    found: bool,
}

fn reported() -> impl Strategy<Value = Reported> {
    (
        proptest::option::of("[A-Za-z ]{1,24}"),
        proptest::collection::vec("[A-Z][a-z]{1,8} [A-Z][a-z]{1,8}", 0..4),
        proptest::option::of("[1-9][0-9]{0,2}"),
        proptest::option::of(1950i32..2030),
        proptest::option::of(1u32..=12),
        proptest::bool::weighted(0.8),
    )
        .prop_map(|(title, authors, volume, year, month, found)| Reported {
            title,
            authors,
            volume,
            year,
            month,
            found,
        })
}

fn record(source: Source, queried_with: &str, reported: &Reported) -> RawSourceRecord {
    if !reported.found {
        return RawSourceRecord::not_found(source, queried_with);
    }
    let mut record = RawSourceRecord::success(source, queried_with)
        .with_url(format!("https://{}.test/{}", source.as_str(), queried_with));
    record.insert_text(Field::Title, reported.title.clone());
    record.insert_text(Field::Volume, reported.volume.clone());
    if !reported.authors.is_empty() {
        record.insert(Field::Authors, FieldValue::Names(reported.authors.clone()));
    }
    if let Some(year) = reported.year {
        let date = match reported.month {
            Some(month) => PublicationDate::month(year, month),
            None => PublicationDate::year(year),
        };
        record.insert(Field::PublicationDate, FieldValue::Date(date));
    }
    record
}

fn resolved() -> ResolvedIdentifiers {
    ResolvedIdentifiers::from_caller(&Identifiers {
        doi: Some("10.1/abc".to_string()),
        pmid: Some("111".to_string()),
        pmcid: Some("222".to_string()),
    })
}

fn records(pubmed: &Reported, pmc: &Reported, registry: &Reported) -> Vec<RawSourceRecord> {
    vec![
        record(Source::PubMed, "111", pubmed),
        record(Source::PubMedCentral, "222", pmc),
        record(Source::DoiRegistry, "10.1/abc", registry),
    ]
}

proptest! {
    #[test]
    fn merge_is_independent_of_record_order(
        pubmed in reported(),
        pmc in reported(),
        registry in reported(),
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
    ) {
        let records = records(&pubmed, &pmc, &registry);
        let shuffled: Vec<RawSourceRecord> = order.iter().map(|i| records[*i].clone()).collect();

        prop_assert_eq!(merge(&resolved(), &records), merge(&resolved(), &shuffled));
    }

    #[test]
    fn every_reported_field_survives(
        pubmed in reported(),
        pmc in reported(),
        registry in reported(),
    ) {
        let records = records(&pubmed, &pmc, &registry);
        let Ok(canonical) = merge(&resolved(), &records) else {
            // Only possible without any title
            prop_assert!(records.iter().all(|r| r.get(Field::Title).is_none()));
            return Ok(());
        };

        for record in records.iter().filter(|r| r.status.is_success()) {
            for field in record.fields.keys() {
                prop_assert!(canonical.get(*field).is_some(), "lost {}", field.as_str());
            }
        }
    }
}

#[test]
fn test_registry_title_beats_longer_pubmed_title() {
    let pubmed = Reported {
        title: Some("A much longer title from the index".into()),
        authors: vec![],
        volume: None,
        year: None,
        month: None,
        found: true,
    };
    let registry = Reported {
        title: Some("Short".into()),
        ..pubmed.clone()
    };
    let missing = Reported {
        found: false,
        ..pubmed.clone()
    };

    let canonical = merge(&resolved(), &records(&pubmed, &missing, &registry)).unwrap();
    assert_eq!(canonical.title(), Some("Short"));
    assert_eq!(canonical.get(Field::Title).unwrap().alternatives.len(), 1);
}
