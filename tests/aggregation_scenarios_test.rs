use costar_etl::core::documents::{parse_json_lines, records_from_values};
use costar_etl::domain::settings::InvalidDocumentPolicy;
use costar_etl::{aggregate, CountResult, Document, EtlError, PairAggregator, UnorderedPair};
use std::collections::BTreeSet;

fn doc(id: &str, participants: &[&str]) -> Document {
    Document::new(id, participants.iter().copied())
}

fn expect(first: &str, second: &str, count: u64) -> CountResult {
    CountResult {
        pair: UnorderedPair::new(first, second).unwrap(),
        count,
    }
}

/// 所有計數總和等於每份文件 C(不重複參與者數, 2) 的總和
fn assert_invariants(documents: &[Document], results: &[CountResult]) {
    let expected: u64 = documents
        .iter()
        .map(|d| {
            let n = d.participants.iter().collect::<BTreeSet<_>>().len() as u64;
            n * n.saturating_sub(1) / 2
        })
        .sum();
    assert_eq!(results.iter().map(|r| r.count).sum::<u64>(), expected);

    for r in results {
        assert!(r.pair.first() < r.pair.second(), "pair {} not canonical", r.pair);
    }
    for w in results.windows(2) {
        assert!(
            w[0].count > w[1].count || (w[0].count == w[1].count && w[0].pair < w[1].pair),
            "{} before {} breaks ordering",
            w[0].pair,
            w[1].pair
        );
    }
}

#[test]
fn test_single_document_three_participants() {
    let docs = vec![doc("1", &["A", "B", "C"])];
    let results = aggregate(&docs);
    assert_eq!(
        results,
        vec![expect("A", "B", 1), expect("A", "C", 1), expect("B", "C", 1)]
    );
    assert_invariants(&docs, &results);
}

#[test]
fn test_repeated_pair_ranks_first() {
    let docs = vec![
        doc("1", &["A", "B"]),
        doc("2", &["A", "B"]),
        doc("3", &["B", "C"]),
    ];
    let results = aggregate(&docs);
    assert_eq!(results, vec![expect("A", "B", 2), expect("B", "C", 1)]);
    assert_invariants(&docs, &results);
}

#[test]
fn test_duplicates_inside_document() {
    let docs = vec![doc("1", &["A", "A", "B"])];
    assert_eq!(aggregate(&docs), vec![expect("A", "B", 1)]);
}

#[test]
fn test_degenerate_inputs() {
    assert!(aggregate(&[doc("1", &[]), doc("2", &["A"])]).is_empty());
    assert!(aggregate(&Vec::<Document>::new()).is_empty());
}

#[test]
fn test_larger_collection_keeps_invariants() {
    let cast = ["Ava", "Ben", "Cid", "Dee", "Eve", "Fay", "Gus"];
    let docs: Vec<Document> = (0..40)
        .map(|i| {
            let members: Vec<&str> = cast
                .iter()
                .enumerate()
                .filter(|(j, _)| (i * 7 + j * 3) % 5 < 2 || (i + j) % 4 == 0)
                .map(|(_, name)| *name)
                .collect();
            doc(&i.to_string(), &members)
        })
        .collect();

    let results = aggregate(&docs);
    assert_invariants(&docs, &results);
}

#[test]
fn test_streaming_from_json_lines() {
    let input = br#"{"_id": {"$oid": "a"}, "cast": ["Fred Ott", "John Ott"]}
{"_id": {"$oid": "b"}, "cast": ["John Ott", "Fred Ott", "Fred Ott"]}
{"_id": {"$oid": "c"}}
{"_id": {"$oid": "d"}, "cast": ["Annabelle Whitford"]}
"#;

    let values = parse_json_lines(input).unwrap();
    let extracted = records_from_values(values, InvalidDocumentPolicy::Abort).unwrap();
    assert_eq!(extracted.skipped, 0);

    let mut aggregator = PairAggregator::new();
    for record in &extracted.records {
        aggregator
            .ingest_record(record, "cast", InvalidDocumentPolicy::Abort)
            .unwrap();
    }
    let report = aggregator.finish();

    assert_eq!(report.documents_seen, 4);
    assert_eq!(report.total_contributions, 2);
    assert_eq!(report.results, vec![expect("Fred Ott", "John Ott", 2)]);
}

#[test]
fn test_invalid_participant_field_aborts_by_default() {
    let values = parse_json_lines(
        br#"{"id": 1, "cast": ["A", "B"]}
{"id": 2, "cast": 17}
"#,
    )
    .unwrap();
    let extracted = records_from_values(values, InvalidDocumentPolicy::default()).unwrap();

    let mut aggregator = PairAggregator::new();
    let result: Result<Vec<_>, EtlError> = extracted
        .records
        .iter()
        .map(|record| aggregator.ingest_record(record, "cast", InvalidDocumentPolicy::default()))
        .collect();
    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, EtlError::InvalidDocument { ref document_id, .. } if document_id == "2"));
}

#[test]
fn test_skipped_source_entries_do_not_shift_fallback_ids() {
    let values = parse_json_lines(
        br#""not a document"
{"cast": ["A", "B"]}
{"cast": 17}
"#,
    )
    .unwrap();
    let extracted = records_from_values(values, InvalidDocumentPolicy::Skip).unwrap();
    assert_eq!(extracted.skipped, 1);

    let mut aggregator = PairAggregator::new();
    let mut ids = Vec::new();
    for record in &extracted.records {
        match aggregator.ingest_record(record, "cast", InvalidDocumentPolicy::Abort) {
            Ok(Some(document)) => ids.push(document.id),
            Ok(None) => unreachable!("abort never skips"),
            Err(EtlError::InvalidDocument { document_id, .. }) => ids.push(format!("bad {}", document_id)),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(ids, vec!["#1", "bad #2"]);
}
