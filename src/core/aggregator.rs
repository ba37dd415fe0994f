//! 共同出現配對的聚合。
//!
//! 對每份文件取出不重複的參與者集合，產生所有無序配對 (n 人產生 n·(n−1)/2 對)，
//! 累加到以正規化配對為鍵的計數表；全部處理完才排序，因為排序需要全域計數。

use crate::core::documents::reject;
use crate::domain::model::{AggregationReport, CountResult, Document, Record, UnorderedPair};
use crate::domain::settings::InvalidDocumentPolicy;
use crate::utils::error::{EtlError, Result};
use std::collections::{BTreeSet, HashMap};

/// 逐份文件累加的配對計數器，可直接接在資料庫游標之類的串流來源後面
#[derive(Debug, Default)]
pub struct PairAggregator {
    counts: HashMap<UnorderedPair, u64>,
    documents_seen: usize,
    documents_skipped: usize,
    total_contributions: u64,
}

impl PairAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, document: &Document) {
        self.documents_seen += 1;

        // 同一份文件中重複出現的參與者只算一次；BTreeSet 同時給出字典序
        let distinct: Vec<&str> = document
            .participants
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for (i, first) in distinct.iter().enumerate() {
            for second in &distinct[i + 1..] {
                if let Some(pair) = UnorderedPair::new(*first, *second) {
                    *self.counts.entry(pair).or_insert(0) += 1;
                    self.total_contributions += 1;
                }
            }
        }

        tracing::trace!(
            "Document {} contributed {} distinct participants",
            document.id,
            distinct.len()
        );
    }

    /// 驗證原始文件後累加。參與者欄位格式錯誤時依政策中止，或記為略過並回傳 `None`。
    pub fn ingest_record(
        &mut self,
        record: &Record,
        field: &str,
        policy: InvalidDocumentPolicy,
    ) -> Result<Option<Document>> {
        match Document::from_record(record, field) {
            Ok(document) => {
                self.ingest(&document);
                Ok(Some(document))
            }
            Err(err @ EtlError::InvalidDocument { .. }) => {
                reject(err, policy)?;
                self.record_skipped(1);
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// 記錄因格式錯誤而略過的文件數
    pub fn record_skipped(&mut self, count: usize) {
        self.documents_skipped += count;
    }

    pub fn distinct_pairs(&self) -> usize {
        self.counts.len()
    }

    /// 依計數遞減排序，同分時依配對字典序遞增
    pub fn finish(self) -> AggregationReport {
        let mut results: Vec<CountResult> = self
            .counts
            .into_iter()
            .map(|(pair, count)| CountResult { pair, count })
            .collect();

        results.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pair.cmp(&b.pair)));

        AggregationReport {
            results,
            documents_seen: self.documents_seen,
            documents_skipped: self.documents_skipped,
            total_contributions: self.total_contributions,
        }
    }
}

/// 一次性聚合已經在記憶體中的文件
pub fn aggregate<'a, I>(documents: I) -> Vec<CountResult>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut aggregator = PairAggregator::new();
    for document in documents {
        aggregator.ingest(document);
    }
    aggregator.finish().results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::records_from_values;
    use serde_json::json;

    fn doc(id: &str, participants: &[&str]) -> Document {
        Document::new(id, participants.iter().copied())
    }

    fn as_tuples(results: &[CountResult]) -> Vec<(&str, &str, u64)> {
        results
            .iter()
            .map(|r| (r.pair.first(), r.pair.second(), r.count))
            .collect()
    }

    fn choose_two(n: usize) -> u64 {
        (n * n.saturating_sub(1) / 2) as u64
    }

    #[test]
    fn test_three_participants_emit_canonical_order() {
        let docs = vec![doc("1", &["C", "A", "B"])];
        let results = aggregate(&docs);
        assert_eq!(
            as_tuples(&results),
            vec![("A", "B", 1), ("A", "C", 1), ("B", "C", 1)]
        );
    }

    #[test]
    fn test_counts_sorted_descending() {
        let docs = vec![
            doc("1", &["A", "B"]),
            doc("2", &["B", "A"]),
            doc("3", &["B", "C"]),
        ];
        let results = aggregate(&docs);
        assert_eq!(as_tuples(&results), vec![("A", "B", 2), ("B", "C", 1)]);
    }

    #[test]
    fn test_duplicate_participants_count_once() {
        let docs = vec![doc("1", &["A", "A", "B"])];
        let results = aggregate(&docs);
        assert_eq!(as_tuples(&results), vec![("A", "B", 1)]);
    }

    #[test]
    fn test_small_documents_contribute_nothing() {
        let docs = vec![doc("1", &[]), doc("2", &["A"]), doc("3", &["B", "B"])];
        assert!(aggregate(&docs).is_empty());
        assert!(aggregate(&Vec::<Document>::new()).is_empty());
    }

    #[test]
    fn test_report_statistics_match_pair_contributions() {
        let docs = vec![
            doc("1", &["A", "B", "C", "D"]),
            doc("2", &["A", "B", "A"]),
            doc("3", &["E"]),
            doc("4", &["C", "D", "E"]),
        ];

        let mut aggregator = PairAggregator::new();
        for d in &docs {
            aggregator.ingest(d);
        }
        aggregator.record_skipped(1);
        let report = aggregator.finish();

        let expected: u64 = docs
            .iter()
            .map(|d| {
                let distinct: BTreeSet<&String> = d.participants.iter().collect();
                choose_two(distinct.len())
            })
            .sum();

        assert_eq!(report.total_contributions, expected);
        assert_eq!(report.results.iter().map(|r| r.count).sum::<u64>(), expected);
        assert_eq!(report.documents_seen, 4);
        assert_eq!(report.documents_skipped, 1);
    }

    #[test]
    fn test_ordering_invariants() {
        let docs = vec![
            doc("1", &["Zoe", "Adam", "Mia"]),
            doc("2", &["Mia", "Zoe"]),
            doc("3", &["Adam", "Bob", "Mia", "Zoe"]),
            doc("4", &["Bob", "Adam"]),
        ];
        let results = aggregate(&docs);

        for r in &results {
            assert!(r.pair.first() < r.pair.second());
            assert!(r.count >= 1);
        }
        for window in results.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            assert!(a.count > b.count || (a.count == b.count && a.pair < b.pair));
        }
        assert_eq!(
            as_tuples(&results[..2]),
            vec![("Mia", "Zoe", 3), ("Adam", "Bob", 2)]
        );
    }

    #[test]
    fn test_top_k_truncates() {
        let docs = vec![doc("1", &["A", "B", "C"]), doc("2", &["A", "B"])];
        let mut aggregator = PairAggregator::new();
        docs.iter().for_each(|d| aggregator.ingest(d));
        assert_eq!(aggregator.distinct_pairs(), 3);

        let report = aggregator.finish();
        assert_eq!(report.clone().top_k(0).results.len(), 3);

        let top = report.top_k(1);
        assert_eq!(as_tuples(&top.results), vec![("A", "B", 2)]);
        assert_eq!(top.total_contributions, 4);
    }

    #[test]
    fn test_ingest_record_abort_reports_document() {
        let extracted = records_from_values(
            vec![
                json!({"id": "ok", "cast": ["A", "B"]}),
                json!({"id": "bad", "cast": "A, B"}),
            ],
            InvalidDocumentPolicy::Abort,
        )
        .unwrap();

        let mut aggregator = PairAggregator::new();
        let first = aggregator
            .ingest_record(&extracted.records[0], "cast", InvalidDocumentPolicy::Abort)
            .unwrap();
        assert_eq!(first.map(|d| d.id), Some("ok".to_string()));

        let err = aggregator
            .ingest_record(&extracted.records[1], "cast", InvalidDocumentPolicy::Abort)
            .unwrap_err();
        match err {
            EtlError::InvalidDocument { document_id, .. } => assert_eq!(document_id, "bad"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ingest_record_skip_counts() {
        let extracted = records_from_values(
            vec![
                json!({"id": "ok", "cast": ["A", "B"]}),
                json!({"id": "bad", "cast": {"lead": "A"}}),
                json!({"id": "none"}),
            ],
            InvalidDocumentPolicy::Skip,
        )
        .unwrap();

        let mut aggregator = PairAggregator::new();
        let mut kept = Vec::new();
        for record in &extracted.records {
            if let Some(document) = aggregator
                .ingest_record(record, "cast", InvalidDocumentPolicy::Skip)
                .unwrap()
            {
                kept.push(document.id);
            }
        }

        assert_eq!(kept, vec!["ok", "none"]);
        let report = aggregator.finish();
        assert_eq!(report.documents_seen, 2);
        assert_eq!(report.documents_skipped, 1);
        assert_eq!(as_tuples(&report.results), vec![("A", "B", 1)]);
    }

    #[test]
    fn test_invalid_document_after_skipped_entry_keeps_source_position() {
        let extracted =
            records_from_values(vec![json!("junk"), json!({"cast": 5})], InvalidDocumentPolicy::Skip)
                .unwrap();
        assert_eq!(extracted.skipped, 1);

        let mut aggregator = PairAggregator::new();
        let err = aggregator
            .ingest_record(&extracted.records[0], "cast", InvalidDocumentPolicy::Abort)
            .unwrap_err();
        assert!(matches!(err, EtlError::InvalidDocument { ref document_id, .. } if document_id == "#1"));
    }
}
