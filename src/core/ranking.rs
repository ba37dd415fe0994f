use crate::domain::model::{Document, ParticipantCount, SharedParticipants};
use crate::utils::error::{EtlError, Result};
use std::collections::{BTreeSet, HashMap};

/// 計算每位參與者出現在幾份文件中（每份文件最多算一次）
pub fn rank_participants<'a, I>(documents: I) -> Vec<ParticipantCount>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for document in documents {
        let distinct: BTreeSet<&str> = document.participants.iter().map(String::as_str).collect();
        for participant in distinct {
            *counts.entry(participant).or_insert(0) += 1;
        }
    }

    let mut ranking: Vec<ParticipantCount> = counts
        .into_iter()
        .map(|(participant, count)| ParticipantCount {
            participant: participant.to_string(),
            count,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.participant.cmp(&b.participant))
    });
    ranking
}

/// 找出與參考文件共用至少一位參與者的其他文件，依輸入順序。
///
/// `reference` 先比對識別碼，再比對標題；結果不含參考文件本身。
pub fn find_sharing(documents: &[Document], reference: &str) -> Result<Vec<SharedParticipants>> {
    let target_index = documents
        .iter()
        .position(|d| d.id == reference)
        .or_else(|| {
            documents
                .iter()
                .position(|d| d.title.as_deref() == Some(reference))
        })
        .ok_or_else(|| EtlError::ReferenceNotFound {
            reference: reference.to_string(),
        })?;
    let target = &documents[target_index];

    let wanted: BTreeSet<&str> = target.participants.iter().map(String::as_str).collect();
    tracing::debug!(
        "Looking up documents sharing participants with {} ({} participants)",
        target.id,
        wanted.len()
    );

    let matches = documents
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != target_index)
        .filter_map(|(_, d)| {
            let shared: BTreeSet<&str> = d
                .participants
                .iter()
                .map(String::as_str)
                .filter(|p| wanted.contains(p))
                .collect();
            if shared.is_empty() {
                None
            } else {
                Some(SharedParticipants {
                    document_id: d.id.clone(),
                    title: d.title.clone(),
                    shared: shared.into_iter().map(str::to_string).collect(),
                })
            }
        })
        .collect();

    Ok(matches)
}
