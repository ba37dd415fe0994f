//! 原始資料 → `Record` 的解析、來源層級的驗證與過濾。

use crate::domain::model::{ExtractedRecords, Record};
use crate::domain::settings::{DocumentFilter, InvalidDocumentPolicy};
use crate::utils::error::{EtlError, Result};

/// 解析 JSON Lines：每行一個 JSON 值，空白行忽略
pub fn parse_json_lines(bytes: &[u8]) -> Result<Vec<serde_json::Value>> {
    let content = std::str::from_utf8(bytes).map_err(|e| EtlError::SourceError {
        message: format!("input is not valid UTF-8: {}", e),
    })?;

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(EtlError::from))
        .collect()
}

/// 解析一個 JSON 陣列；單一物件視為只有一份文件
pub fn parse_json_array(bytes: &[u8]) -> Result<Vec<serde_json::Value>> {
    match serde_json::from_slice(bytes)? {
        serde_json::Value::Array(items) => Ok(items),
        single @ serde_json::Value::Object(_) => Ok(vec![single]),
        other => Err(EtlError::SourceError {
            message: format!("expected a JSON array of documents, got {}", other),
        }),
    }
}

/// 將 JSON 值轉成 `Record`。不是物件的值屬於格式錯誤的文件，依政策處理。
///
/// 每筆 `Record` 記住自己在來源中的位置，略過的項目不會讓後面的位置位移。
pub fn records_from_values(
    values: Vec<serde_json::Value>,
    policy: InvalidDocumentPolicy,
) -> Result<ExtractedRecords> {
    let mut extracted = ExtractedRecords {
        records: Vec::with_capacity(values.len()),
        skipped: 0,
    };

    for (position, value) in values.into_iter().enumerate() {
        match value {
            serde_json::Value::Object(obj) => {
                extracted.records.push(Record::from_object(obj, position))
            }
            other => {
                let err = EtlError::InvalidDocument {
                    document_id: format!("#{}", position),
                    reason: format!("expected a JSON object, got {}", other),
                };
                reject(err, policy)?;
                extracted.skipped += 1;
            }
        }
    }

    Ok(extracted)
}

/// `Abort` 時把錯誤往上傳；`Skip` 時記一筆警告
pub(crate) fn reject(err: EtlError, policy: InvalidDocumentPolicy) -> Result<()> {
    match policy {
        InvalidDocumentPolicy::Abort => Err(err),
        InvalidDocumentPolicy::Skip => {
            tracing::warn!("⚠️ Skipping document: {}", err);
            Ok(())
        }
    }
}

impl DocumentFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match record.data.get(&self.field) {
            Some(value @ serde_json::Value::Array(items)) => {
                items.contains(&self.value) || value == &self.value
            }
            Some(value) => value == &self.value,
            None => false,
        }
    }
}
