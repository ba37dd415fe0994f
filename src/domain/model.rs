use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 從資料來源讀入、尚未驗證的原始文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
    /// 在來源中的位置（被略過的項目也算在內）
    #[serde(default)]
    pub position: usize,
}

impl Record {
    pub fn from_object(obj: serde_json::Map<String, serde_json::Value>, position: usize) -> Self {
        Self {
            data: obj.into_iter().collect(),
            position,
        }
    }

    /// 取得文件識別碼：`_id`（支援 `{"$oid": ...}`）優先，其次 `id`
    pub fn identifier(&self) -> Option<String> {
        self.data
            .get("_id")
            .or_else(|| self.data.get("id"))
            .and_then(value_as_identifier)
    }

    /// 識別碼，沒有時以 `#<來源位置>` 代替
    pub fn document_id(&self) -> String {
        self.identifier()
            .unwrap_or_else(|| format!("#{}", self.position))
    }
}

/// extract 階段的輸出：可用的原始文件，以及在來源中就已略過的項目數
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecords {
    pub records: Vec<Record>,
    pub skipped: usize,
}

fn value_as_identifier(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Object(obj) => obj
            .get("$oid")
            .and_then(|oid| oid.as_str())
            .map(str::to_string),
        _ => None,
    }
}

/// 一份文件：識別碼加上參與者清單（清單可能缺少或為空）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Document {
    pub fn new<I, S>(id: impl Into<String>, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            title: None,
            participants: participants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// 將原始文件轉為 `Document`。
    ///
    /// 參與者欄位缺少或為 `null` 時視為空清單；存在但不是字串陣列時回傳
    /// `InvalidDocument`。
    pub fn from_record(record: &Record, field: &str) -> Result<Self> {
        let id = record.document_id();
        let title = record
            .data
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let participants = match record.data.get(field) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => {
                let mut participants = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(name) => participants.push(name.to_string()),
                        None => {
                            return Err(EtlError::InvalidDocument {
                                document_id: id,
                                reason: format!(
                                    "field '{}' contains a non-string element: {}",
                                    field, item
                                ),
                            })
                        }
                    }
                }
                participants
            }
            Some(other) => {
                return Err(EtlError::InvalidDocument {
                    document_id: id,
                    reason: format!("field '{}' is not a list (found {})", field, json_kind(other)),
                })
            }
        };

        Ok(Self {
            id,
            title,
            participants,
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// 兩個不同參與者的無序配對，依字典序正規化 (`first < second`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UnorderedPair {
    first: String,
    second: String,
}

impl UnorderedPair {
    /// 兩者相同時回傳 `None`
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a,
                second: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b,
                second: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for UnorderedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountResult {
    #[serde(flatten)]
    pub pair: UnorderedPair,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantCount {
    pub participant: String,
    pub count: u64,
}

/// 與參考文件共用參與者的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedParticipants {
    pub document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub shared: Vec<String>,
}

/// 配對聚合的結果與統計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    pub results: Vec<CountResult>,
    pub documents_seen: usize,
    pub documents_skipped: usize,
    pub total_contributions: u64,
}

impl AggregationReport {
    /// 只保留前 k 筆；k 為 0 表示全部
    pub fn top_k(mut self, k: usize) -> Self {
        if k > 0 {
            self.results.truncate(k);
        }
        self
    }
}

/// 轉換階段的輸出，交給 load 階段寫出
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub report: AggregationReport,
    pub participant_ranking: Option<Vec<ParticipantCount>>,
    pub shared: Option<Vec<SharedParticipants>>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
