use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 文件來源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// mongoexport 預設輸出：每行一個 JSON 物件
    #[default]
    Jsonl,
    /// 一個 JSON 物件陣列
    Json,
    /// 回傳 JSON 陣列的 HTTP 端點
    Http,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(SourceKind::Jsonl),
            "json" => Ok(SourceKind::Json),
            "http" | "https" | "api" => Ok(SourceKind::Http),
            other => Err(format!(
                "unknown source '{}', expected one of: jsonl, json, http",
                other
            )),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Jsonl => write!(f, "jsonl"),
            SourceKind::Json => write!(f, "json"),
            SourceKind::Http => write!(f, "http"),
        }
    }
}

/// 參與者欄位格式錯誤時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidDocumentPolicy {
    /// 中止整個聚合；略過會讓計數失真，所以是預設值
    #[default]
    Abort,
    /// 記錄警告並繼續
    Skip,
}

impl FromStr for InvalidDocumentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(InvalidDocumentPolicy::Abort),
            "skip" => Ok(InvalidDocumentPolicy::Skip),
            other => Err(format!(
                "unknown policy '{}', expected 'abort' or 'skip'",
                other
            )),
        }
    }
}

impl fmt::Display for InvalidDocumentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidDocumentPolicy::Abort => write!(f, "abort"),
            InvalidDocumentPolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unsupported format '{}', valid formats: csv, tsv, json",
                other
            )),
        }
    }
}

/// `$match` 風格的前置過濾：欄位等於該值，或欄位為陣列且包含該值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub field: String,
    pub value: serde_json::Value,
}
