pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::settings::{DocumentFilter, InvalidDocumentPolicy, OutputFormat, SourceKind};
#[cfg(feature = "cli")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// `$match` 的值優先當成 JSON 解析（數字、布林），否則視為字串
pub fn parse_match_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "costar-etl")]
#[command(about = "Rank pairs of participants that appear together in the same documents")]
pub struct CliConfig {
    /// Input file (relative to the working directory) or URL
    #[arg(long, short)]
    pub input: String,

    /// Input format: jsonl, json or http
    #[arg(long, default_value = "jsonl")]
    pub source: SourceKind,

    /// Document field holding the participant list
    #[arg(long, default_value = "cast")]
    pub field: String,

    /// Only aggregate documents whose field equals (or contains) --match-value
    #[arg(long, requires = "match_value")]
    pub match_field: Option<String>,

    #[arg(long, requires = "match_field")]
    pub match_value: Option<String>,

    /// Keep only the first K results (0 keeps everything)
    #[arg(long, default_value = "0")]
    pub top: usize,

    /// What to do with documents whose participant field is not a list: abort or skip
    #[arg(long, default_value = "abort")]
    pub on_invalid: InvalidDocumentPolicy,

    #[arg(long, value_delimiter = ',', default_value = "csv")]
    pub formats: Vec<OutputFormat>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Bundle all outputs into a ZIP archive
    #[arg(long, num_args = 0..=1, default_missing_value = "cooccurrence.zip")]
    pub zip: Option<String>,

    /// Also rank single participants by number of documents
    #[arg(long)]
    pub rank_participants: bool,

    /// List documents sharing a participant with this document id or title
    #[arg(long)]
    pub shares_with: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(skip)]
    #[serde(skip)]
    pub filter: Option<DocumentFilter>,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 由 `--match-field` / `--match-value` 建立過濾條件
    pub fn resolve_filter(mut self) -> Self {
        self.filter = match (&self.match_field, &self.match_value) {
            (Some(field), Some(value)) => Some(DocumentFilter {
                field: field.clone(),
                value: parse_match_value(value),
            }),
            _ => None,
        };
        self
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source_location(&self) -> &str {
        &self.input
    }

    fn source_kind(&self) -> SourceKind {
        self.source
    }

    fn participant_field(&self) -> &str {
        &self.field
    }

    fn filter(&self) -> Option<&DocumentFilter> {
        self.filter.as_ref()
    }

    fn invalid_policy(&self) -> InvalidDocumentPolicy {
        self.on_invalid
    }

    fn top_k(&self) -> usize {
        self.top
    }

    fn rank_participants(&self) -> bool {
        self.rank_participants
    }

    fn shares_with(&self) -> Option<&str> {
        self.shares_with.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.zip.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_source("input", self.source, &self.input)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty_string("field", &self.field)?;

        if self.formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "formats".to_string(),
            });
        }

        if let Some(name) = &self.zip {
            validation::validate_file_extensions("zip", std::slice::from_ref(name), &["zip"])?;
        }

        if self.match_field.is_some() {
            validation::validate_required_field("match_value", &self.match_value)?;
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_defaults() {
        let config = CliConfig::parse_from(["costar-etl", "--input", "movies.jsonl"]);
        assert_eq!(config.source, SourceKind::Jsonl);
        assert_eq!(config.field, "cast");
        assert_eq!(config.on_invalid, InvalidDocumentPolicy::Abort);
        assert_eq!(config.formats, vec![OutputFormat::Csv]);
        assert_eq!(config.top, 0);
        assert!(config.zip.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_cli_full() {
        let config = CliConfig::parse_from([
            "costar-etl",
            "--input",
            "https://example.com/movies",
            "--source",
            "http",
            "--field",
            "directors",
            "--match-field",
            "genres",
            "--match-value",
            "Short",
            "--top",
            "3",
            "--on-invalid",
            "skip",
            "--formats",
            "csv,json",
            "--zip",
        ])
        .resolve_filter();

        assert_eq!(config.source, SourceKind::Http);
        assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Json]);
        assert_eq!(config.archive_name(), Some("cooccurrence.zip"));
        assert_eq!(config.invalid_policy(), InvalidDocumentPolicy::Skip);
        let filter = config.filter().unwrap();
        assert_eq!(filter.field, "genres");
        assert_eq!(filter.value, serde_json::json!("Short"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_match_value_parses_json_scalars() {
        assert_eq!(parse_match_value("1900"), serde_json::json!(1900));
        assert_eq!(parse_match_value("true"), serde_json::json!(true));
        assert_eq!(parse_match_value("Short"), serde_json::json!("Short"));
    }

    #[test]
    fn test_invalid_cli_config() {
        let config = CliConfig::parse_from(["costar-etl", "--input", "movies.csv"]);
        assert!(config.validate().is_err());

        let config =
            CliConfig::parse_from(["costar-etl", "--input", "movies.jsonl", "--zip", "out.tar"]);
        assert!(config.validate().is_err());
    }
}
