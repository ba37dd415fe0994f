use crate::core::ConfigProvider;
use crate::domain::settings::{DocumentFilter, InvalidDocumentPolicy, OutputFormat, SourceKind};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 以 TOML 描述的聚合工作
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub r#type: SourceKind,
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub field: Option<String>,
    pub top: Option<usize>,
    pub on_invalid: Option<InvalidDocumentPolicy>,
    pub rank_participants: Option<bool>,
    pub shares_with: Option<String>,
    #[serde(rename = "match")]
    pub filter: Option<DocumentFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<OutputFormat>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

const DEFAULT_FIELD: &str = "cast";
const DEFAULT_ARCHIVE: &str = "cooccurrence.zip";

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${MOVIES_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn source_location(&self) -> &str {
        &self.source.location
    }

    fn source_kind(&self) -> SourceKind {
        self.source.r#type
    }

    fn participant_field(&self) -> &str {
        self.aggregate.field.as_deref().unwrap_or(DEFAULT_FIELD)
    }

    fn filter(&self) -> Option<&DocumentFilter> {
        self.aggregate.filter.as_ref()
    }

    fn invalid_policy(&self) -> InvalidDocumentPolicy {
        self.aggregate.on_invalid.unwrap_or_default()
    }

    fn top_k(&self) -> usize {
        self.aggregate.top.unwrap_or(0)
    }

    fn rank_participants(&self) -> bool {
        self.aggregate.rank_participants.unwrap_or(false)
    }

    fn shares_with(&self) -> Option<&str> {
        self.aggregate.shares_with.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.load.output_formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_deref().unwrap_or(DEFAULT_ARCHIVE))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;
        validation::validate_source("source.location", self.source.r#type, &self.source.location)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_non_empty_string("aggregate.field", self.participant_field())?;

        if self.load.output_formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "load.output_formats".to_string(),
            });
        }

        if let Some(filter) = &self.aggregate.filter {
            validation::validate_non_empty_string("aggregate.match.field", &filter.field)?;
        }

        Ok(())
    }
}
