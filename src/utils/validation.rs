use crate::domain::settings::SourceKind;
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// HTTP 來源必須是 URL，檔案來源必須是 .json / .jsonl / .ndjson 檔
pub fn validate_source(field_name: &str, kind: SourceKind, location: &str) -> Result<()> {
    match kind {
        SourceKind::Http => validate_url(field_name, location),
        SourceKind::Json | SourceKind::Jsonl => {
            validate_path(field_name, location)?;
            validate_file_extensions(
                field_name,
                &[location.to_string()],
                &["json", "jsonl", "ndjson"],
            )
        }
    }
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension) => {}
            Some(extension) => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("input", "https://example.com/movies").is_ok());
        assert!(validate_url("input", "http://example.com").is_ok());
        assert!(validate_url("input", "").is_err());
        assert!(validate_url("input", "invalid-url").is_err());
        assert!(validate_url("input", "mongodb://localhost:27017").is_err());
    }

    #[test]
    fn test_validate_source() {
        assert!(validate_source("input", SourceKind::Jsonl, "movies.jsonl").is_ok());
        assert!(validate_source("input", SourceKind::Json, "dump/movies.json").is_ok());
        assert!(validate_source("input", SourceKind::Jsonl, "movies.csv").is_err());
        assert!(validate_source("input", SourceKind::Json, "movies").is_err());
        assert!(validate_source("input", SourceKind::Http, "movies.jsonl").is_err());
    }

    #[test]
    fn test_validate_required_and_non_empty() {
        let missing: Option<String> = None;
        assert!(matches!(
            validate_required_field("match_value", &missing),
            Err(EtlError::MissingConfigError { .. })
        ));
        assert!(validate_non_empty_string("field", "  ").is_err());
        assert!(validate_non_empty_string("field", "cast").is_ok());
    }
}
