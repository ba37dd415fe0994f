use crate::core::aggregator::PairAggregator;
use crate::core::documents::{parse_json_array, parse_json_lines, records_from_values};
use crate::core::ranking::{find_sharing, rank_participants};
use crate::core::{ConfigProvider, ExtractedRecords, Pipeline, Storage, TransformResult};
use crate::domain::model::{CountResult, ParticipantCount, SharedParticipants};
use crate::domain::settings::{OutputFormat, SourceKind};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// 讀取文件集合、計算共同出現配對並寫出結果
pub struct CoOccurrencePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) client: Client,
}

impl<S: Storage, C: ConfigProvider> CoOccurrencePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    async fn fetch_values(&self) -> Result<Vec<serde_json::Value>> {
        let location = self.config.source_location();

        match self.config.source_kind() {
            SourceKind::Http => {
                tracing::debug!("Making API request to: {}", location);
                let response = self.client.get(location).send().await?;
                tracing::debug!("API response status: {}", response.status());

                if !response.status().is_success() {
                    return Err(EtlError::SourceError {
                        message: format!("{} returned HTTP {}", location, response.status()),
                    });
                }

                let body = response.bytes().await?;
                parse_json_array(&body)
            }
            SourceKind::Jsonl => {
                let bytes = self.storage.read_file(location).await?;
                tracing::debug!("Read {} bytes from {}", bytes.len(), location);
                parse_json_lines(&bytes)
            }
            SourceKind::Json => {
                let bytes = self.storage.read_file(location).await?;
                tracing::debug!("Read {} bytes from {}", bytes.len(), location);
                parse_json_array(&bytes)
            }
        }
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CoOccurrencePipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedRecords> {
        let values = self.fetch_values().await?;
        let extracted = records_from_values(values, self.config.invalid_policy())?;

        tracing::info!(
            "📊 Extracted {} documents from {} source",
            extracted.records.len(),
            self.config.source_kind()
        );
        Ok(extracted)
    }

    async fn transform(&self, data: ExtractedRecords) -> Result<TransformResult> {
        let field = self.config.participant_field();
        let policy = self.config.invalid_policy();

        let mut aggregator = PairAggregator::new();
        aggregator.record_skipped(data.skipped);

        let mut documents = Vec::with_capacity(data.records.len());
        let mut matched = 0;
        for record in &data.records {
            if let Some(filter) = self.config.filter() {
                if !filter.matches(record) {
                    continue;
                }
            }
            matched += 1;

            if let Some(document) = aggregator.ingest_record(record, field, policy)? {
                documents.push(document);
            }
        }

        if let Some(filter) = self.config.filter() {
            tracing::info!(
                "🔎 {} of {} documents match {} = {}",
                matched,
                data.records.len(),
                filter.field,
                filter.value
            );
        }

        let top_k = self.config.top_k();
        let report = aggregator.finish().top_k(top_k);

        let participant_ranking = self.config.rank_participants().then(|| {
            let mut ranking = rank_participants(&documents);
            if top_k > 0 {
                ranking.truncate(top_k);
            }
            ranking
        });

        let shared = self
            .config
            .shares_with()
            .map(|reference| find_sharing(&documents, reference))
            .transpose()?;

        Ok(TransformResult {
            report,
            participant_ranking,
            shared,
            generated_at: chrono::Utc::now(),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let files = render_outputs(&result, self.config.output_formats())?;
        tracing::debug!("Rendered {} output files", files.len());

        if let Some(archive_name) = self.config.archive_name() {
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, content) in &files {
                    zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                    zip.write_all(content)?;
                }
                zip.finish()?.into_inner()
            };

            let path = self.output_file(archive_name);
            tracing::debug!("Writing ZIP file ({} bytes) to {}", zip_data.len(), path);
            self.storage.write_file(&path, &zip_data).await?;
            return Ok(path);
        }

        for (name, content) in &files {
            self.storage.write_file(&self.output_file(name), content).await?;
        }
        Ok(self.config.output_path().to_string())
    }
}

#[derive(Serialize)]
struct JsonSummary<'a, T: Serialize> {
    generated_at: String,
    documents_seen: usize,
    documents_skipped: usize,
    total_contributions: u64,
    results: &'a [T],
}

/// 依格式產生 (檔名, 內容)；配對結果固定輸出，排名與共用查詢視設定輸出
fn render_outputs(result: &TransformResult, formats: &[OutputFormat]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();

    for format in formats {
        let ext = format.extension();
        files.push((format!("pairs.{}", ext), render_pairs(result, *format)?));

        if let Some(ranking) = &result.participant_ranking {
            files.push((
                format!("participants.{}", ext),
                render_ranking(result, ranking, *format)?,
            ));
        }

        if let Some(shared) = &result.shared {
            files.push((format!("shared.{}", ext), render_shared(shared, *format)?));
        }
    }

    Ok(files)
}

fn delimited_writer(format: OutputFormat) -> csv::Writer<Vec<u8>> {
    let delimiter = if format == OutputFormat::Tsv { b'\t' } else { b',' };
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new())
}

fn finish_writer(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

fn summary<'a, T: Serialize>(result: &TransformResult, results: &'a [T]) -> JsonSummary<'a, T> {
    JsonSummary {
        generated_at: result.generated_at.to_rfc3339(),
        documents_seen: result.report.documents_seen,
        documents_skipped: result.report.documents_skipped,
        total_contributions: result.report.total_contributions,
        results,
    }
}

fn render_pairs(result: &TransformResult, format: OutputFormat) -> Result<Vec<u8>> {
    let pairs: &[CountResult] = &result.report.results;
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(&summary(result, pairs))?),
        OutputFormat::Csv | OutputFormat::Tsv => {
            let mut writer = delimited_writer(format);
            writer.write_record(["first", "second", "count"])?;
            for r in pairs {
                writer.write_record([r.pair.first(), r.pair.second(), r.count.to_string().as_str()])?;
            }
            finish_writer(writer)
        }
    }
}

fn render_ranking(
    result: &TransformResult,
    ranking: &[ParticipantCount],
    format: OutputFormat,
) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(&summary(result, ranking))?),
        OutputFormat::Csv | OutputFormat::Tsv => {
            let mut writer = delimited_writer(format);
            writer.write_record(["participant", "count"])?;
            for r in ranking {
                writer.write_record([r.participant.as_str(), r.count.to_string().as_str()])?;
            }
            finish_writer(writer)
        }
    }
}

fn render_shared(shared: &[SharedParticipants], format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(shared)?),
        OutputFormat::Csv | OutputFormat::Tsv => {
            let mut writer = delimited_writer(format);
            writer.write_record(["document_id", "title", "shared"])?;
            for s in shared {
                writer.write_record([
                    s.document_id.as_str(),
                    s.title.as_deref().unwrap_or(""),
                    s.shared.join("; ").as_str(),
                ])?;
            }
            finish_writer(writer)
        }
    }
}
