use crate::domain::model::{ExtractedRecords, TransformResult};
use crate::domain::settings::{DocumentFilter, InvalidDocumentPolicy, OutputFormat, SourceKind};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// 檔案路徑（相對於 storage）或 HTTP URL
    fn source_location(&self) -> &str;
    fn source_kind(&self) -> SourceKind;
    fn participant_field(&self) -> &str;
    fn filter(&self) -> Option<&DocumentFilter>;
    fn invalid_policy(&self) -> InvalidDocumentPolicy;
    /// 0 表示輸出全部
    fn top_k(&self) -> usize;
    fn rank_participants(&self) -> bool;
    fn shares_with(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
    /// 設定後將所有輸出打包成此名稱的 ZIP
    fn archive_name(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedRecords>;
    async fn transform(&self, data: ExtractedRecords) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
