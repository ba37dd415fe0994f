use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting co-occurrence ETL process");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Extracting documents...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} documents ({} skipped at the source)",
            extracted.records.len(),
            extracted.skipped
        );
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🔧 Aggregating co-occurrence pairs...");
        let result = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "🔧 Aggregated {} pairs from {} documents ({} skipped)",
            result.report.results.len(),
            result.report.documents_seen,
            result.report.documents_skipped
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Writing results...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
