use crate::core::export::Exporter;
use crate::core::gateway::Gateway;
use crate::domain::model::WorkItem;
use crate::domain::ports::{Storage, Transport};
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub items_processed: usize,
    pub records_written: usize,
    pub files: Vec<String>,
}

/// Gateway 處理完所有項目後交給 Exporter 輸出
pub struct GatewayEngine<T: Transport, S: Storage> {
    gateway: Gateway<T>,
    exporter: Exporter<S>,
}

impl<T: Transport, S: Storage> GatewayEngine<T, S> {
    pub fn new(gateway: Gateway<T>, exporter: Exporter<S>) -> Self {
        Self { gateway, exporter }
    }

    pub async fn run(&self, items: &[WorkItem]) -> Result<RunSummary> {
        tracing::info!("Starting gateway run...");

        let records = self.gateway.process(items).await?;

        tracing::info!("Exporting {} records...", records.len());
        let files = self.exporter.export(&records).await?;
        for file in &files {
            tracing::info!("📁 Output saved to: {}", file);
        }

        Ok(RunSummary {
            items_processed: items.len(),
            records_written: records.len(),
            files,
        })
    }
}
