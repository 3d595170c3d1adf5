use crate::core::listing::{ListingFetcher, DEFAULT_PAGE_SIZE};
use crate::core::{router, shape};
use crate::domain::model::{OutputRecord, ResponseShape, WorkItem};
use crate::domain::ports::Transport;
use crate::utils::error::{GatewayError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

/// 每個工作項目：Router 解析 → 呼叫 API（或逐頁抓取 listing）→ 取形 → 展平
pub struct Gateway<T: Transport> {
    transport: T,
    page_size: usize,
    concurrent_requests: usize,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            page_size: DEFAULT_PAGE_SIZE,
            concurrent_requests: 1,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 同時處理中的項目數上限，輸出順序不受影響
    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Process all items and return one flat, ordered output sequence.
    /// The first failing item aborts the whole run.
    pub async fn process(&self, items: &[WorkItem]) -> Result<Vec<OutputRecord>> {
        tracing::info!(
            "🚀 Processing {} work item(s) (concurrency: {})",
            items.len(),
            self.concurrent_requests
        );

        let per_item: Vec<Vec<OutputRecord>> = stream::iter(items)
            .map(|item| self.process_item(item))
            .buffered(self.concurrent_requests)
            .try_collect()
            .await?;

        let records: Vec<OutputRecord> = per_item.into_iter().flatten().collect();
        tracing::info!("✅ Produced {} output record(s)", records.len());
        Ok(records)
    }

    async fn process_item(&self, item: &WorkItem) -> Result<Vec<OutputRecord>> {
        let operation = router::operation_of(item).unwrap_or("(default)").to_string();

        self.run_item(item)
            .await
            .map_err(|source| {
                tracing::error!(
                    "❌ Item {} ({}/{}) failed: {}",
                    item.index,
                    item.resource,
                    operation,
                    source
                );
                GatewayError::ItemFailed {
                    index: item.index,
                    resource: item.resource.clone(),
                    operation: operation.clone(),
                    source: Box::new(source),
                }
            })
    }

    async fn run_item(&self, item: &WorkItem) -> Result<Vec<OutputRecord>> {
        let route = router::resolve(item)?;
        tracing::debug!(
            "📡 Item {}: {} {} ({:?})",
            item.index,
            route.request.method,
            route.request.endpoint,
            route.shape
        );

        let shaped = match route.shape {
            ResponseShape::PaginatedListing => {
                let children = ListingFetcher::new(&self.transport, self.page_size)
                    .fetch_listing(&route.request, route.limit)
                    .await?;
                Value::Array(children)
            }
            ref direct => {
                let response = self.transport.send(&route.request).await?;
                shape::apply(direct, response)?
            }
        };

        let records = shape::flatten(shaped);
        tracing::debug!("📦 Item {}: {} record(s)", item.index, records.len());
        Ok(records)
    }
}
