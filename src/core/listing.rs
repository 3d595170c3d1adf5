use crate::domain::model::{HttpMethod, LimitPolicy, Page, RequestDescriptor};
use crate::domain::ports::Transport;
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Reddit 單頁上限
pub const DEFAULT_PAGE_SIZE: usize = 100;

impl Page {
    /// 解析一頁回應。支援 Listing envelope (`data.children` + `data.after`)
    /// 以及 search_subreddits 的 `{ "subreddits": [...] }`（無 cursor）。
    pub fn from_value(response: Value) -> Result<Page> {
        let mut response = match response {
            Value::Object(map) => map,
            _ => return Err(GatewayError::malformed("a listing object")),
        };

        if let Some(Value::Array(subreddits)) = response.remove("subreddits") {
            return Ok(Page {
                children: subreddits,
                after: None,
            });
        }

        let mut data = match response.remove("data") {
            Some(Value::Object(data)) => data,
            _ => return Err(GatewayError::malformed("listing field 'data'")),
        };

        let children = match data.remove("children") {
            Some(Value::Array(children)) => children,
            _ => return Err(GatewayError::malformed("listing field 'data.children'")),
        };

        let children = children
            .into_iter()
            .map(|child| match child {
                Value::Object(mut child) => child
                    .remove("data")
                    .ok_or_else(|| GatewayError::malformed("child field 'data'")),
                _ => Err(GatewayError::malformed("child envelope object")),
            })
            .collect::<Result<Vec<_>>>()?;

        let after = match data.remove("after") {
            Some(Value::String(after)) if !after.is_empty() => Some(after),
            _ => None,
        };

        Ok(Page { children, after })
    }
}

pub struct ListingFetcher<'a, T: Transport + ?Sized> {
    transport: &'a T,
    page_size: usize,
}

impl<'a, T: Transport + ?Sized> ListingFetcher<'a, T> {
    pub fn new(transport: &'a T, page_size: usize) -> Self {
        Self {
            transport,
            page_size: page_size.max(1),
        }
    }

    /// 逐頁抓取直到 cursor 用盡、達到 limit 或遇到空頁。
    /// 任何一頁失敗都會讓整個 listing 失敗，不回傳部分結果。
    pub async fn fetch_listing(
        &self,
        request: &RequestDescriptor,
        limit: LimitPolicy,
    ) -> Result<Vec<Value>> {
        let mut accumulated: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors: HashSet<String> = HashSet::new();
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let page_limit = limit
                .remaining_after(accumulated.len())
                .map_or(self.page_size, |remaining| remaining.min(self.page_size));

            let mut params = request.params.clone();
            if let Some(after) = &cursor {
                params.insert("after".to_string(), Value::String(after.clone()));
            }
            params.insert("limit".to_string(), Value::from(page_limit));

            let response = self
                .transport
                .request(
                    HttpMethod::Get,
                    &request.endpoint,
                    &params,
                    request.requires_auth,
                )
                .await?;
            let page = Page::from_value(response)?;

            tracing::debug!(
                "📄 {} page {}: {} children, after={:?}",
                request.endpoint,
                page_number,
                page.children.len(),
                page.after
            );

            if page.children.is_empty() {
                break;
            }
            accumulated.extend(page.children);

            if limit.remaining_after(accumulated.len()) == Some(0) {
                break;
            }

            // cursor 重複出現代表 API 在繞圈
            match page.after {
                Some(after) if !seen_cursors.insert(after.clone()) => {
                    tracing::warn!(
                        "⚠️ {} returned cursor {} again, stopping pagination",
                        request.endpoint,
                        after
                    );
                    break;
                }
                Some(after) => cursor = Some(after),
                None => break,
            }
        }

        if let LimitPolicy::Max(max) = limit {
            accumulated.truncate(max);
        }

        tracing::debug!(
            "📄 {}: {} records over {} page(s)",
            request.endpoint,
            accumulated.len(),
            page_number
        );
        Ok(accumulated)
    }
}
