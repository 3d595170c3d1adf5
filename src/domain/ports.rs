use crate::domain::model::{HttpMethod, Params, RequestDescriptor};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 已驗證身分的 API 呼叫。非 2xx、網路錯誤或非 JSON 回應都回傳 TransportFailure。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &Params,
        requires_auth: bool,
    ) -> Result<Value>;

    async fn send(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        self.request(
            descriptor.method,
            &descriptor.endpoint,
            &descriptor.params,
            descriptor.requires_auth,
        )
        .await
    }
}

