use crate::config::ApiConfig;
use crate::domain::model::{HttpMethod, Params};
use crate::domain::ports::Transport;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 200;

/// reqwest 實作的 Transport。
/// 需要授權的請求走 OAuth 主機並帶 Bearer token，其餘走公開主機。
pub struct HttpTransport {
    client: Client,
    public_base_url: String,
    oauth_base_url: String,
    access_token: Option<String>,
}

impl HttpTransport {
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            oauth_base_url: config.oauth_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token().map(str::to_string),
        })
    }

    fn encode_params(params: &Params) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = params
            .iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.clone(), value))
            })
            .collect();
        pairs.push(("api_type".to_string(), "json".to_string()));
        pairs
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &Params,
        requires_auth: bool,
    ) -> Result<Value> {
        let (base_url, token) = if requires_auth {
            let token = self.access_token.as_deref().ok_or_else(|| {
                GatewayError::TransportFailure {
                    status: None,
                    message: format!("{} requires an access token but none is configured", endpoint),
                }
            })?;
            (&self.oauth_base_url, Some(token))
        } else {
            (&self.public_base_url, None)
        };

        let url = format!("{}/{}", base_url, endpoint.trim_start_matches('/'));
        let pairs = Self::encode_params(params);
        tracing::debug!("📡 {} {}", method, url);

        let mut request = match method {
            HttpMethod::Get => self.client.get(&url).query(&pairs),
            HttpMethod::Post => self.client.post(&url).form(&pairs),
        };
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(GatewayError::TransportFailure {
                status: Some(status.as_u16()),
                message: if snippet.is_empty() {
                    status.to_string()
                } else {
                    snippet
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::TransportFailure {
            status: Some(status.as_u16()),
            message: format!("response from {} is not JSON: {}", endpoint, e),
        })
    }
}
