use crate::core::listing::DEFAULT_PAGE_SIZE;
use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const VALID_OUTPUT_FORMATS: &[&str] = &["json", "jsonl", "csv"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub gateway: ProcessingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_oauth_base_url")]
    pub oauth_base_url: String,
    pub access_token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_output_formats")]
    pub output_formats: Vec<String>,
    pub filename_pattern: Option<String>, // 例如: "reddit_{timestamp}"
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

fn default_public_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_oauth_base_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("reddit-gateway/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_output_formats() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            oauth_base_url: default_oauth_base_url(),
            access_token: None,
            user_agent: default_user_agent(),
            timeout_seconds: None,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            output_formats: default_output_formats(),
            filename_pattern: None,
            compression: None,
        }
    }
}

impl ApiConfig {
    /// 未設定或環境變數未替換成功 (`${...}`) 時視為沒有 token
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty() && !token.contains("${"))
    }
}

impl OutputConfig {
    pub fn compression_enabled(&self) -> bool {
        self.compression.as_ref().map(|c| c.enabled).unwrap_or(false)
    }
}

impl GatewayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GatewayError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GatewayError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REDDIT_ACCESS_TOKEN})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.public_base_url", &self.api.public_base_url)?;
        validation::validate_url("api.oauth_base_url", &self.api.oauth_base_url)?;
        validation::validate_non_empty_string("api.user_agent", &self.api.user_agent)?;

        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_positive_number("api.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_range(
            "listing.page_size",
            self.listing.page_size,
            1,
            DEFAULT_PAGE_SIZE,
        )?;
        validation::validate_positive_number(
            "gateway.concurrent_requests",
            self.gateway.concurrent_requests,
            1,
        )?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        for format in &self.output.output_formats {
            if !VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(GatewayError::InvalidConfigValue {
                    field: "output.output_formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        VALID_OUTPUT_FORMATS.join(", ")
                    ),
                });
            }
        }
        if self.output.output_formats.is_empty() {
            return Err(GatewayError::InvalidConfigValue {
                field: "output.output_formats".to_string(),
                value: "[]".to_string(),
                reason: "At least one output format is required".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[api]
public_base_url = "https://www.reddit.com"
oauth_base_url = "https://oauth.reddit.com"
access_token = "abc123"
user_agent = "test-agent/1.0"
timeout_seconds = 10

[listing]
page_size = 50

[gateway]
concurrent_requests = 2

[output]
output_path = "./test-output"
output_formats = ["json", "csv"]
filename_pattern = "reddit_{timestamp}"

[output.compression]
enabled = true
filename = "bundle.zip"
"#;

        let config = GatewayConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api.access_token(), Some("abc123"));
        assert_eq!(config.api.user_agent, "test-agent/1.0");
        assert_eq!(config.listing.page_size, 50);
        assert_eq!(config.gateway.concurrent_requests, 2);
        assert_eq!(config.output.output_formats, vec!["json", "csv"]);
        assert!(config.output.compression_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GatewayConfig::from_toml_str("").unwrap();

        assert_eq!(config.api.public_base_url, "https://www.reddit.com");
        assert_eq!(config.api.oauth_base_url, "https://oauth.reddit.com");
        assert_eq!(config.api.access_token(), None);
        assert_eq!(config.listing.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.gateway.concurrent_requests, 1);
        assert_eq!(config.output.output_formats, vec!["json"]);
        assert!(!config.output.compression_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_REDDIT_GATEWAY_TOKEN", "token-from-env");

        let toml_content = r#"
[api]
access_token = "${TEST_REDDIT_GATEWAY_TOKEN}"
"#;

        let config = GatewayConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.access_token(), Some("token-from-env"));

        std::env::remove_var("TEST_REDDIT_GATEWAY_TOKEN");
    }

    #[test]
    fn test_unresolved_token_placeholder_is_ignored() {
        let toml_content = r#"
[api]
access_token = "${REDDIT_GATEWAY_SURELY_UNSET_VAR}"
"#;

        let config = GatewayConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.access_token(), None);
    }

    #[test]
    fn test_config_validation() {
        let bad_url = GatewayConfig::from_toml_str(
            r#"
[api]
public_base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_url.validate().is_err());

        let bad_page_size = GatewayConfig::from_toml_str(
            r#"
[listing]
page_size = 0
"#,
        )
        .unwrap();
        assert!(bad_page_size.validate().is_err());

        let bad_format = GatewayConfig::from_toml_str(
            r#"
[output]
output_formats = ["xml"]
"#,
        )
        .unwrap();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[output]
output_path = "./from-file"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = GatewayConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output.output_path, "./from-file");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = GatewayConfig::from_toml_str("[api\nbroken").unwrap_err();
        assert!(matches!(err, GatewayError::ConfigError { .. }));
    }
}
