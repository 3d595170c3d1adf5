use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unsupported operation: {resource}/{operation}{}", suffix(.detail))]
    UnsupportedOperation {
        resource: String,
        operation: String,
        detail: Option<String>,
    },

    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Transport failure{}: {message}", http_status(.status))]
    TransportFailure { status: Option<u16>, message: String },

    #[error("Malformed response: expected {expected}")]
    MalformedResponse { expected: String },

    #[error("Item {index} ({resource}/{operation}) failed: {source}")]
    ItemFailed {
        index: usize,
        resource: String,
        operation: String,
        #[source]
        source: Box<GatewayError>,
    },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// 錯誤分類，CLI 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Routing,
    Response,
    Output,
}

impl GatewayError {
    pub fn unsupported(resource: &str, operation: &str, detail: Option<String>) -> Self {
        Self::UnsupportedOperation {
            resource: resource.to_string(),
            operation: operation.to_string(),
            detail,
        }
    }

    pub fn malformed(expected: impl Into<String>) -> Self {
        Self::MalformedResponse {
            expected: expected.into(),
        }
    }

    /// 剝開 ItemFailed 包裝，取得實際錯誤
    pub fn root_cause(&self) -> &GatewayError {
        match self {
            Self::ItemFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            Self::UnsupportedOperation { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidParameter { .. } => ErrorCategory::Routing,
            Self::TransportFailure { .. } => ErrorCategory::Transport,
            Self::MalformedResponse { .. } | Self::SerializationError(_) => {
                ErrorCategory::Response
            }
            Self::ConfigError { .. } | Self::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
            Self::ZipError(_) | Self::CsvError(_) | Self::IoError(_) => ErrorCategory::Output,
            Self::ItemFailed { .. } => ErrorCategory::Routing,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.root_cause() {
            Self::UnsupportedOperation { .. } => {
                "Check the resource, operation and details/content values of the failing item"
            }
            Self::MissingParameter { .. } | Self::InvalidParameter { .. } => {
                "Fix the parameters of the failing item in the input file"
            }
            Self::TransportFailure { status: Some(401), .. }
            | Self::TransportFailure { status: Some(403), .. } => {
                "Refresh the access token configured under [api]"
            }
            Self::TransportFailure { status: Some(429), .. } => {
                "Rate limited by the API, wait before running again"
            }
            Self::TransportFailure { .. } => "Check network connectivity and the API base URLs",
            Self::MalformedResponse { .. } | Self::SerializationError(_) => {
                "The API returned an unexpected shape, re-run with --verbose to inspect it"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValue { .. } => {
                "Review the TOML configuration file"
            }
            Self::ZipError(_) | Self::CsvError(_) | Self::IoError(_) => {
                "Check that the output path exists and is writable"
            }
            Self::ItemFailed { .. } => "Inspect the failing item",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ItemFailed {
                index,
                resource,
                operation,
                source,
            } => format!(
                "Work item #{} ({} {}) could not be processed: {}",
                index, resource, operation, source
            ),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
