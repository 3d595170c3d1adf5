use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 一筆輸入工作項目：resource / operation 加上該操作所需的欄位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(skip)]
    pub index: usize,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl WorkItem {
    pub fn new(index: usize, resource: &str, operation: Option<&str>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            index,
            resource: resource.to_string(),
            operation: operation.map(str::to_string),
            params,
        }
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// 從 JSON 陣列讀入並依序編號
    pub fn from_json_array(content: &str) -> serde_json::Result<Vec<WorkItem>> {
        let mut items: Vec<WorkItem> = serde_json::from_str(content)?;
        for (index, item) in items.iter_mut().enumerate() {
            item.index = index;
        }
        Ok(items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Query/body parameters. Values are scalars (string, number, bool).
pub type Params = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub endpoint: String,
    pub params: Params,
    pub requires_auth: bool,
}

impl RequestDescriptor {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint: endpoint.into(),
            params: Params::new(),
            requires_auth: false,
        }
    }

    pub fn post(endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            method: HttpMethod::Post,
            endpoint: endpoint.into(),
            params,
            requires_auth: false,
        }
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn authenticated(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }
}

/// 如何從原始回應取出可用的資料
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResponseShape {
    Identity,
    UnwrapField(&'static str),
    MapChildrenFirst,
    PaginatedListing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPolicy {
    All,
    Max(usize),
}

impl LimitPolicy {
    pub fn remaining_after(&self, collected: usize) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Max(max) => Some(max.saturating_sub(collected)),
        }
    }
}

/// Router 的輸出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRoute {
    pub request: RequestDescriptor,
    pub shape: ResponseShape,
    #[serde(skip)]
    pub limit: LimitPolicy,
}

/// One fetched page of a listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub children: Vec<Value>,
    pub after: Option<String>,
}

/// 下游輸出的單筆紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRecord {
    pub data: Value,
}

impl From<Value> for OutputRecord {
    fn from(data: Value) -> Self {
        Self { data }
    }
}
