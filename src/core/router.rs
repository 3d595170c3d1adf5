//! Routing table: (resource, operation, sub-key) → request descriptor + response shape.
//!
//! Every supported combination lives in the static tables below. Adding a
//! route means adding a `RouteEntry` (and, for sub-keyed routes, a row in the
//! matching sub-key table).

use crate::domain::model::{
    LimitPolicy, Params, RequestDescriptor, ResolvedRoute, ResponseShape, WorkItem,
};
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;

pub const DEFAULT_LISTING_LIMIT: usize = 100;

type BuildFn = fn(&WorkItem) -> Result<ResolvedRoute>;

struct RouteEntry {
    resource: &'static str,
    operation: &'static str,
    build: BuildFn,
}

const ROUTES: &[RouteEntry] = &[
    RouteEntry { resource: "comment", operation: "create", build: comment_create },
    RouteEntry { resource: "profile", operation: "get", build: profile_get },
    RouteEntry { resource: "subreddit", operation: "get", build: subreddit_get },
    RouteEntry { resource: "subreddit", operation: "getAll", build: subreddit_get_all },
    RouteEntry { resource: "post", operation: "create", build: post_create },
    RouteEntry { resource: "post", operation: "getAll", build: post_get_all },
    RouteEntry { resource: "user", operation: "get", build: user_get },
];

/// 未指定 operation 時各 resource 的預設值
const DEFAULT_OPERATIONS: &[(&str, &str)] = &[
    ("comment", "create"),
    ("profile", "get"),
    ("subreddit", "get"),
    ("post", "create"),
    ("user", "get"),
];

// profile get: details → (api/v1 path, shape)
const PROFILE_DETAILS: &[(&str, &str, ResponseShape)] = &[
    ("identity", "me", ResponseShape::UnwrapField("features")),
    ("blockedUsers", "me/blocked", ResponseShape::Identity),
    ("friends", "me/friends", ResponseShape::Identity),
    ("karma", "me/karma", ResponseShape::Identity),
    ("prefs", "me/prefs", ResponseShape::Identity),
    ("trophies", "me/trophies", ResponseShape::Identity),
];

const SUBREDDIT_CONTENT: &[(&str, ResponseShape)] = &[
    ("about", ResponseShape::UnwrapField("data")),
    ("rules", ResponseShape::UnwrapField("rules")),
    ("sticky", ResponseShape::MapChildrenFirst),
    ("moderators", ResponseShape::Identity),
    ("traffic", ResponseShape::Identity),
    ("edit", ResponseShape::Identity),
];

const POST_LISTINGS: &[&str] = &["hot", "new", "rising", "top", "controversial"];

const POST_KINDS: &[&str] = &["self", "link", "image"];

const USER_DETAILS: &[(&str, ResponseShape)] = &[
    ("about", ResponseShape::UnwrapField("data")),
    ("gilded", ResponseShape::Identity),
    ("overview", ResponseShape::PaginatedListing),
    ("submitted", ResponseShape::PaginatedListing),
    ("comments", ResponseShape::PaginatedListing),
];

pub fn default_operation(resource: &str) -> Option<&'static str> {
    DEFAULT_OPERATIONS
        .iter()
        .find(|(r, _)| *r == resource)
        .map(|(_, op)| *op)
}

/// 取得項目實際要執行的 operation（未指定時套用預設值）
pub fn operation_of(item: &WorkItem) -> Result<&str> {
    match item.operation.as_deref() {
        Some(op) => Ok(op),
        None => default_operation(&item.resource).ok_or_else(|| {
            GatewayError::unsupported(&item.resource, "(default)", None)
        }),
    }
}

/// Resolve a work item into its request and response shape.
pub fn resolve(item: &WorkItem) -> Result<ResolvedRoute> {
    let operation = operation_of(item)?;
    let entry = ROUTES
        .iter()
        .find(|e| e.resource == item.resource && e.operation == operation)
        .ok_or_else(|| GatewayError::unsupported(&item.resource, operation, None))?;

    (entry.build)(item)
}

fn route(request: RequestDescriptor, shape: ResponseShape) -> ResolvedRoute {
    ResolvedRoute {
        request,
        shape,
        limit: LimitPolicy::All,
    }
}

fn listing(request: RequestDescriptor, item: &WorkItem) -> Result<ResolvedRoute> {
    Ok(ResolvedRoute {
        request,
        shape: ResponseShape::PaginatedListing,
        limit: limit_policy(item)?,
    })
}

// ----------------------------------
//         route builders
// ----------------------------------

fn comment_create(item: &WorkItem) -> Result<ResolvedRoute> {
    let mut params = Params::new();
    params.insert("thing_id".into(), Value::String(require_str(item, "targetId")?.into()));
    params.insert("text".into(), Value::String(require_str(item, "text")?.into()));

    Ok(route(
        RequestDescriptor::post("api/comment", params).authenticated(true),
        ResponseShape::Identity,
    ))
}

fn profile_get(item: &WorkItem) -> Result<ResolvedRoute> {
    let details = require_str(item, "details")?;
    let (_, path, shape) = PROFILE_DETAILS
        .iter()
        .find(|(key, _, _)| *key == details)
        .ok_or_else(|| unsupported_sub_key(item, "details", details))?;

    Ok(route(
        RequestDescriptor::get(format!("api/v1/{}", path)).authenticated(true),
        shape.clone(),
    ))
}

fn subreddit_get(item: &WorkItem) -> Result<ResolvedRoute> {
    let subreddit = require_path_segment(item, "subreddit")?;
    let content = require_str(item, "content")?;
    let (_, shape) = SUBREDDIT_CONTENT
        .iter()
        .find(|(key, _)| *key == content)
        .ok_or_else(|| unsupported_sub_key(item, "content", content))?;

    Ok(route(
        RequestDescriptor::get(format!("r/{}/about/{}.json", subreddit, content)),
        shape.clone(),
    ))
}

fn subreddit_get_all(item: &WorkItem) -> Result<ResolvedRoute> {
    if optional_bool(item, "trending")?.unwrap_or(false) {
        return Ok(route(
            RequestDescriptor::get("api/trending_subreddits.json"),
            ResponseShape::Identity,
        ));
    }

    let mut request = RequestDescriptor::get("api/search_subreddits.json");
    if let Some(keyword) = optional_str(item, "keyword")? {
        request = request.with_param("query", Value::String(keyword.to_string()));
    }
    listing(request, item)
}

fn post_create(item: &WorkItem) -> Result<ResolvedRoute> {
    let kind = require_str(item, "kind")?;
    if !POST_KINDS.contains(&kind) {
        return Err(GatewayError::InvalidParameter {
            name: "kind".to_string(),
            reason: format!("expected one of {}", POST_KINDS.join(", ")),
        });
    }

    let mut params = Params::new();
    params.insert("title".into(), Value::String(require_str(item, "title")?.into()));
    params.insert("sr".into(), Value::String(require_str(item, "subreddit")?.into()));
    params.insert("kind".into(), Value::String(kind.into()));

    if kind == "self" {
        // 只有標題的 self post 也合法，text 一律送出
        let text = text_or_empty(item, "text")?;
        params.insert("text".into(), Value::String(text.into()));
    } else {
        let url = require_str(item, "url")?;
        params.insert("url".into(), Value::String(url.into()));
        // 有 url 就必須帶 resubmit，否則 API 會拒絕
        let resubmit = optional_bool(item, "resubmit")?.unwrap_or(false);
        params.insert("resubmit".into(), Value::Bool(resubmit));
    }

    Ok(route(
        RequestDescriptor::post("api/submit", params).authenticated(true),
        ResponseShape::Identity,
    ))
}

fn post_get_all(item: &WorkItem) -> Result<ResolvedRoute> {
    let subreddit = require_path_segment(item, "subreddit")?;
    let content = require_str(item, "content")?;
    if !POST_LISTINGS.contains(&content) {
        return Err(unsupported_sub_key(item, "content", content));
    }

    listing(
        RequestDescriptor::get(format!("r/{}/{}.json", subreddit, content)),
        item,
    )
}

fn user_get(item: &WorkItem) -> Result<ResolvedRoute> {
    let username = require_path_segment(item, "username")?;
    let details = require_str(item, "details")?;
    let (_, shape) = USER_DETAILS
        .iter()
        .find(|(key, _)| *key == details)
        .ok_or_else(|| unsupported_sub_key(item, "details", details))?;

    let request = RequestDescriptor::get(format!("user/{}/{}.json", username, details));
    match shape {
        ResponseShape::PaginatedListing => listing(request, item),
        direct => Ok(route(request, direct.clone())),
    }
}

// ----------------------------------
//         parameter helpers
// ----------------------------------

fn unsupported_sub_key(item: &WorkItem, key: &str, value: &str) -> GatewayError {
    let operation = item
        .operation
        .as_deref()
        .or_else(|| default_operation(&item.resource))
        .unwrap_or_default();
    GatewayError::unsupported(&item.resource, operation, Some(format!("{}={}", key, value)))
}

fn require_str<'a>(item: &'a WorkItem, name: &str) -> Result<&'a str> {
    match optional_str(item, name)? {
        Some(value) => Ok(value),
        None => Err(GatewayError::MissingParameter {
            name: name.to_string(),
        }),
    }
}

fn optional_str<'a>(item: &'a WorkItem, name: &str) -> Result<Option<&'a str>> {
    match item.param(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Err(GatewayError::InvalidParameter {
            name: name.to_string(),
            reason: "value cannot be empty".to_string(),
        }),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(GatewayError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

fn text_or_empty<'a>(item: &'a WorkItem, name: &str) -> Result<&'a str> {
    match item.param(name) {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(GatewayError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// 會被插入 URL 路徑的值不能含有 '/'
fn require_path_segment<'a>(item: &'a WorkItem, name: &str) -> Result<&'a str> {
    let value = require_str(item, name)?;
    if value.contains('/') {
        return Err(GatewayError::InvalidParameter {
            name: name.to_string(),
            reason: "value cannot contain '/'".to_string(),
        });
    }
    Ok(value)
}

fn optional_bool(item: &WorkItem, name: &str) -> Result<Option<bool>> {
    match item.param(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(GatewayError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected a boolean, got {}", other),
        }),
    }
}

fn limit_policy(item: &WorkItem) -> Result<LimitPolicy> {
    if optional_bool(item, "returnAll")?.unwrap_or(false) {
        return Ok(LimitPolicy::All);
    }

    match item.param("limit") {
        None | Some(Value::Null) => Ok(LimitPolicy::Max(DEFAULT_LISTING_LIMIT)),
        Some(value) => match value.as_u64() {
            Some(limit) if limit >= 1 => Ok(LimitPolicy::Max(limit as usize)),
            _ => Err(GatewayError::InvalidParameter {
                name: "limit".to_string(),
                reason: format!("expected a positive integer, got {}", value),
            }),
        },
    }
}
