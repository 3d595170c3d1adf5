use crate::domain::model::{OutputRecord, ResponseShape};
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;

/// 依 ResponseShape 取出回應中實際要輸出的部分
pub fn apply(shape: &ResponseShape, response: Value) -> Result<Value> {
    match shape {
        ResponseShape::Identity | ResponseShape::PaginatedListing => Ok(response),
        ResponseShape::UnwrapField(field) => unwrap_field(response, field),
        ResponseShape::MapChildrenFirst => map_children_first(response),
    }
}

fn unwrap_field(response: Value, field: &str) -> Result<Value> {
    match response {
        Value::Object(mut map) => map
            .remove(field)
            .ok_or_else(|| GatewayError::malformed(format!("field '{}'", field))),
        _ => Err(GatewayError::malformed(format!(
            "an object containing '{}'",
            field
        ))),
    }
}

/// sticky: 每個 envelope 只取 data.children[0].data
fn map_children_first(response: Value) -> Result<Value> {
    let envelopes = match response {
        Value::Array(items) => items,
        _ => return Err(GatewayError::malformed("an array of listing envelopes")),
    };

    envelopes
        .into_iter()
        .map(|mut envelope| {
            envelope
                .pointer_mut("/data/children/0/data")
                .map(Value::take)
                .ok_or_else(|| GatewayError::malformed("data.children[0].data"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// 陣列展開成多筆，其餘為單筆
pub fn flatten(shaped: Value) -> Vec<OutputRecord> {
    match shaped {
        Value::Array(items) => items.into_iter().map(OutputRecord::from).collect(),
        other => vec![OutputRecord::from(other)],
    }
}
