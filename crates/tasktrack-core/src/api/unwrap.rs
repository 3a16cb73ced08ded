//! Response-shape normalization.
//!
//! The backend is not consistent about envelopes: some endpoints wrap the
//! payload in a named field, some return it bare, and list endpoints may
//! return nothing useful at all. Every call declares an ordered list of
//! [`Extract`] strategies; the first one that matches produces the result.

use serde_json::Value;

use super::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// A named top-level field, if present and truthy.
    Field(&'static str),
    /// A named top-level field, if it is an array.
    ListField(&'static str),
    /// The whole body as received, including an empty one. Always matches.
    Body,
    /// The whole body, if it is an array.
    ListBody,
    /// An empty array. Always matches.
    EmptyList,
}

/// Whole body, nothing else.
pub const BODY: &[Extract] = &[Extract::Body];

pub const TASK: &[Extract] = &[Extract::Field("task"), Extract::Body];
pub const TASKS: &[Extract] = &[Extract::Field("tasks"), Extract::Body];
pub const TASK_HISTORY: &[Extract] = &[
    Extract::ListField("history"),
    Extract::ListBody,
    Extract::EmptyList,
];

pub const USER: &[Extract] = &[Extract::Field("user"), Extract::Body];
pub const USERS: &[Extract] = &[Extract::Field("users")];

pub const NOTIFICATIONS: &[Extract] = &[
    Extract::ListField("notifications"),
    Extract::ListBody,
    Extract::EmptyList,
];

pub const RESET_REQUESTS: &[Extract] = &[
    Extract::ListField("data"),
    Extract::ListBody,
    Extract::EmptyList,
];

/// JSON-web truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Apply the first matching strategy, or `None` when none matches.
pub fn extract(mut body: Value, chain: &[Extract]) -> Option<Value> {
    for strategy in chain {
        match *strategy {
            Extract::Field(name) => {
                if let Some(field) = body.get_mut(name) {
                    if is_truthy(field) {
                        return Some(field.take());
                    }
                }
            }
            Extract::ListField(name) => {
                if let Some(field) = body.get_mut(name) {
                    if field.is_array() {
                        return Some(field.take());
                    }
                }
            }
            Extract::Body => return Some(body),
            Extract::ListBody => {
                if body.is_array() {
                    return Some(body);
                }
            }
            Extract::EmptyList => return Some(Value::Array(Vec::new())),
        }
    }
    None
}

/// [`extract`], failing with `InvalidResponse` when nothing matched.
pub fn unwrap_body(body: Value, chain: &[Extract]) -> Result<Value, ApiError> {
    let shape = describe(&body);
    extract(body, chain).ok_or_else(|| {
        ApiError::InvalidResponse(format!(
            "no usable payload in {} response (tried {:?})",
            shape, chain
        ))
    })
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "empty",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
