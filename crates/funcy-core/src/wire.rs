// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request and response shapes exchanged with a transport.
//!
//! ```json
//! {"type": "function", "func": "mypackage.Function1", "params": ["abc"]}
//! {"result": ["YWJj", {"Description": "Example details", "Value": 42}]}
//! {"error": "param cannot be empty"}
//! ```

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Request type; only `"function"` is served. Optional on input.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Registered name of the function to invoke.
    #[serde(rename = "func")]
    pub function_name: String,
    /// Positional generic arguments.
    #[serde(rename = "params", default)]
    pub arguments: Vec<Value>,
}

impl InvokeRequest {
    pub fn new(function_name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            kind: None,
            function_name: function_name.into(),
            arguments,
        }
    }
}

/// The outcome of one request. Exactly one side is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeResponse {
    #[serde(rename = "result", default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Value>,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl InvokeResponse {
    pub fn success(results: Vec<Value>) -> Self {
        Self {
            results,
            error_message: None,
        }
    }

    pub fn failure(error: &impl Display) -> Self {
        Self {
            results: Vec::new(),
            error_message: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_field_names() {
        let request: InvokeRequest = serde_json::from_value(json!({
            "type": "function",
            "func": "mypackage.Function1",
            "params": ["abc", 1]
        }))
        .unwrap();

        assert_eq!(request.kind.as_deref(), Some("function"));
        assert_eq!(request.function_name, "mypackage.Function1");
        assert_eq!(request.arguments, vec![json!("abc"), json!(1)]);
    }

    #[test]
    fn test_request_defaults() {
        let request: InvokeRequest = serde_json::from_value(json!({"func": "f"})).unwrap();
        assert!(request.kind.is_none());
        assert!(request.arguments.is_empty());
    }

    #[test]
    fn test_request_requires_func() {
        assert!(serde_json::from_value::<InvokeRequest>(json!({"params": []})).is_err());
    }

    #[test]
    fn test_success_omits_error() {
        let response = InvokeResponse::success(vec![json!(1)]);
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"result": [1]}));
    }

    #[test]
    fn test_failure_omits_result() {
        let response = InvokeResponse::failure(&"boom");
        assert!(response.is_error());
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"error": "boom"}));
    }

    #[test]
    fn test_empty_success_serializes_to_empty_object() {
        let response = InvokeResponse::success(vec![]);
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({}));
    }
}
