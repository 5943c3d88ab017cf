// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 request and response objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Protocol version string carried in every request and response.
pub const JSONRPC_VERSION: &str = "2.0";

/// Well-known JSON-RPC error codes.
pub mod error_codes {
    /// Request body was not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// Request object was malformed.
    pub const INVALID_REQUEST: i64 = -32600;
    /// Method is not registered on the dispatcher.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Params did not match the method signature.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Implementation-defined server error; the broker uses it for every
    /// internal failure.
    pub const INTERNAL_ERROR: i64 = -32000;
}

/// A JSON-RPC 2.0 request object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

impl RpcRequest {
    /// Build a request with id 0 (the fixed id client stubs use).
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            params,
            id: Some(Value::from(0)),
        }
    }
}

/// A JSON-RPC 2.0 response object, either `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcResponse {
    /// Successful response echoing the request id.
    pub fn result(id: Option<Value>, result: Value) -> Self {
        Self { jsonrpc: default_version(), result: Some(result), error: None, id }
    }

    /// Error response echoing the request id.
    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self { jsonrpc: default_version(), result: None, error: Some(error), id }
    }

    /// Serialize to the wire string. Serialization of these types cannot
    /// fail; a defensive fallback error body is returned if it ever does.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"jsonrpc\":\"2.0\",\"error\":{{\"code\":{},\"message\":\"response serialization failed\"}},\"id\":null}}",
                error_codes::INTERNAL_ERROR
            )
        })
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("code: {code}. {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// `-32000` internal error with a human message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self { code: error_codes::INTERNAL_ERROR, message: message.into(), data: None }
    }

    /// `-32601` for an unregistered method.
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: error_codes::METHOD_NOT_FOUND,
            message: format!("Method {method} not found"),
            data: None,
        }
    }

    /// `-32602` for params that do not fit the method.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: error_codes::INVALID_PARAMS, message: message.into(), data: None }
    }

    /// `-32700` for unparseable request bodies.
    pub fn parse_error(err: &serde_json::Error) -> Self {
        Self {
            code: error_codes::PARSE_ERROR,
            message: format!("Parse error: {err}"),
            data: None,
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
