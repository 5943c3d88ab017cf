// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Method table mapping JSON-RPC method names to handlers.
//!
//! The dispatcher is the response manager: it parses a raw request string,
//! routes it to the registered handler, and serializes the matching
//! response, including protocol-level errors (parse failure, unknown
//! method). Handlers receive a caller-supplied context so the same type
//! serves both the worker loop (context = the service instance) and the
//! control service (context = the broker state).

use crate::rpc::{RpcError, RpcRequest, RpcResponse};
use serde_json::Value;
use std::collections::HashMap;

type Handler<C> = Box<dyn Fn(&mut C, &Value) -> Result<Value, RpcError> + Send + Sync>;

/// Method name → handler table.
pub struct Dispatcher<C> {
    handlers: HashMap<String, Handler<C>>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dispatcher<C> {
    /// Empty dispatcher.
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Register a handler for `method`, replacing any previous one.
    pub fn register<F>(&mut self, method: impl Into<String>, handler: F)
    where
        F: Fn(&mut C, &Value) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.handlers.insert(method.into(), Box::new(handler));
    }

    /// Whether `method` has a registered handler.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Handle a raw request string and return the serialized response.
    pub fn handle(&self, ctx: &mut C, raw: &str) -> String {
        let request: RpcRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => return RpcResponse::error(None, RpcError::parse_error(&e)).to_json(),
        };
        let id = request.id.clone();
        match self.handlers.get(&request.method) {
            Some(handler) => match handler(ctx, &request.params) {
                Ok(result) => RpcResponse::result(id, result).to_json(),
                Err(error) => RpcResponse::error(id, error).to_json(),
            },
            None => {
                RpcResponse::error(id, RpcError::method_not_found(&request.method)).to_json()
            }
        }
    }
}

/// Extract a positional-or-named string param.
///
/// Control and worker methods accept `params` either as an array
/// (positional, the form the bundled clients send) or as an object keyed
/// by parameter name.
pub fn str_param<'a>(params: &'a Value, index: usize, name: &str) -> Result<&'a str, RpcError> {
    let value = match params {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.get(name),
        _ => None,
    };
    value
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(format!("missing string param {name}")))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
