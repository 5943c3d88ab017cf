// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 wire protocol for broker communication.
//!
//! Frame format: 4-byte length prefix (big-endian) + payload. Routed
//! messages are envelopes of three frames: identity, empty delimiter, body.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod dispatcher;
mod frame;
mod rpc;

pub use dispatcher::{str_param, Dispatcher};
pub use frame::{
    decode_identity, read_envelope, read_message, write_envelope, write_message, ProtocolError,
    MAX_FRAME_LEN,
};
pub use rpc::{
    error_codes, RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION,
};

#[cfg(test)]
mod property_tests;
