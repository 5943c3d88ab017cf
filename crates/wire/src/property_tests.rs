// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Round-trip properties for the JSON-RPC types and frame codec.

use crate::{read_envelope, read_message, write_envelope, write_message, RpcRequest};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_id() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u32>().prop_map(Value::from),
        "[a-z0-9-]{1,12}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn request_encode_decode_is_identity(
        method in "[a-z_]{1,24}",
        text in ".{0,64}",
        number in any::<i64>(),
        id in arb_id(),
    ) {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            method,
            params: json!([text, number]),
            id: Some(id),
        };
        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: RpcRequest = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, request);
    }

    #[test]
    fn frame_round_trip_preserves_bytes(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let mut buffer = Vec::new();
            write_message(&mut buffer, &payload).await.unwrap();
            let mut cursor = std::io::Cursor::new(buffer);
            let read_back = read_message(&mut cursor).await.unwrap();
            assert_eq!(read_back, payload);
        });
    }

    #[test]
    fn envelope_round_trip_preserves_frames(
        identity in proptest::collection::vec(any::<u8>(), 0..64),
        body in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let mut buffer = Vec::new();
            write_envelope(&mut buffer, &identity, &body).await.unwrap();
            let mut cursor = std::io::Cursor::new(buffer);
            let (read_identity, read_body) = read_envelope(&mut cursor).await.unwrap();
            assert_eq!(read_identity, identity);
            assert_eq!(read_body, body);
        });
    }
}
