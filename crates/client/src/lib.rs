// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! npc-client: stubs workers use to call their peers through the broker's
//! internal endpoint.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod api;
mod control;
mod service;

pub use api::{create_client, ApiClient, EchoClient, SimilarityClient, TextGenerationClient};
pub use control::ControlClient;
pub use service::{ClientError, ServiceClient};
