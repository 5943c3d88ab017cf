// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Api-typed stubs and the peer-client factory.

use crate::control::ControlClient;
use crate::service::{ClientError, ServiceClient};
use serde_json::{json, Value};
use std::path::Path;

/// Client for `EchoAPI` peers.
#[derive(Debug)]
pub struct EchoClient {
    client: ServiceClient,
}

impl EchoClient {
    pub async fn connect(internal_endpoint: &Path, identity: &str) -> Result<Self, ClientError> {
        Ok(Self { client: ServiceClient::connect(internal_endpoint, identity).await? })
    }

    pub async fn echo(&mut self, text: &str) -> Result<String, ClientError> {
        let reply = self.client.call("echo", json!([text])).await?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed(reply.to_string()))
    }
}

/// Client for `TextGenerationAPI` peers.
#[derive(Debug)]
pub struct TextGenerationClient {
    client: ServiceClient,
}

impl TextGenerationClient {
    pub async fn connect(internal_endpoint: &Path, identity: &str) -> Result<Self, ClientError> {
        Ok(Self { client: ServiceClient::connect(internal_endpoint, identity).await? })
    }

    pub async fn generate_reply(&mut self, context: Value) -> Result<String, ClientError> {
        let reply = self.client.call("generate_reply", json!([context])).await?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed(reply.to_string()))
    }

    pub async fn get_prompt_template(&mut self) -> Result<String, ClientError> {
        let reply = self.client.call("get_prompt_template", json!([])).await?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed(reply.to_string()))
    }

    pub async fn get_context_template(&mut self) -> Result<Value, ClientError> {
        self.client.call("get_context_template", json!([])).await
    }

    pub async fn get_special_tokens(&mut self) -> Result<Value, ClientError> {
        self.client.call("get_special_tokens", json!([])).await
    }
}

/// Client for `SimilarityAPI` peers.
#[derive(Debug)]
pub struct SimilarityClient {
    client: ServiceClient,
}

impl SimilarityClient {
    pub async fn connect(internal_endpoint: &Path, identity: &str) -> Result<Self, ClientError> {
        Ok(Self { client: ServiceClient::connect(internal_endpoint, identity).await? })
    }

    /// Score `query` against each context sentence.
    pub async fn compare(
        &mut self,
        query: &str,
        context: &[String],
    ) -> Result<Vec<f64>, ClientError> {
        let reply = self.client.call("compare", json!([query, context])).await?;
        Ok(serde_json::from_value(reply)?)
    }
}

/// A stub typed by the peer's api family, with a generic fallback for
/// families this crate has no dedicated wrapper for.
#[derive(Debug)]
pub enum ApiClient {
    Echo(EchoClient),
    TextGeneration(TextGenerationClient),
    Similarity(SimilarityClient),
    Generic(ServiceClient),
}

/// Build a stub for `peer` on behalf of `own_id`.
///
/// Registers the dependency edge with the broker first (the cycle check
/// runs there and may reject the edge), then picks the stub type from the
/// peer's api name.
pub async fn create_client(
    internal_endpoint: &Path,
    own_id: &str,
    peer: &str,
) -> Result<ApiClient, ClientError> {
    let mut control = ControlClient::connect(internal_endpoint).await?;
    control.check_dependency(own_id, peer).await?;
    let metadata = control.get_service_metadata(peer).await?;

    let client = ServiceClient::connect(internal_endpoint, peer).await?;
    Ok(match metadata.api_name.as_str() {
        "EchoAPI" => ApiClient::Echo(EchoClient { client }),
        "TextGenerationAPI" => ApiClient::TextGeneration(TextGenerationClient { client }),
        "SimilarityAPI" => ApiClient::Similarity(SimilarityClient { client }),
        _ => ApiClient::Generic(client),
    })
}
