// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the broker's administrative surface.

use crate::service::{ClientError, ServiceClient};
use npc_core::{ServiceMetadata, CONTROL_SERVICE};
use serde_json::{json, Value};
use std::path::Path;

/// Stub whose identity is the `control` pseudo-id; one method per admin
/// call.
pub struct ControlClient {
    client: ServiceClient,
}

impl ControlClient {
    pub async fn connect(internal_endpoint: &Path) -> Result<Self, ClientError> {
        Ok(Self { client: ServiceClient::connect(internal_endpoint, CONTROL_SERVICE).await? })
    }

    pub async fn start_service(&mut self, service_id: &str) -> Result<(), ClientError> {
        self.client.call("start_service", json!([service_id])).await?;
        Ok(())
    }

    pub async fn stop_service(&mut self, service_id: &str) -> Result<(), ClientError> {
        self.client.call("stop_service", json!([service_id])).await?;
        Ok(())
    }

    pub async fn restart_service(&mut self, service_id: &str) -> Result<(), ClientError> {
        self.client.call("restart_service", json!([service_id])).await?;
        Ok(())
    }

    pub async fn get_service_status(&mut self, service_id: &str) -> Result<String, ClientError> {
        let reply = self.client.call("get_service_status", json!([service_id])).await?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed(reply.to_string()))
    }

    pub async fn get_services_metadata(
        &mut self,
    ) -> Result<Vec<ServiceMetadata>, ClientError> {
        let reply = self.client.call("get_services_metadata", Value::Null).await?;
        Ok(serde_json::from_value(reply)?)
    }

    pub async fn get_service_metadata(
        &mut self,
        service_id: &str,
    ) -> Result<ServiceMetadata, ClientError> {
        let reply = self.client.call("get_service_metadata", json!([service_id])).await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// Declare that `service_id` depends on `dependency`. Fails when the
    /// new edge closes a cycle.
    pub async fn check_dependency(
        &mut self,
        service_id: &str,
        dependency: &str,
    ) -> Result<(), ClientError> {
        self.client.call("check_dependency", json!([service_id, dependency])).await?;
        Ok(())
    }
}
