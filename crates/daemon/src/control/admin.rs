// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative method table served under the `control` pseudo-id.

use super::{ControlError, ControlService};
use npc_wire::{str_param, Dispatcher, RpcError};
use serde_json::Value;

/// Build the admin dispatcher. Params are accepted positionally or by
/// name; every failure maps to a `-32000` error carrying the message a
/// client matches on.
pub(super) fn dispatcher() -> Dispatcher<ControlService> {
    let mut dispatcher: Dispatcher<ControlService> = Dispatcher::new();

    dispatcher.register("get_services_metadata", |control, _params| {
        let metadata = control.services_metadata().map_err(admin_error)?;
        serde_json::to_value(metadata).map_err(|e| RpcError::internal(e.to_string()))
    });

    dispatcher.register("get_service_metadata", |control, params| {
        let id = str_param(params, 0, "service_id")?;
        let metadata = control.service_metadata(id).map_err(admin_error)?;
        serde_json::to_value(metadata).map_err(|e| RpcError::internal(e.to_string()))
    });

    dispatcher.register("get_service_status", |control, params| {
        let id = str_param(params, 0, "service_id")?;
        let state = control.get_service_status(id).map_err(admin_error)?;
        Ok(Value::from(state.as_str()))
    });

    dispatcher.register("start_service", |control, params| {
        let id = str_param(params, 0, "service_id")?;
        control.start_service(id).map_err(admin_error)?;
        Ok(Value::Null)
    });

    dispatcher.register("stop_service", |control, params| {
        let id = str_param(params, 0, "service_id")?;
        control.stop_service(id).map_err(admin_error)?;
        Ok(Value::Null)
    });

    dispatcher.register("restart_service", |control, params| {
        let id = str_param(params, 0, "service_id")?;
        control.restart_service(id).map_err(admin_error)?;
        Ok(Value::Null)
    });

    dispatcher.register("check_dependency", |control, params| {
        let id = str_param(params, 0, "service_id")?;
        let dependency = str_param(params, 1, "dependency")?;
        control.check_dependency(id, dependency).map_err(admin_error)?;
        Ok(Value::Null)
    });

    dispatcher
}

fn admin_error(error: ControlError) -> RpcError {
    RpcError::internal(error.to_string())
}
