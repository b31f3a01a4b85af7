// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway REQUEST-authorizer endpoint.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{GatewayPolicy, RawRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// The only authorizer event type this endpoint serves.
pub const REQUEST_EVENT_TYPE: &str = "REQUEST";

/// The event the gateway sends for each guarded invocation.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    /// `REQUEST` when present; any other type is rejected.
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    /// The method ARN being invoked; the decision is scoped to it.
    pub method_arn: String,
    /// Request headers. Names are matched case-insensitively.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

/// Authorize one gateway invocation.
///
/// Always answers 200 with a policy; a denied credential is a Deny policy,
/// not an HTTP error. Only an event without a method ARN, or of a type other
/// than `REQUEST`, is rejected.
#[utoipa::path(
    post,
    path = "/v1/authorize",
    tag = "Authorizer",
    request_body = AuthorizerEvent,
    responses(
        (status = 200, description = "Allow or Deny policy for the method ARN", body = GatewayPolicy),
        (status = 400, description = "Event is not a valid authorizer event", body = crate::error::ErrorBody)
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    event: Result<Json<AuthorizerEvent>, JsonRejection>,
) -> Result<Json<GatewayPolicy>, ApiError> {
    let Json(event) = event.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected authorizer event");
        ApiError::bad_request("invalid authorizer event")
    })?;

    if event.method_arn.trim().is_empty() {
        return Err(ApiError::bad_request("invalid authorizer event"));
    }
    if let Some(event_type) = event.event_type.as_deref() {
        if event_type != REQUEST_EVENT_TYPE {
            tracing::warn!(event_type, "rejected authorizer event of unsupported type");
            return Err(ApiError::bad_request("invalid authorizer event"));
        }
    }

    let request = RawRequest::new(event.method_arn, event.headers.unwrap_or_default());
    let decision = state.authorizer.authorize(&request).await;

    Ok(Json(GatewayPolicy::from(&decision)))
}
