// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access decisions and their gateway policy rendering.
//!
//! A decision is always bound to the resource it was computed for. An Allow
//! can only be built from a [`JwtToken`], which itself can only come out of a
//! successful verification.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::claims::JwtToken;
use super::error::DenyReason;

/// Policy language version expected by the gateway.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action guarded by the gateway's authorizer.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Principal id reported for denied requests.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Effect {
    Allow,
    Deny,
}

/// Data passed through to the downstream handler on Allow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DecisionContext {
    pub principal: String,
}

/// Allow/deny verdict for one resource.
///
/// Serializes as `{ "effect", "resource", "context"?: { "principal" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessDecision {
    effect: Effect,
    resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<DecisionContext>,
}

impl AccessDecision {
    /// Turn a verification outcome into a decision for `resource`.
    pub fn build(outcome: &Result<JwtToken, DenyReason>, resource: &str) -> Self {
        match outcome {
            Ok(token) => Self {
                effect: Effect::Allow,
                resource: resource.to_string(),
                context: Some(DecisionContext {
                    principal: token.subject().to_string(),
                }),
            },
            Err(_) => Self::deny(resource),
        }
    }

    pub fn deny(resource: &str) -> Self {
        Self {
            effect: Effect::Deny,
            resource: resource.to_string(),
            context: None,
        }
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn context(&self) -> Option<&DecisionContext> {
        self.context.as_ref()
    }

    /// The principal admitted to `resource`, if this decision allows exactly
    /// that resource. A decision computed for another resource yields `None`.
    pub fn principal_for(&self, resource: &str) -> Option<&str> {
        if self.effect != Effect::Allow || self.resource != resource {
            return None;
        }
        self.context.as_ref().map(|c| c.principal.as_str())
    }
}

/// One statement of a gateway policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

/// The gateway's authorizer response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPolicy {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, String>>,
}

impl From<&AccessDecision> for GatewayPolicy {
    fn from(decision: &AccessDecision) -> Self {
        let principal = decision.context.as_ref().map(|c| c.principal.clone());

        Self {
            principal_id: principal
                .clone()
                .unwrap_or_else(|| ANONYMOUS_PRINCIPAL.to_string()),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![PolicyStatement {
                    action: INVOKE_ACTION.to_string(),
                    effect: decision.effect,
                    resource: decision.resource.clone(),
                }],
            },
            context: principal.map(|p| HashMap::from([("principal".to_string(), p)])),
        }
    }
}
