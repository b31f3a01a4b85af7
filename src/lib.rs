// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stats Authorizer - request authorizer for the player stats API
//!
//! Guards the mutating stats endpoints: the credential in the `token` cookie
//! is verified against the identity provider's published signing keys and
//! turned into an allow/deny decision scoped to the invoked resource.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum): gateway authorizer endpoint, health
//! - `auth` - credential extraction, key cache, verification, decisions
//! - `config` - environment configuration
//! - `telemetry` - tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;
