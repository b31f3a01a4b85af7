// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Authorizer
//!
//! Decides, for one guarded invocation, whether the caller is admitted.
//!
//! ## Flow
//!
//! 1. The gateway (or [`middleware::require_principal`]) hands over the
//!    request headers and the resource being invoked
//! 2. The credential is read from the `token` cookie
//! 3. The credential is verified against the identity provider's key set:
//!    - algorithm must be the configured one
//!    - `kid` is resolved through a process-wide cache, refreshed on miss
//!    - signature, then `exp`, `iss`, `token_use`/audience, in that order
//! 4. The outcome becomes an Allow (carrying `sub` as principal) or a Deny,
//!    scoped to that resource
//!
//! ## Security
//!
//! - Failure reasons are logged, never returned
//! - Only asymmetric algorithms are accepted; the header cannot choose
//! - No clock skew allowance on `exp`
//! - Key set fetches are bounded by a timeout and coalesced across callers

pub mod claims;
pub mod cookies;
pub mod decision;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod request;
pub mod service;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::JwtToken;
pub use decision::{
    AccessDecision, DecisionContext, Effect, GatewayPolicy, PolicyDocument, PolicyStatement,
};
pub use error::{DenyReason, KeyFetchError, VerificationError};
pub use extractor::Principal;
pub use jwks::{HttpKeySetFetcher, KeySetCache, KeySetFetcher, SigningKeyEntry};
pub use request::RawRequest;
pub use service::AuthorizerService;
pub use verifier::TokenVerifier;
