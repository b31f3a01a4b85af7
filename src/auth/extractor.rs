// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authorized principal.
//!
//! Use the `Principal` extractor in handlers behind
//! [`require_principal`](super::middleware::require_principal):
//!
//! ```rust,ignore
//! async fn add_player_stats(Principal(user_id): Principal, Json(body): Json<PlayerStats>) {
//!     // stamp `user_id` as the record owner
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// The verified `sub` of the credential that was allowed for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    /// Only the middleware inserts a `Principal`; a handler mounted without it
    /// rejects every request instead of running unauthenticated.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}
