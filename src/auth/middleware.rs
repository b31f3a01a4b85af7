// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorizer middleware for Axum.
//!
//! This is the in-process counterpart of the gateway integration: every
//! request to a guarded router is authorized for its own method and path,
//! and only an Allow for exactly that resource reaches the handler. The
//! admitted principal is placed in request extensions for the
//! [`Principal`](super::extractor::Principal) extractor.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/stats", post(add_player_stats))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         require_principal,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::Principal;
use super::request::RawRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// Resource identifier for an in-process request: `"<METHOD> <path>"`.
pub fn resource_for(request: &Request) -> String {
    format!("{} {}", request.method(), request.uri().path())
}

/// Authorize the request; on Deny answer 401 without calling the handler.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resource = resource_for(&request);
    let raw = RawRequest::from_header_map(resource.clone(), request.headers());

    let decision = state.authorizer.authorize(&raw).await;

    match decision.principal_for(&resource) {
        Some(principal) => {
            request
                .extensions_mut()
                .insert(Principal(principal.to_string()));
            next.run(request).await
        }
        None => ApiError::unauthorized().into_response(),
    }
}
