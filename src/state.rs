// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthorizerService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub authorizer: Arc<AuthorizerService>,
}

impl AppState {
    pub fn new(authorizer: AuthorizerService) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
        }
    }
}
