// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified token representation.

use serde::Deserialize;

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Claims as they appear in the payload.
///
/// Only deserialized after the signature has been verified. Required fields
/// have no serde default: a missing one fails deserialization and the
/// credential is treated as malformed.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Present on ID tokens.
    #[serde(default)]
    pub aud: Option<Audience>,
    /// Present on access tokens, which carry no `aud`.
    #[serde(default)]
    pub client_id: Option<String>,
    /// `id` or `access`.
    #[serde(default)]
    pub token_use: Option<String>,
}

/// A credential that passed every verification stage.
///
/// Constructed only by the token verifier; there is no public constructor, so
/// holding one is proof that signature, expiry, issuer and audience checks
/// all succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtToken {
    subject: String,
    issuer: String,
    audience: String,
    token_use: Option<String>,
    expires_at: i64,
    issued_at: i64,
    key_id: String,
}

impl JwtToken {
    pub(crate) fn from_verified(claims: RawClaims, audience: String, key_id: String) -> Self {
        Self {
            subject: claims.sub,
            issuer: claims.iss,
            audience,
            token_use: claims.token_use,
            expires_at: claims.exp,
            issued_at: claims.iat,
            key_id,
        }
    }

    /// The verified `sub`, used downstream as the principal.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The audience value that matched (`aud` or `client_id`).
    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn token_use(&self) -> Option<&str> {
        self.token_use.as_deref()
    }

    /// Unix seconds.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Unix seconds.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// The `kid` from the credential header.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}
