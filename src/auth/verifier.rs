// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verification.
//!
//! Stages run in a fixed order and stop at the first failure:
//!
//! 1. structure and header (`MalformedCredential`)
//! 2. declared algorithm equals the configured one (`UnsupportedAlgorithm`)
//! 3. `kid` resolves through the key cache (`UnknownSigningKey` / `KeyFetchFailed`)
//! 4. signature (`SignatureInvalid`)
//! 5. claims: `exp`, then `iss`, then `token_use`/audience
//!
//! `jsonwebtoken` is used for signature checking only; every claim check is
//! done here so that the order above, and the error each stage reports, stay
//! under our control.

use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::{JwtToken, RawClaims};
use super::error::VerificationError;
use super::jwks::{KeyLookupError, KeySetCache};

/// Verifies credentials against keys from a shared [`KeySetCache`].
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    algorithm: Algorithm,
    required_token_use: Option<String>,
}

impl TokenVerifier {
    /// `algorithm` is the only algorithm accepted for this issuer.
    pub fn new(keys: Arc<KeySetCache>, algorithm: Algorithm) -> Self {
        Self {
            keys,
            algorithm,
            required_token_use: None,
        }
    }

    /// Also require the `token_use` claim to equal `token_use`.
    pub fn with_token_use(mut self, token_use: impl Into<String>) -> Self {
        self.required_token_use = Some(token_use.into());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Verify against the current wall clock.
    pub async fn verify(
        &self,
        credential: &str,
        expected_issuer: &str,
        expected_audience: &str,
    ) -> Result<JwtToken, VerificationError> {
        let now = chrono::Utc::now().timestamp();
        self.verify_at(credential, expected_issuer, expected_audience, now)
            .await
    }

    /// Verify with `now` (Unix seconds) as the current time.
    pub async fn verify_at(
        &self,
        credential: &str,
        expected_issuer: &str,
        expected_audience: &str,
        now: i64,
    ) -> Result<JwtToken, VerificationError> {
        if !has_three_segments(credential) {
            return Err(VerificationError::MalformedCredential);
        }

        let header = decode_header(credential).map_err(|_| VerificationError::MalformedCredential)?;

        if header.alg != self.algorithm {
            return Err(VerificationError::UnsupportedAlgorithm);
        }

        let kid = header
            .kid
            .filter(|k| !k.is_empty())
            .ok_or(VerificationError::MalformedCredential)?;

        let entry = self.keys.get_key(&kid).await.map_err(|e| match e {
            KeyLookupError::NotFound => VerificationError::UnknownSigningKey,
            KeyLookupError::FetchFailed(_) => VerificationError::KeyFetchFailed,
        })?;

        // A key published for a different algorithm cannot vouch for this one.
        if entry.algorithm != self.algorithm {
            return Err(VerificationError::UnsupportedAlgorithm);
        }

        let claims = decode::<RawClaims>(credential, &entry.key, &signature_only(self.algorithm))
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerificationError::SignatureInvalid,
                ErrorKind::InvalidAlgorithm => VerificationError::UnsupportedAlgorithm,
                _ => VerificationError::MalformedCredential,
            })?
            .claims;

        if claims.exp <= now {
            return Err(VerificationError::TokenExpired);
        }

        if claims.iss != expected_issuer {
            return Err(VerificationError::IssuerMismatch);
        }

        if let Some(required) = &self.required_token_use {
            if claims.token_use.as_deref() != Some(required.as_str()) {
                return Err(VerificationError::AudienceMismatch);
            }
        }

        let audience_ok = match (&claims.aud, &claims.client_id) {
            // ID tokens: `aud` decides, `client_id` is not consulted.
            (Some(aud), _) => aud.contains(expected_audience),
            (None, Some(client_id)) => client_id == expected_audience,
            (None, None) => false,
        };
        if !audience_ok {
            return Err(VerificationError::AudienceMismatch);
        }

        Ok(JwtToken::from_verified(
            claims,
            expected_audience.to_string(),
            kid,
        ))
    }
}

fn has_three_segments(credential: &str) -> bool {
    let mut count = 0;
    for segment in credential.split('.') {
        if segment.is_empty() {
            return false;
        }
        count += 1;
    }
    count == 3
}

/// Signature and algorithm checks only; claim validation is ours.
fn signature_only(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}
