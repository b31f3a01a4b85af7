// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization failure taxonomy.
//!
//! Every variant here is internal. They are logged with their `code()` and
//! then collapse into a single Deny decision; none of them is ever rendered
//! into a response body.

use thiserror::Error;

/// Why a credential failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Not three segments, undecodable header, missing `kid`, or claims that
    /// do not deserialize into the required shape.
    #[error("credential is malformed")]
    MalformedCredential,
    /// Header (or the resolved key) declares an algorithm other than the one
    /// configured for the issuer.
    #[error("credential algorithm is not permitted")]
    UnsupportedAlgorithm,
    /// The `kid` is absent from the key set, even after a refresh.
    #[error("signing key is unknown")]
    UnknownSigningKey,
    /// Signature does not verify against the resolved key.
    #[error("credential signature is invalid")]
    SignatureInvalid,
    #[error("credential has expired")]
    TokenExpired,
    #[error("credential issuer does not match")]
    IssuerMismatch,
    #[error("credential audience does not match")]
    AudienceMismatch,
    /// The key-set refresh failed (network, status, body or timeout).
    #[error("signing key set could not be fetched")]
    KeyFetchFailed,
}

impl VerificationError {
    /// Stable identifier used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::MalformedCredential => "malformed_credential",
            VerificationError::UnsupportedAlgorithm => "unsupported_algorithm",
            VerificationError::UnknownSigningKey => "unknown_signing_key",
            VerificationError::SignatureInvalid => "signature_invalid",
            VerificationError::TokenExpired => "token_expired",
            VerificationError::IssuerMismatch => "issuer_mismatch",
            VerificationError::AudienceMismatch => "audience_mismatch",
            VerificationError::KeyFetchFailed => "key_fetch_failed",
        }
    }
}

/// Why a request was denied: either no credential at all, or a credential
/// that failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("no credential presented")]
    NoCredential,
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NoCredential => "no_credential",
            DenyReason::Verification(e) => e.code(),
        }
    }
}

/// Failure while refreshing the signing key set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFetchError {
    #[error("key set request failed: {0}")]
    Transport(String),
    #[error("key set endpoint returned HTTP {0}")]
    Status(u16),
    #[error("key set document is malformed: {0}")]
    Malformed(String),
    #[error("key set request timed out")]
    Timeout,
}
