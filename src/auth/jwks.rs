// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key set fetching and caching.
//!
//! ## Concurrency contract
//!
//! - Hits take a shared read lock and never touch the network.
//! - A miss refreshes the whole key set. Refreshes are serialized through a
//!   single mutex and counted by a generation number: a caller that missed
//!   while another caller's refresh was in flight waits for that refresh and
//!   reuses its outcome instead of fetching again.
//! - There is no TTL. The set is refreshed only when a `kid` is missing, which
//!   is how key rotation shows up. Failures are not cached.
//! - Every fetch is bounded by `fetch_timeout`; a hung endpoint becomes a
//!   lookup failure, never a hung invocation.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::error::KeyFetchError;

/// Default bound on a single key-set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// One public signing key from the provider's key set.
#[derive(Clone)]
pub struct SigningKeyEntry {
    pub kid: String,
    pub algorithm: Algorithm,
    pub key: DecodingKey,
}

impl fmt::Debug for SigningKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKeyEntry")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Source of the full key set. The HTTP implementation is the production
/// one; tests substitute a deterministic fake.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<SigningKeyEntry>, KeyFetchError>;
}

/// Fetches the identity provider's published JWKS document over HTTPS.
#[derive(Clone, Debug)]
pub struct HttpKeySetFetcher {
    jwks_url: String,
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// # Arguments
    /// - `jwks_url`: e.g. `https://cognito-idp.eu-west-1.amazonaws.com/<pool>/.well-known/jwks.json`
    /// - `timeout`: per-request bound, shorter than the invocation budget
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, KeyFetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| KeyFetchError::Transport(e.to_string()))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            client,
        })
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self) -> Result<Vec<SigningKeyEntry>, KeyFetchError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    KeyFetchError::Timeout
                } else {
                    KeyFetchError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeyFetchError::Transport(e.to_string()))?;

        parse_key_set(&body)
    }
}

/// Parse a JWKS document. Keys without a `kid`, keys published for a use
/// other than `sig`, or of a type that cannot be used for verification, are
/// skipped.
pub fn parse_key_set(body: &[u8]) -> Result<Vec<SigningKeyEntry>, KeyFetchError> {
    let jwks: JwkSet =
        serde_json::from_slice(body).map_err(|e| KeyFetchError::Malformed(e.to_string()))?;

    let entries = jwks
        .keys
        .iter()
        .filter_map(|jwk| match jwk_to_entry(jwk) {
            Some(entry) => Some(entry),
            None => {
                tracing::debug!(kid = ?jwk.common.key_id, "skipping unusable key set entry");
                None
            }
        })
        .collect();

    Ok(entries)
}

/// Convert a JWK into a cache entry.
fn jwk_to_entry(jwk: &Jwk) -> Option<SigningKeyEntry> {
    let kid = jwk.common.key_id.clone()?;

    // Encryption keys never verify signatures.
    if matches!(&jwk.common.public_key_use, Some(usage) if *usage != PublicKeyUse::Signature) {
        return None;
    }

    let (key, algorithm) = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e).ok()?;
            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS256) | None => Algorithm::RS256,
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                Some(_) => return None,
            };
            (key, alg)
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y).ok()?;
            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES256) | None => Algorithm::ES256,
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                Some(_) => return None,
            };
            (key, alg)
        }
        _ => return None,
    };

    Some(SigningKeyEntry {
        kid,
        algorithm,
        key,
    })
}

/// Why a key lookup produced no key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLookupError {
    /// The key set was fetched (by this caller or a concurrent one) and does
    /// not contain the `kid`.
    NotFound,
    /// This caller's refresh failed.
    FetchFailed(KeyFetchError),
}

struct CacheState {
    keys: HashMap<String, Arc<SigningKeyEntry>>,
    fetched_at: Option<Instant>,
}

/// Process-wide signing key cache keyed by `kid`.
pub struct KeySetCache {
    fetcher: Arc<dyn KeySetFetcher>,
    fetch_timeout: Duration,
    state: RwLock<CacheState>,
    /// Held for the duration of a refresh.
    refresh: Mutex<()>,
    /// Bumped after every completed refresh attempt, successful or not.
    generation: AtomicU64,
}

impl fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetCache")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl KeySetCache {
    pub fn new(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self {
            fetcher,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: RwLock::new(CacheState {
                keys: HashMap::new(),
                fetched_at: None,
            }),
            refresh: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create with a custom fetch bound.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Resolve a signing key, refreshing the set at most once on a miss.
    pub async fn get_key(&self, kid: &str) -> Result<Arc<SigningKeyEntry>, KeyLookupError> {
        // Read the generation before the cache so that a refresh completing
        // in between is seen either as a hit or as a changed generation.
        let observed = self.generation.load(Ordering::Acquire);

        if let Some(entry) = self.lookup(kid).await {
            return Ok(entry);
        }

        let _guard = self.refresh.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            // Someone else refreshed while we waited; share their outcome.
            return self.lookup(kid).await.ok_or(KeyLookupError::NotFound);
        }
        if let Some(entry) = self.lookup(kid).await {
            return Ok(entry);
        }

        let result = self.refresh_locked().await;
        self.generation.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(()) => self.lookup(kid).await.ok_or(KeyLookupError::NotFound),
            Err(e) => Err(KeyLookupError::FetchFailed(e)),
        }
    }

    /// Whether at least one refresh has succeeded in this process.
    pub async fn is_warm(&self) -> bool {
        self.state.read().await.fetched_at.is_some()
    }

    /// Number of cached keys.
    pub async fn len(&self) -> usize {
        self.state.read().await.keys.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, kid: &str) -> Option<Arc<SigningKeyEntry>> {
        self.state.read().await.keys.get(kid).cloned()
    }

    /// Fetch and replace the key set. Caller must hold `self.refresh`.
    async fn refresh_locked(&self) -> Result<(), KeyFetchError> {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch())
            .await
            .map_err(|_| KeyFetchError::Timeout)
            .and_then(|r| r);

        let entries = match fetched {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "signing key set refresh failed");
                return Err(e);
            }
        };

        let keys: HashMap<_, _> = entries
            .into_iter()
            .map(|entry| (entry.kid.clone(), Arc::new(entry)))
            .collect();

        tracing::info!(key_count = keys.len(), "signing key set refreshed");

        let mut state = self.state.write().await;
        state.keys = keys;
        state.fetched_at = Some(Instant::now());
        Ok(())
    }
}
