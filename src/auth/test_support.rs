// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixtures shared by the auth unit tests: RSA test keys, a token minting
//! helper and an in-memory key set fetcher that counts its calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};

use super::error::KeyFetchError;
use super::jwks::{KeySetCache, KeySetFetcher, SigningKeyEntry};

pub struct TestKey {
    pub kid: &'static str,
    pub modulus: &'static str,
    pub private_pem: &'static str,
}

pub const K1: TestKey = TestKey {
    kid: "K1",
    modulus: "sC7iJrqClYMvcDLanw670duH80T1VX2pMrSmrMFSohlMVD9_g8QwBAPlZXfZtuzprrpUJvpYSUUXtkLnRroq52sfbMoVF-129GFR_s2sKWXSABZ1mqEwqqDdZvRWs9r17AkyB-f0UyPMfqusWibGeqPZIe2rYBvwJ8DttkdR8i7MYyA5S3IUA9an1FH6Tx_ggK_05cxjEB7IQgJ-3w8wxxbH9Xh45Tu9hTsczpLqvFtLIsiphOo8I2m1lyIUPXcVUsxdgV_ZyKBJDgZESEK2LfvBkeWCS4WY4gJe3euUMqNZWywnqH0fL0b30hiRWJWM-XY4HAnCebGYlzbA7UFmFQ",
    private_pem: include_str!("../../tests/fixtures/signing_key_k1.pem"),
};

pub const K2: TestKey = TestKey {
    kid: "K2",
    modulus: "nbawjoaac7YYFmmRVGDEwTgg3BTV6G4wM-jQJ79yCDzUi-PWrExyZH3W0Z6sME1Ajc4h8n7x3Md8WrmoX_cH9xJ9unIDKjqMg0gxZA5Uyy69uKOcWW3JZ_2ZsEM2Sb-T3df19RgtW6dv_OaH09zHg8j-2ssBYNWOrkHyPJyJoolY4nJKb_Xp96GOg23M2Su5KA1zArXm8U1mzyS8ldiSqJZtAr4n11UYwyJpYfV18YoSh1AEHFINNp-xywfLDNmnHn2S_4DzpSIB4Gj8F2vjcejcJCSF94M1A-fBevo8SR21LCNxaqqDViXaMmD9xhN_Sb_7Tm5Lb79jkSOOlEVvAw",
    private_pem: include_str!("../../tests/fixtures/signing_key_k2.pem"),
};

pub const ISSUER: &str = "pool-123";
pub const AUDIENCE: &str = "client-abc";
pub const SUBJECT: &str = "5f1c7a2e-user";

pub fn rsa_public_entry(key: TestKey) -> SigningKeyEntry {
    SigningKeyEntry {
        kid: key.kid.to_string(),
        algorithm: Algorithm::RS256,
        key: DecodingKey::from_rsa_components(key.modulus, "AQAB").unwrap(),
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims that pass every check against `ISSUER`/`AUDIENCE`.
pub fn valid_claims() -> Value {
    let now = now();
    json!({
        "sub": SUBJECT,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "token_use": "id",
        "iat": now,
        "exp": now + 3600,
    })
}

/// Sign `claims` with `key`, putting `kid` in the header.
pub fn sign_with_kid(key: &TestKey, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let encoding_key = EncodingKey::from_rsa_pem(key.private_pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, claims, &encoding_key).unwrap()
}

pub fn sign(key: &TestKey, claims: &Value) -> String {
    sign_with_kid(key, key.kid, claims)
}

/// In-memory key set source with a call counter.
pub struct CountingFetcher {
    outcome: Mutex<Result<Vec<SigningKeyEntry>, KeyFetchError>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingFetcher {
    pub fn new(keys: Vec<SigningKeyEntry>) -> Self {
        Self {
            outcome: Mutex::new(Ok(keys)),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: KeyFetchError) -> Self {
        Self {
            outcome: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_keys(&self, keys: Vec<SigningKeyEntry>) {
        *self.outcome.lock().unwrap() = Ok(keys);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetFetcher for CountingFetcher {
    async fn fetch(&self) -> Result<Vec<SigningKeyEntry>, KeyFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }
}

/// A cache backed by a counting fetcher that serves K1 only.
pub fn k1_cache() -> (Arc<KeySetCache>, Arc<CountingFetcher>) {
    let fetcher = Arc::new(CountingFetcher::new(vec![rsa_public_entry(K1)]));
    let cache = Arc::new(KeySetCache::new(fetcher.clone()));
    (cache, fetcher)
}
