// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request orchestration: extract, verify, decide.

use std::sync::Arc;

use super::claims::JwtToken;
use super::cookies::extract_credential;
use super::decision::AccessDecision;
use super::error::DenyReason;
use super::jwks::{HttpKeySetFetcher, KeySetCache};
use super::request::RawRequest;
use super::verifier::TokenVerifier;
use crate::config::{AuthConfig, ConfigError};

/// The authorizer. Cheap to share behind an `Arc`; the only mutable state
/// is the key cache, which has its own concurrency contract.
#[derive(Debug, Clone)]
pub struct AuthorizerService {
    verifier: TokenVerifier,
    keys: Arc<KeySetCache>,
    issuer: String,
    audience: String,
    cookie_name: String,
}

impl AuthorizerService {
    /// Wire the service around an existing key cache.
    pub fn new(config: &AuthConfig, keys: Arc<KeySetCache>) -> Self {
        let mut verifier = TokenVerifier::new(keys.clone(), config.algorithm);
        if let Some(token_use) = &config.token_use {
            verifier = verifier.with_token_use(token_use.clone());
        }

        Self {
            verifier,
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            cookie_name: config.cookie_name.clone(),
        }
    }

    /// Production wiring: key cache backed by the provider's JWKS endpoint.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let fetcher = HttpKeySetFetcher::new(&config.jwks_url, config.fetch_timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let keys = KeySetCache::new(Arc::new(fetcher)).with_fetch_timeout(config.fetch_timeout);
        Ok(Self::new(config, Arc::new(keys)))
    }

    pub fn key_cache(&self) -> &KeySetCache {
        &self.keys
    }

    /// Produce exactly one decision for `request`. Never fails: every
    /// problem with the credential becomes a Deny.
    pub async fn authorize(&self, request: &RawRequest) -> AccessDecision {
        let resource = request.resource();
        let outcome = self.verify_request(request).await;
        let decision = AccessDecision::build(&outcome, resource);

        match &outcome {
            Ok(token) => tracing::info!(
                resource,
                principal = token.subject(),
                kid = token.key_id(),
                "request authorized"
            ),
            Err(reason) => tracing::warn!(resource, reason = reason.code(), "request denied"),
        }

        decision
    }

    async fn verify_request(&self, request: &RawRequest) -> Result<JwtToken, DenyReason> {
        let credential =
            extract_credential(request, &self.cookie_name).ok_or(DenyReason::NoCredential)?;

        let token = self
            .verifier
            .verify(&credential, &self.issuer, &self.audience)
            .await?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::decision::Effect;
    use crate::auth::test_support::{
        k1_cache, now, sign, sign_with_kid, valid_claims, AUDIENCE, ISSUER, K1, K2, SUBJECT,
    };

    const RESOURCE: &str = "arn:aws:execute-api:eu-west-1:123456789012:api/prod/POST/stats";

    fn service() -> (AuthorizerService, Arc<crate::auth::test_support::CountingFetcher>) {
        let (cache, fetcher) = k1_cache();
        let config = AuthConfig::for_issuer(ISSUER, AUDIENCE, "https://idp.invalid/jwks.json");
        (AuthorizerService::new(&config, cache), fetcher)
    }

    fn cookie_request(token: &str) -> RawRequest {
        RawRequest::new(RESOURCE, [("Cookie", format!("theme=dark; token={token}"))])
    }

    #[tokio::test]
    async fn valid_credential_is_allowed_with_principal() {
        let (service, fetcher) = service();
        let decision = service
            .authorize(&cookie_request(&sign(&K1, &valid_claims())))
            .await;

        assert_eq!(decision.effect(), Effect::Allow);
        assert_eq!(decision.principal_for(RESOURCE), Some(SUBJECT));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn no_cookie_header_is_denied_without_network() {
        let (service, fetcher) = service();
        let decision = service
            .authorize(&RawRequest::new(RESOURCE, Vec::<(String, String)>::new()))
            .await;

        assert_eq!(decision.effect(), Effect::Deny);
        assert_eq!(decision.resource(), RESOURCE);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn missing_token_cookie_is_denied_without_network() {
        let (service, fetcher) = service();
        let request = RawRequest::new(RESOURCE, [("cookie", "session=abc")]);

        assert_eq!(service.authorize(&request).await.effect(), Effect::Deny);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn expired_credential_is_denied() {
        let (service, _) = service();
        let mut claims = valid_claims();
        claims["exp"] = (now() - 1).into();

        let decision = service.authorize(&cookie_request(&sign(&K1, &claims))).await;
        assert_eq!(decision.effect(), Effect::Deny);
        assert!(decision.context().is_none());
    }

    #[tokio::test]
    async fn unknown_key_is_denied_after_one_refresh() {
        let (service, fetcher) = service();
        let token = sign_with_kid(&K2, "K9", &valid_claims());

        assert_eq!(service.authorize(&cookie_request(&token)).await.effect(), Effect::Deny);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn tampered_signature_is_denied() {
        let (service, _) = service();
        let token = sign(&K1, &valid_claims());
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut sig = sig.to_string();
        let last = sig.pop().unwrap();
        sig.push(if last == 'A' { 'B' } else { 'A' });
        let tampered = format!("{head}.{sig}");

        assert_eq!(service.authorize(&cookie_request(&tampered)).await.effect(), Effect::Deny);
    }

    #[tokio::test]
    async fn url_encoded_cookie_value_is_decoded() {
        let (service, _) = service();
        let token = sign(&K1, &valid_claims()).replace('.', "%2E");

        assert_eq!(service.authorize(&cookie_request(&token)).await.effect(), Effect::Allow);
    }

    #[tokio::test]
    async fn configured_cookie_name_is_used() {
        let (cache, _) = k1_cache();
        let mut config = AuthConfig::for_issuer(ISSUER, AUDIENCE, "https://idp.invalid/jwks.json");
        config.cookie_name = "id_token".into();
        let service = AuthorizerService::new(&config, cache);

        let token = sign(&K1, &valid_claims());
        let under_default = RawRequest::new(RESOURCE, [("cookie", format!("token={token}"))]);
        let under_custom = RawRequest::new(RESOURCE, [("cookie", format!("id_token={token}"))]);

        assert_eq!(service.authorize(&under_default).await.effect(), Effect::Deny);
        assert_eq!(service.authorize(&under_custom).await.effect(), Effect::Allow);
    }
}
