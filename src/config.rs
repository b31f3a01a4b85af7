// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. A missing or
//! invalid value is a deployment defect: the process refuses to start rather
//! than authorize with partial settings.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `USER_POOL_ID` | Identity pool id (issuer suffix) | Required unless `AUTH_ISSUER` |
//! | `REGION` | Identity provider region | Required unless `AUTH_ISSUER` |
//! | `CLIENT_ID` | Expected audience (app client id) | Required |
//! | `AUTH_ISSUER` | Explicit issuer | `https://cognito-idp.{REGION}.amazonaws.com/{USER_POOL_ID}` |
//! | `AUTH_JWKS_URL` | Explicit key set URL | `{issuer}/.well-known/jwks.json` |
//! | `AUTH_COOKIE_NAME` | Cookie carrying the credential | `token` |
//! | `AUTH_TOKEN_USE` | Required `token_use` claim | Not checked |
//! | `AUTH_ALGORITHM` | Permitted signing algorithm | `RS256` |
//! | `JWKS_FETCH_TIMEOUT_MS` | Key set fetch bound | `3000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

pub const USER_POOL_ID_ENV: &str = "USER_POOL_ID";
pub const REGION_ENV: &str = "REGION";
pub const CLIENT_ID_ENV: &str = "CLIENT_ID";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUTH_JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const AUTH_COOKIE_NAME_ENV: &str = "AUTH_COOKIE_NAME";
pub const AUTH_TOKEN_USE_ENV: &str = "AUTH_TOKEN_USE";
pub const AUTH_ALGORITHM_ENV: &str = "AUTH_ALGORITHM";
pub const JWKS_FETCH_TIMEOUT_MS_ENV: &str = "JWKS_FETCH_TIMEOUT_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_COOKIE_NAME: &str = "token";
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("http client could not be built: {0}")]
    HttpClient(String),
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::invalid(LOG_FORMAT_ENV, other)),
        }
    }
}

/// Everything the authorizer needs to reach a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: String,
    pub cookie_name: String,
    pub algorithm: Algorithm,
    pub token_use: Option<String>,
    pub fetch_timeout: Duration,
}

impl AuthConfig {
    /// Defaults for everything except the identity values.
    pub fn for_issuer(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            jwks_url: jwks_url.into(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            algorithm: Algorithm::RS256,
            token_use: None,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let audience = get(CLIENT_ID_ENV).ok_or(ConfigError::Missing(CLIENT_ID_ENV))?;

        let issuer = match get(AUTH_ISSUER_ENV) {
            Some(issuer) => issuer,
            None => {
                let pool = get(USER_POOL_ID_ENV).ok_or(ConfigError::Missing(USER_POOL_ID_ENV))?;
                let region = get(REGION_ENV).ok_or(ConfigError::Missing(REGION_ENV))?;
                cognito_issuer(&region, &pool)
            }
        };

        let jwks_url = get(AUTH_JWKS_URL_ENV)
            .unwrap_or_else(|| format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/')));
        validate_jwks_url(&jwks_url)?;

        let algorithm = match get(AUTH_ALGORITHM_ENV) {
            Some(name) => parse_algorithm(&name)?,
            None => Algorithm::RS256,
        };

        let fetch_timeout = match get(JWKS_FETCH_TIMEOUT_MS_ENV) {
            Some(ms) => {
                let ms: u64 = ms
                    .parse()
                    .map_err(|_| ConfigError::invalid(JWKS_FETCH_TIMEOUT_MS_ENV, ms.clone()))?;
                if ms == 0 {
                    return Err(ConfigError::invalid(JWKS_FETCH_TIMEOUT_MS_ENV, "must be positive"));
                }
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        };

        Ok(Self {
            issuer,
            audience,
            jwks_url,
            cookie_name: get(AUTH_COOKIE_NAME_ENV).unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
            algorithm,
            token_use: get(AUTH_TOKEN_USE_ENV),
            fetch_timeout,
        })
    }
}

/// Full process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub log_format: LogFormat,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| ConfigError::invalid(PORT_ENV, port))?,
            None => DEFAULT_PORT,
        };
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::invalid(HOST_ENV, host))?;

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(format) => format.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            addr,
            log_format,
            auth: AuthConfig::from_lookup(&lookup)?,
        })
    }
}

/// Issuer URL for a Cognito user pool.
pub fn cognito_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

/// Asymmetric algorithms only; a shared-secret algorithm would let anyone
/// holding the public key mint credentials.
fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| ConfigError::invalid(AUTH_ALGORITHM_ENV, name))?;
    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512
        | Algorithm::ES256
        | Algorithm::ES384 => Ok(algorithm),
        _ => Err(ConfigError::invalid(AUTH_ALGORITHM_ENV, format!("{name} is not permitted"))),
    }
}

/// HTTPS only, except for loopback hosts used in local development.
fn validate_jwks_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::invalid(AUTH_JWKS_URL_ENV, e.to_string()))?;
    let loopback = matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    );
    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        other => Err(ConfigError::invalid(
            AUTH_JWKS_URL_ENV,
            format!("scheme {other} is not allowed"),
        )),
    }
}
