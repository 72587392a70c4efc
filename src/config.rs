// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from environment variables once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `API_NAME` | API name, reported as the `area` of 500 errors | `SampleApi` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_VALIDATION` | `jwt` or `introspection` | `jwt` |
//! | `OAUTH_ISSUER` | Expected JWT issuer claim | Required for `jwt` |
//! | `OAUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `OAUTH_ALGORITHM` | Permitted JWS algorithm | `RS256` |
//! | `OAUTH_JWKS_URL` | JWKS endpoint | Required for `jwt` |
//! | `OAUTH_INTROSPECT_URL` | Introspection endpoint | Required for `introspection` |
//! | `OAUTH_INTROSPECT_CLIENT_ID` | Introspection client id | Required for `introspection` |
//! | `OAUTH_INTROSPECT_CLIENT_SECRET` | Introspection client secret | Required for `introspection` |
//! | `OAUTH_USERINFO_URL` | User info endpoint, enables user info lookups | Optional |
//! | `OAUTH_REQUIRED_SCOPE` | Scope every protected request must carry | Optional |
//! | `OAUTH_HTTP_TIMEOUT_SECS` | Timeout for calls to the authorization server | `10` |
//! | `CLAIMS_CACHE_TTL_MINUTES` | Upper bound on cached claims lifetime | `30` |
//! | `CLAIMS_CACHE_CAPACITY` | Maximum number of cached tokens | `10000` |
//! | `CLAIMS_CACHE_PURGE_SECS` | Interval of the expired entry sweep | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `LOG_PERFORMANCE_THRESHOLD_MS` | Request time above which timings are logged | `1000` |
//! | `HOSTNAME` | Host name written to request logs | `localhost` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

pub const API_NAME_ENV: &str = "API_NAME";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TOKEN_VALIDATION_ENV: &str = "TOKEN_VALIDATION";
pub const OAUTH_ISSUER_ENV: &str = "OAUTH_ISSUER";
pub const OAUTH_AUDIENCE_ENV: &str = "OAUTH_AUDIENCE";
pub const OAUTH_ALGORITHM_ENV: &str = "OAUTH_ALGORITHM";
pub const OAUTH_JWKS_URL_ENV: &str = "OAUTH_JWKS_URL";
pub const OAUTH_INTROSPECT_URL_ENV: &str = "OAUTH_INTROSPECT_URL";
pub const OAUTH_INTROSPECT_CLIENT_ID_ENV: &str = "OAUTH_INTROSPECT_CLIENT_ID";
pub const OAUTH_INTROSPECT_CLIENT_SECRET_ENV: &str = "OAUTH_INTROSPECT_CLIENT_SECRET";
pub const OAUTH_USERINFO_URL_ENV: &str = "OAUTH_USERINFO_URL";
pub const OAUTH_REQUIRED_SCOPE_ENV: &str = "OAUTH_REQUIRED_SCOPE";
pub const OAUTH_HTTP_TIMEOUT_ENV: &str = "OAUTH_HTTP_TIMEOUT_SECS";
pub const CLAIMS_CACHE_TTL_ENV: &str = "CLAIMS_CACHE_TTL_MINUTES";
pub const CLAIMS_CACHE_CAPACITY_ENV: &str = "CLAIMS_CACHE_CAPACITY";
pub const CLAIMS_CACHE_PURGE_ENV: &str = "CLAIMS_CACHE_PURGE_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const LOG_PERFORMANCE_THRESHOLD_ENV: &str = "LOG_PERFORMANCE_THRESHOLD_MS";
pub const HOSTNAME_ENV: &str = "HOSTNAME";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How access tokens are validated.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValidationStrategy {
    Jwt {
        jwks_url: String,
        issuer: String,
        audience: Option<String>,
        algorithm: Algorithm,
    },
    Introspection {
        endpoint: String,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthConfig {
    pub strategy: TokenValidationStrategy,
    pub userinfo_url: Option<String>,
    pub required_scope: Option<String>,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsCacheConfig {
    pub ttl_minutes: u64,
    pub capacity: usize,
    pub purge_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub performance_threshold: Duration,
    pub host_name: String,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub api_name: String,
    pub host: String,
    pub port: u16,
    pub oauth: OAuthConfig,
    pub cache: ClaimsCacheConfig,
    pub logging: LoggingConfig,
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let strategy = match vars.optional(TOKEN_VALIDATION_ENV).as_deref() {
            None | Some("jwt") => TokenValidationStrategy::Jwt {
                jwks_url: vars.url(OAUTH_JWKS_URL_ENV)?,
                issuer: vars.required(OAUTH_ISSUER_ENV)?,
                audience: vars.optional(OAUTH_AUDIENCE_ENV),
                algorithm: vars.algorithm(OAUTH_ALGORITHM_ENV)?,
            },
            Some("introspection") => TokenValidationStrategy::Introspection {
                endpoint: vars.url(OAUTH_INTROSPECT_URL_ENV)?,
                client_id: vars.required(OAUTH_INTROSPECT_CLIENT_ID_ENV)?,
                client_secret: vars.required(OAUTH_INTROSPECT_CLIENT_SECRET_ENV)?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: TOKEN_VALIDATION_ENV,
                    value: other.to_string(),
                    reason: "expected 'jwt' or 'introspection'".to_string(),
                })
            }
        };

        let userinfo_url = match vars.optional(OAUTH_USERINFO_URL_ENV) {
            Some(_) => Some(vars.url(OAUTH_USERINFO_URL_ENV)?),
            None => None,
        };

        let oauth = OAuthConfig {
            strategy,
            userinfo_url,
            required_scope: vars.optional(OAUTH_REQUIRED_SCOPE_ENV),
            http_timeout: Duration::from_secs(vars.parse_or(OAUTH_HTTP_TIMEOUT_ENV, 10)?),
        };

        let cache = ClaimsCacheConfig {
            ttl_minutes: vars.parse_or(CLAIMS_CACHE_TTL_ENV, 30)?,
            capacity: vars.parse_or(CLAIMS_CACHE_CAPACITY_ENV, 10_000)?,
            purge_interval: Duration::from_secs(vars.parse_or(CLAIMS_CACHE_PURGE_ENV, 60)?.max(1)),
        };

        let format = match vars.optional(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            None | Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                    reason: "expected 'json' or 'pretty'".to_string(),
                })
            }
        };

        let logging = LoggingConfig {
            format,
            performance_threshold: Duration::from_millis(
                vars.parse_or(LOG_PERFORMANCE_THRESHOLD_ENV, 1000)?,
            ),
            host_name: vars
                .optional(HOSTNAME_ENV)
                .unwrap_or_else(|| "localhost".to_string()),
        };

        Ok(Self {
            api_name: vars
                .optional(API_NAME_ENV)
                .unwrap_or_else(|| "SampleApi".to_string()),
            host: vars
                .optional(HOST_ENV)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse_or(PORT_ENV, 8080)?,
            oauth,
            cache,
            logging,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, with empty treated as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn url(&self, name: &'static str) -> Result<String, ConfigError> {
        let value = self.required(name)?;
        url::Url::parse(&value).map_err(|e| ConfigError::Invalid {
            name,
            value: value.clone(),
            reason: e.to_string(),
        })?;
        Ok(value)
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn algorithm(&self, name: &'static str) -> Result<Algorithm, ConfigError> {
        let value = self.optional(name).unwrap_or_else(|| "RS256".to_string());
        let invalid = |reason: String| ConfigError::Invalid {
            name,
            value: value.clone(),
            reason,
        };

        let algorithm = Algorithm::from_str(&value).map_err(|e| invalid(e.to_string()))?;
        if matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(invalid("symmetric algorithms cannot be used with a JWKS".to_string()));
        }
        Ok(algorithm)
    }
}
