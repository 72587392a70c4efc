// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::authorizer::ClaimsAuthorizer;
use crate::auth::introspection::IntrospectionValidator;
use crate::auth::jwks::JwksManager;
use crate::auth::jwt::JwtValidator;
use crate::auth::userinfo::UserInfoClient;
use crate::auth::validator::TokenValidator;
use crate::claims::{ClaimsCache, SampleExtraClaimsProvider};
use crate::config::{ApiConfig, TokenValidationStrategy};
use crate::logging::{LogEntry, LogSink, TracingLogSink};

/// Authorizer used by the sample API.
pub type SampleAuthorizer = ClaimsAuthorizer<SampleExtraClaimsProvider>;

/// Shared singletons, built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub api_name: Arc<str>,
    pub host_name: Arc<str>,
    pub performance_threshold: Duration,
    pub authorizer: Arc<SampleAuthorizer>,
    pub log_sink: Arc<dyn LogSink>,
}

impl AppState {
    pub fn new(api_name: &str, authorizer: SampleAuthorizer) -> Self {
        Self {
            api_name: Arc::from(api_name),
            host_name: Arc::from("localhost"),
            performance_threshold: Duration::from_secs(1),
            authorizer: Arc::new(authorizer),
            log_sink: Arc::new(TracingLogSink),
        }
    }

    /// Build the authorizer selected by `config`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.oauth.http_timeout)
            .build()?;

        let validator: Arc<dyn TokenValidator> = match &config.oauth.strategy {
            TokenValidationStrategy::Jwt {
                jwks_url,
                issuer,
                audience,
                algorithm,
            } => {
                let jwks = Arc::new(JwksManager::new(jwks_url.as_str(), client.clone()));
                let mut validator = JwtValidator::new(jwks, issuer.as_str(), *algorithm);
                if let Some(audience) = audience {
                    validator = validator.with_audience(audience.as_str());
                }
                Arc::new(validator)
            }
            TokenValidationStrategy::Introspection {
                endpoint,
                client_id,
                client_secret,
            } => Arc::new(IntrospectionValidator::new(
                endpoint.as_str(),
                client_id.as_str(),
                client_secret.as_str(),
                client.clone(),
            )),
        };

        let cache = Arc::new(ClaimsCache::new(
            config.cache.capacity,
            config.cache.ttl_minutes,
        ));

        let mut authorizer =
            ClaimsAuthorizer::new(validator, Arc::new(SampleExtraClaimsProvider), cache);
        if let Some(url) = &config.oauth.userinfo_url {
            authorizer = authorizer.with_user_info(UserInfoClient::new(url.as_str(), client));
        }
        if let Some(scope) = &config.oauth.required_scope {
            authorizer = authorizer.with_required_scope(scope.as_str());
        }

        Ok(Self::new(&config.api_name, authorizer)
            .with_host_name(&config.logging.host_name)
            .with_performance_threshold(config.logging.performance_threshold))
    }

    pub fn with_host_name(mut self, host_name: &str) -> Self {
        self.host_name = Arc::from(host_name);
        self
    }

    /// Requests slower than `threshold` log their performance breakdown.
    pub fn with_performance_threshold(mut self, threshold: Duration) -> Self {
        self.performance_threshold = threshold;
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    pub fn claims_cache(&self) -> &Arc<ClaimsCache> {
        self.authorizer.cache()
    }

    pub fn new_log_entry(&self) -> LogEntry {
        LogEntry::new(&self.api_name, &self.host_name, self.performance_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: std::collections::HashMap<&str, &str> = vars.iter().copied().collect();
        ApiConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn builds_from_jwt_config() {
        let state = AppState::from_config(&config(&[
            ("API_NAME", "InvestmentsApi"),
            ("HOSTNAME", "pod-7"),
            ("OAUTH_ISSUER", "https://login.example.com"),
            ("OAUTH_JWKS_URL", "https://login.example.com/jwks"),
            ("LOG_PERFORMANCE_THRESHOLD_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(&*state.api_name, "InvestmentsApi");
        assert_eq!(&*state.host_name, "pod-7");
        assert_eq!(state.performance_threshold, Duration::from_millis(250));
        assert!(state.claims_cache().is_empty());

        let data = state.new_log_entry().data();
        assert_eq!(data.api_name, "InvestmentsApi");
        assert_eq!(data.host_name, "pod-7");
    }

    #[test]
    fn builds_from_introspection_config() {
        let state = AppState::from_config(&config(&[
            ("TOKEN_VALIDATION", "introspection"),
            ("OAUTH_INTROSPECT_URL", "https://login.example.com/introspect"),
            ("OAUTH_INTROSPECT_CLIENT_ID", "api"),
            ("OAUTH_INTROSPECT_CLIENT_SECRET", "secret"),
            ("OAUTH_USERINFO_URL", "https://login.example.com/userinfo"),
        ]));
        assert!(state.is_ok());
    }
}
