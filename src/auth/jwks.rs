// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! Keys are cached for a TTL. A token whose `kid` is not in the cached set
//! triggers one re-download, so key rotation at the issuer is picked up
//! without waiting for the TTL. Re-downloads for unknown key ids are limited
//! to one per `min_refresh_interval`, so tokens carrying random `kid` values
//! cannot be used to hammer the issuer.

use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum time between re-downloads for unknown key ids.
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Downloads and caches the issuer's token signing keys.
pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    cache: RwLock<Option<CacheEntry>>,
    client: reqwest::Client,
}

impl JwksManager {
    /// `client` should carry the outbound timeout.
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: RwLock::new(None),
            client,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Cached keys if still fresh, else a new download.
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        self.refresh().await
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let fetch_error = |reason: String| AuthError::JwksFetch {
            url: self.jwks_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| fetch_error(e.to_string()))
    }

    /// Download the key set and replace the cache.
    pub async fn refresh(&self) -> Result<JwkSet, AuthError> {
        let jwks = self.fetch_jwks().await?;
        info!(url = %self.jwks_url, keys = jwks.keys.len(), "Downloaded token signing keys");

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    /// True when the cached set is older than the refresh cool-down.
    async fn refresh_allowed(&self) -> bool {
        match &*self.cache.read().await {
            Some(entry) => entry.fetched_at.elapsed() >= self.min_refresh_interval,
            None => true,
        }
    }

    /// Decoding key for the given key id, re-downloading once if it is unknown.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = jwks.find(kid) {
            return jwk_to_decoding_key(jwk);
        }

        if !self.refresh_allowed().await {
            return Err(AuthError::NoMatchingKey(Some(kid.to_string())));
        }

        debug!(kid, "Key id not in cached JWKS, downloading again");
        let jwks = self.refresh().await?;
        jwks.find(kid)
            .ok_or_else(|| AuthError::NoMatchingKey(Some(kid.to_string())))
            .and_then(jwk_to_decoding_key)
    }

    /// Every usable key, for tokens without a key id.
    pub async fn get_all_decoding_keys(&self) -> Result<Vec<DecodingKey>, AuthError> {
        let jwks = self.get_jwks().await?;
        let keys: Vec<DecodingKey> = jwks
            .keys
            .iter()
            .filter_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .collect();

        if keys.is_empty() {
            return Err(AuthError::NoMatchingKey(None));
        }
        Ok(keys)
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        match &*self.cache.read().await {
            Some(entry) => entry.fetched_at.elapsed() < self.cache_ttl,
            None => false,
        }
    }
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::UnsupportedKey(format!("invalid RSA key: {e}"))),
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
            .map_err(|e| AuthError::UnsupportedKey(format!("invalid EC key: {e}"))),
        _ => Err(AuthError::UnsupportedKey(
            "unsupported key type in JWKS".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{codes, ApiError};
    use crate::test_support::{jwks_body, KEY_ID, ROGUE_KEY_N, SIGNING_KEY_N};
    use axum::http::StatusCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn jwks_server(body: serde_json::Value, expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = JwksManager::new("https://example.com/jwks", reqwest::Client::new());
        assert!(!manager.is_cached().await);
        assert_eq!(manager.jwks_url(), "https://example.com/jwks");
    }

    #[tokio::test]
    async fn keys_are_downloaded_once_and_cached() {
        let server = jwks_server(jwks_body(KEY_ID, SIGNING_KEY_N), 1).await;
        let manager = JwksManager::new(format!("{}/jwks", server.uri()), reqwest::Client::new());

        assert!(manager.get_decoding_key(KEY_ID).await.is_ok());
        assert!(manager.get_decoding_key(KEY_ID).await.is_ok());
        assert!(manager.is_cached().await);
    }

    #[tokio::test]
    async fn unknown_kid_triggers_one_refetch() {
        let server = jwks_server(jwks_body(KEY_ID, SIGNING_KEY_N), 2).await;
        let manager = JwksManager::new(format!("{}/jwks", server.uri()), reqwest::Client::new())
            .with_min_refresh_interval(Duration::ZERO);

        let result = manager.get_decoding_key("rotated-key").await;
        assert!(matches!(result, Err(AuthError::NoMatchingKey(Some(ref kid))) if kid == "rotated-key"));
    }

    #[tokio::test]
    async fn unknown_kid_respects_cool_down() {
        let server = jwks_server(jwks_body(KEY_ID, SIGNING_KEY_N), 1).await;
        let manager = JwksManager::new(format!("{}/jwks", server.uri()), reqwest::Client::new())
            .with_min_refresh_interval(Duration::from_secs(3600));

        assert!(manager.get_decoding_key(KEY_ID).await.is_ok());
        assert!(matches!(
            manager.get_decoding_key("other").await,
            Err(AuthError::NoMatchingKey(_))
        ));
    }

    #[tokio::test]
    async fn all_keys_are_returned_without_kid() {
        let body = serde_json::json!({
            "keys": [
                jwks_body("k1", SIGNING_KEY_N)["keys"][0].clone(),
                jwks_body("k2", ROGUE_KEY_N)["keys"][0].clone(),
            ]
        });
        let server = jwks_server(body, 1).await;
        let manager = JwksManager::new(format!("{}/jwks", server.uri()), reqwest::Client::new());

        assert_eq!(manager.get_all_decoding_keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn download_failure_carries_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/jwks", server.uri());
        let manager = JwksManager::new(url.clone(), reqwest::Client::new());
        match manager.get_decoding_key(KEY_ID).await {
            Err(AuthError::JwksFetch { url: failed, reason }) => {
                assert_eq!(failed, url);
                assert!(reason.contains("503"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a download failure"),
        }
    }

    #[tokio::test]
    async fn expired_cache_is_downloaded_again() {
        let server = jwks_server(jwks_body(KEY_ID, SIGNING_KEY_N), 2).await;
        let manager = JwksManager::new(format!("{}/jwks", server.uri()), reqwest::Client::new())
            .with_cache_ttl(Duration::ZERO);

        assert!(manager.get_decoding_key(KEY_ID).await.is_ok());
        assert!(!manager.is_cached().await);
        assert!(manager.get_decoding_key(KEY_ID).await.is_ok());
    }

    #[tokio::test]
    async fn slow_issuer_times_out_as_download_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_body(KEY_ID, SIGNING_KEY_N))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let manager = JwksManager::new(format!("{}/jwks", server.uri()), client);

        let error = match manager.get_decoding_key(KEY_ID).await {
            Err(error) => error,
            Ok(_) => panic!("expected a timeout"),
        };
        assert!(matches!(error, AuthError::JwksFetch { .. }));

        let api_error = ApiError::from(error);
        assert_eq!(api_error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code(), codes::JWKS_DOWNLOAD_FAILURE);
    }
}
