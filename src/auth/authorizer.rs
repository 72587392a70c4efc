// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Turns a bearer token into a [`ClaimsPrincipal`].
//!
//! ## Flow
//!
//! 1. Read the bearer token and hash it
//! 2. Serve the principal from the claims cache when possible
//! 3. Otherwise validate the token, fetch user info (when configured) and
//!    look up extra claims, then cache the result until the token expires
//! 4. Record the identity in the request log and enforce the API-wide scope
//!
//! Concurrent misses for the same token each run step 3. The last write to
//! the cache wins.

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::warn;

use super::bearer::{bearer_token, token_hash};
use super::userinfo::UserInfoClient;
use super::validator::TokenValidator;
use super::AuthError;
use crate::claims::{CachedClaims, ClaimsCache, ClaimsPrincipal, ExtraClaimsProvider};
use crate::errors::{ApiError, ErrorClassifier};
use crate::logging::LogEntry;

pub struct ClaimsAuthorizer<P: ExtraClaimsProvider> {
    validator: Arc<dyn TokenValidator>,
    user_info: Option<UserInfoClient>,
    provider: Arc<P>,
    cache: Arc<ClaimsCache>,
    required_scope: Option<String>,
}

impl<P: ExtraClaimsProvider> ClaimsAuthorizer<P> {
    pub fn new(validator: Arc<dyn TokenValidator>, provider: Arc<P>, cache: Arc<ClaimsCache>) -> Self {
        Self {
            validator,
            user_info: None,
            provider,
            cache,
            required_scope: None,
        }
    }

    /// Fetch user info claims on every cache miss.
    pub fn with_user_info(mut self, client: UserInfoClient) -> Self {
        self.user_info = Some(client);
        self
    }

    /// Reject tokens that lack `scope`, whatever the operation.
    pub fn with_required_scope(mut self, scope: impl Into<String>) -> Self {
        self.required_scope = Some(scope.into());
        self
    }

    pub fn cache(&self) -> &Arc<ClaimsCache> {
        &self.cache
    }

    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        log_entry: &LogEntry,
    ) -> Result<ClaimsPrincipal<P::Claims>, ApiError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let token_hash = token_hash(token);

        let principal = match self.cached_principal(&token_hash) {
            Some(principal) => principal,
            None => self.resolve(token, &token_hash, log_entry).await?,
        };

        log_entry.set_identity(principal.token_claims());

        if let Some(scope) = &self.required_scope {
            principal.require_scope(scope)?;
        }

        Ok(principal)
    }

    fn cached_principal(&self, token_hash: &str) -> Option<ClaimsPrincipal<P::Claims>> {
        let cached = self.cache.get(token_hash)?;
        match self.provider.deserialize(&cached.extra) {
            Ok(extra) => Some(ClaimsPrincipal::new(cached.token, cached.user_info, extra)),
            Err(error) => {
                warn!(token_hash, error = %error, "Cached extra claims are unreadable, resolving again");
                None
            }
        }
    }

    async fn resolve(
        &self,
        token: &str,
        token_hash: &str,
        log_entry: &LogEntry,
    ) -> Result<ClaimsPrincipal<P::Claims>, ApiError> {
        let claims = {
            let _span = log_entry.create_performance_breakdown("validateToken");
            self.validator.validate(token).await?
        };

        let user_info = match &self.user_info {
            Some(client) => {
                let _span = log_entry.create_performance_breakdown("userInfoLookup");
                Some(client.fetch(token).await?)
            }
            None => None,
        };

        let extra = {
            let _span = log_entry.create_performance_breakdown("extraClaimsLookup");
            self.provider
                .lookup(&claims, user_info.as_ref())
                .await
                .map_err(|e| ErrorClassifier::classify(&*e))?
        };

        match self.provider.serialize(&extra) {
            Ok(bytes) => {
                let cached = CachedClaims {
                    token: claims.clone(),
                    user_info: user_info.clone(),
                    extra: bytes,
                };
                self.cache.put(token_hash, cached, claims.expiry());
            }
            Err(error) => {
                warn!(token_hash, error = %error, "Extra claims could not be serialized, not caching");
            }
        }

        Ok(ClaimsPrincipal::new(claims, user_info, extra))
    }
}
