// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local JWT validation against the issuer's JWKS.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use super::jwks::JwksManager;
use super::validator::{claims_from_payload, TokenValidator};
use super::AuthError;
use crate::claims::TokenClaims;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies signature, issuer, audience (when configured) and expiry.
pub struct JwtValidator {
    jwks: Arc<JwksManager>,
    issuer: String,
    audience: Option<String>,
    algorithm: Algorithm,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(jwks: Arc<JwksManager>, issuer: impl Into<String>, algorithm: Algorithm) -> Self {
        Self {
            jwks,
            issuer: issuer.into(),
            audience: None,
            algorithm,
            leeway: CLOCK_SKEW_LEEWAY,
        }
    }

    /// Require `aud` to match. Some issuers omit the audience claim, so it is
    /// only checked when set.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway = leeway_secs;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation
    }

    fn decode_with(
        token: &str,
        key: &DecodingKey,
        validation: &Validation,
    ) -> Result<Map<String, Value>, AuthError> {
        decode::<Map<String, Value>>(token, key, validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::from_jwt(&e))
    }
}

#[async_trait]
impl TokenValidator for JwtValidator {
    async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let validation = self.validation();

        let payload = match &header.kid {
            Some(kid) => {
                let key = self.jwks.get_decoding_key(kid).await?;
                Self::decode_with(token, &key, &validation)?
            }
            // Without a key id, each published key is a candidate. This picks
            // the signing key; a token that fails against every key is rejected.
            None => {
                let mut last_error = AuthError::NoMatchingKey(None);
                let mut decoded = None;
                for key in self.jwks.get_all_decoding_keys().await? {
                    match Self::decode_with(token, &key, &validation) {
                        Ok(payload) => {
                            decoded = Some(payload);
                            break;
                        }
                        Err(e) => last_error = e,
                    }
                }
                decoded.ok_or(last_error)?
            }
        };

        claims_from_payload(payload)
    }
}
