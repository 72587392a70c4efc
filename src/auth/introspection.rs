// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote token validation via OAuth 2.0 token introspection (RFC 7662).

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};

use super::validator::{claims_from_payload, TokenValidator};
use super::AuthError;
use crate::claims::TokenClaims;

/// Posts the token to the issuer with HTTP Basic client credentials.
pub struct IntrospectionValidator {
    endpoint: String,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
}

impl IntrospectionValidator {
    pub fn new(
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client,
        }
    }

    fn failure(&self, reason: impl Into<String>, error_code: Option<String>) -> AuthError {
        AuthError::Introspection {
            url: self.endpoint.clone(),
            reason: reason.into(),
            error_code,
        }
    }
}

#[async_trait]
impl TokenValidator for IntrospectionValidator {
    async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(ACCEPT, "application/json")
            .form(&[("token", token), ("token_type_hint", "access_token")])
            .send()
            .await
            .map_err(|e| self.failure(e.to_string(), None))?;

        let status = response.status();
        if !status.is_success() {
            // OAuth error bodies look like {"error": "invalid_client", ...}
            let error_code = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string));
            return Err(self.failure(format!("HTTP {status} from introspection endpoint"), error_code));
        }

        let payload = response
            .json::<Map<String, Value>>()
            .await
            .map_err(|e| self.failure(format!("malformed introspection response: {e}"), None))?;

        match payload.get("active").and_then(Value::as_bool) {
            Some(true) => {}
            Some(false) => return Err(AuthError::TokenInactive),
            None => {
                return Err(self.failure(
                    "malformed introspection response: missing boolean 'active'",
                    None,
                ))
            }
        }

        claims_from_payload(payload)
    }
}
