// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validation strategies.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::AuthError;
use crate::claims::TokenClaims;

/// Verifies a raw access token and returns its claims.
///
/// Implementations must not retry a failed validation against another key or
/// endpoint.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Normalize a decoded JWT payload or introspection response.
pub(crate) fn claims_from_payload(payload: Map<String, Value>) -> Result<TokenClaims, AuthError> {
    TokenClaims::from_payload(payload).map_err(|name| AuthError::MissingClaim(name.to_string()))
}
