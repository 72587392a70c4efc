// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims, user info claims and the composed claims principal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ClientError;

/// Registered claims that are read into dedicated fields.
const REGISTERED_CLAIMS: &[&str] = &[
    "sub", "scope", "scp", "client_id", "exp", "iss", "aud", "iat", "nbf", "jti", "active",
    "token_type",
];

/// Normalized claims from a validated access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    subject: String,
    scopes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    expiry: i64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    custom: Map<String, Value>,
}

impl TokenClaims {
    pub fn new(
        subject: impl Into<String>,
        scopes: impl IntoIterator<Item = impl Into<String>>,
        client_id: Option<String>,
        expiry: i64,
    ) -> Self {
        Self {
            subject: subject.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
            client_id,
            expiry,
            custom: Map::new(),
        }
    }

    /// Attach non-standard claims such as business user ids.
    pub fn with_custom(mut self, custom: Map<String, Value>) -> Self {
        self.custom = custom;
        self
    }

    /// Build claims from a JWT payload or an introspection response.
    ///
    /// `scope` may be a space-separated string or an array (`scp`). Claims
    /// that are not registered are kept in the custom map. Returns the name of
    /// the first required claim that is missing.
    pub fn from_payload(mut payload: Map<String, Value>) -> Result<Self, &'static str> {
        let subject = match payload.get("sub").and_then(Value::as_str) {
            Some(sub) if !sub.is_empty() => sub.to_string(),
            _ => return Err("sub"),
        };
        let expiry = payload.get("exp").and_then(Value::as_i64).ok_or("exp")?;

        let mut scopes = BTreeSet::new();
        for name in ["scope", "scp"] {
            match payload.get(name) {
                Some(Value::String(s)) => scopes.extend(s.split_whitespace().map(str::to_string)),
                Some(Value::Array(items)) => scopes.extend(
                    items.iter().filter_map(Value::as_str).map(str::to_string),
                ),
                _ => {}
            }
        }

        let client_id = payload
            .get("client_id")
            .and_then(Value::as_str)
            .map(str::to_string);

        payload.retain(|name, _| !REGISTERED_CLAIMS.contains(&name.as_str()));

        Ok(Self {
            subject,
            scopes,
            client_id,
            expiry,
            custom: payload,
        })
    }

    /// The stable anonymous user id (`sub`).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Expiry in epoch seconds.
    pub fn expiry(&self) -> i64 {
        self.expiry
    }

    pub fn custom_claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// A custom claim that must be present as a string or number.
    pub fn string_claim(&self, name: &str) -> Result<String, ClientError> {
        match self.custom.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(ClientError::missing_claim(name)),
        }
    }
}

/// Claims returned by the OpenID Connect user info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoClaims {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub email: String,
}

/// The identity handed to business logic for one request.
///
/// Built once by the authorizer and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ClaimsPrincipal<E> {
    token: TokenClaims,
    user_info: Option<UserInfoClaims>,
    extra: E,
}

impl<E> ClaimsPrincipal<E> {
    pub fn new(token: TokenClaims, user_info: Option<UserInfoClaims>, extra: E) -> Self {
        Self {
            token,
            user_info,
            extra,
        }
    }

    /// Technical identity used for authorization and logging.
    pub fn subject(&self) -> &str {
        self.token.subject()
    }

    pub fn token_claims(&self) -> &TokenClaims {
        &self.token
    }

    pub fn user_info(&self) -> Option<&UserInfoClaims> {
        self.user_info.as_ref()
    }

    pub fn extra(&self) -> &E {
        &self.extra
    }

    /// Fail with a 403 unless the token carries `scope`.
    pub fn require_scope(&self, scope: &str) -> Result<(), ClientError> {
        if self.token.has_scope(scope) {
            Ok(())
        } else {
            Err(ClientError::insufficient_scope(scope))
        }
    }
}
