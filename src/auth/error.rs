// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Detailed authorization failures.
//!
//! These never reach the caller as-is. `From<AuthError> for ApiError` collapses
//! every token validation failure into one generic 401 and keeps the specific
//! reason for the request log only.

use serde_json::json;

use crate::errors::{codes, ApiError, ClientError, ServerError};

/// Authorization error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("No bearer token was supplied in the Authorization header")]
    MissingToken,
    #[error("Token is malformed: {0}")]
    MalformedToken(String),
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    #[error("Token audience is invalid")]
    InvalidAudience,
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    #[error("No matching key found in JWKS for kid {0:?}")]
    NoMatchingKey(Option<String>),
    #[error("Unsupported key in JWKS: {0}")]
    UnsupportedKey(String),
    #[error("Failed to fetch JWKS from {url}: {reason}")]
    JwksFetch { url: String, reason: String },
    #[error("Token introspection at {url} failed: {reason}")]
    Introspection {
        url: String,
        reason: String,
        error_code: Option<String>,
    },
    #[error("Introspection reported the token as inactive")]
    TokenInactive,
    #[error("User info endpoint rejected the access token")]
    UserInfoRejected,
    #[error("User info lookup at {url} failed: {reason}")]
    UserInfo { url: String, reason: String },
    #[error("Missing claim in token data: {0}")]
    MissingClaim(String),
}

impl AuthError {
    /// Internal error code, written to logs only.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::NoMatchingKey(_) => "no_matching_key",
            AuthError::UnsupportedKey(_) => "unsupported_key",
            AuthError::JwksFetch { .. } => "jwks_fetch_error",
            AuthError::Introspection { .. } => "introspection_error",
            AuthError::TokenInactive => "token_inactive",
            AuthError::UserInfoRejected => "userinfo_rejected",
            AuthError::UserInfo { .. } => "userinfo_error",
            AuthError::MissingClaim(_) => "missing_claim",
        }
    }

    /// Map a `jsonwebtoken` decoding failure.
    pub(crate) fn from_jwt(error: &jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken(error.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match &error {
            AuthError::JwksFetch { url, reason } => ServerError::new(
                codes::JWKS_DOWNLOAD_FAILURE,
                "Problem downloading token signing keys",
            )
            .with_details(format!("{reason}, URL: {url}"))
            .into(),
            AuthError::Introspection {
                url,
                reason,
                error_code,
            } => ServerError::new(
                codes::INTROSPECTION_FAILURE,
                "Problem encountered introspecting the access token",
            )
            .with_details(json!({
                "url": url,
                "reason": reason,
                "errorCode": error_code,
            }))
            .into(),
            AuthError::UserInfo { url, reason } => ServerError::new(
                codes::USERINFO_FAILURE,
                "Problem encountered downloading user info",
            )
            .with_details(format!("{reason}, URL: {url}"))
            .into(),
            AuthError::MissingClaim(name) => ClientError::missing_claim(name).into(),
            _ => ClientError::unauthorized("")
                .with_log_context(json!({
                    "reason": error.error_code(),
                    "detail": error.to_string(),
                }))
                .into(),
        }
    }
}
