// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Turns `Authorization: Bearer <token>` into a claims principal.
//!
//! ## Token Validation
//!
//! One strategy is selected at startup:
//!
//! - **JWT**: the signature is checked against the issuer's JWKS, then
//!   `iss`, `aud` (when configured) and `exp` with 60 seconds of leeway
//! - **Introspection**: the token is posted to the issuer with client
//!   credentials and must come back `active`
//!
//! ## Security
//!
//! - Every validation failure returns the same 401 `invalid_token` body, so
//!   callers cannot learn which check failed
//! - Failures talking to the authorization server are 500s
//! - Cached claims are keyed by the SHA-256 hash of the token, never the
//!   token itself

pub mod authorizer;
pub mod bearer;
pub mod error;
pub mod extractor;
pub mod introspection;
pub mod jwks;
pub mod jwt;
pub mod middleware;
pub mod userinfo;
pub mod validator;

pub use authorizer::ClaimsAuthorizer;
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::JwksManager;
pub use validator::TokenValidator;
