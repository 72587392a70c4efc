// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Claims
//!
//! - [`TokenClaims`] - normalized claims from a validated access token
//! - [`UserInfoClaims`] - optional claims from the user info endpoint
//! - [`ExtraClaimsProvider`] - business claims the token does not carry
//! - [`ClaimsPrincipal`] - the composed identity for one request
//! - [`ClaimsCache`] - avoids revalidating a token on every request

pub mod cache;
pub mod principal;
pub mod provider;
pub mod sample;

pub use cache::{CachedClaims, ClaimsCache};
pub use principal::{ClaimsPrincipal, TokenClaims, UserInfoClaims};
pub use provider::{ExtraClaimsProvider, ProviderError};
pub use sample::{SampleExtraClaims, SampleExtraClaimsProvider};
