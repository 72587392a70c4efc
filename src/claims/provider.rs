// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Extension point for business claims that the access token does not carry.

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

use super::principal::{TokenClaims, UserInfoClaims};

/// Error type returned by providers.
///
/// A provider may return an [`ApiError`](crate::errors::ApiError) (boxed)
/// to choose the response. Anything else becomes a 500.
pub type ProviderError = Box<dyn Error + Send + Sync + 'static>;

/// Resolves business claims on a cache miss.
///
/// Implementations are shared across concurrent requests and may be called
/// several times for the same token, so `lookup` must be idempotent.
#[async_trait]
pub trait ExtraClaimsProvider: Send + Sync + 'static {
    /// Business claims type stored in the principal.
    type Claims: Clone + Debug + Send + Sync + 'static;

    async fn lookup(
        &self,
        token: &TokenClaims,
        user_info: Option<&UserInfoClaims>,
    ) -> Result<Self::Claims, ProviderError>;

    /// Serialize claims for the cache.
    fn serialize(&self, claims: &Self::Claims) -> Result<Vec<u8>, ProviderError>;

    /// Restore cached claims.
    ///
    /// Payloads written before a new optional field was added must still load,
    /// with that field at its default.
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Claims, ProviderError>;
}
