// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sample business claims for the investments API.
//!
//! The access token carries a `manager_id` business identity and a `role`.
//! Title and regions are looked up from the API's own data, which is hard
//! coded here in place of a database.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::principal::{TokenClaims, UserInfoClaims};
use super::provider::{ExtraClaimsProvider, ProviderError};

/// Token claim holding the business user id.
pub const MANAGER_ID_CLAIM: &str = "manager_id";

/// Token claim holding the business role.
pub const ROLE_CLAIM: &str = "role";

/// Claims the sample API adds to every principal.
///
/// Every field has a serde default so entries cached by an older build still
/// load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleExtraClaims {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub role: String,
}

impl SampleExtraClaims {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }

    pub fn is_user(&self) -> bool {
        self.role.eq_ignore_ascii_case("user")
    }
}

/// Looks up sample claims keyed by the token's manager id.
#[derive(Debug, Default, Clone)]
pub struct SampleExtraClaimsProvider;

impl SampleExtraClaimsProvider {
    fn claims_for_manager(manager_id: &str) -> (&'static str, &'static [&'static str]) {
        const GLOBAL: &[&str] = &["Europe", "USA", "Asia"];
        const REGIONAL: &[&str] = &["USA"];
        const NONE: &[&str] = &[];

        match manager_id {
            "20116" => ("Global Manager", GLOBAL),
            "10345" => ("Regional Manager", REGIONAL),
            _ => ("", NONE),
        }
    }
}

#[async_trait]
impl ExtraClaimsProvider for SampleExtraClaimsProvider {
    type Claims = SampleExtraClaims;

    async fn lookup(
        &self,
        token: &TokenClaims,
        _user_info: Option<&UserInfoClaims>,
    ) -> Result<SampleExtraClaims, ProviderError> {
        let manager_id = token.string_claim(MANAGER_ID_CLAIM)?;
        let role = token.string_claim(ROLE_CLAIM)?;

        let (title, regions) = Self::claims_for_manager(&manager_id);
        debug!(manager_id = %manager_id, title, "Resolved sample extra claims");

        Ok(SampleExtraClaims {
            title: title.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            role,
        })
    }

    fn serialize(&self, claims: &SampleExtraClaims) -> Result<Vec<u8>, ProviderError> {
        Ok(serde_json::to_vec(claims)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<SampleExtraClaims, ProviderError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
