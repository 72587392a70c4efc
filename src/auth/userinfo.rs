// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenID Connect user info lookup.

use reqwest::{header::ACCEPT, StatusCode};

use super::AuthError;
use crate::claims::UserInfoClaims;

/// Calls the issuer's user info endpoint with the caller's access token.
pub struct UserInfoClient {
    url: String,
    client: reqwest::Client,
}

impl UserInfoClient {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// A 401 means the token was revoked after validation and is reported as
    /// [`AuthError::UserInfoRejected`]. Any other failure is a server error.
    pub async fn fetch(&self, access_token: &str) -> Result<UserInfoClaims, AuthError> {
        let failure = |reason: String| AuthError::UserInfo {
            url: self.url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<UserInfoClaims>()
                .await
                .map_err(|e| failure(format!("malformed user info response: {e}"))),
            StatusCode::UNAUTHORIZED => Err(AuthError::UserInfoRejected),
            status => Err(failure(format!("HTTP {status} from user info endpoint"))),
        }
    }
}
