// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authorized principal.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal.subject(), principal.extra().regions, ...
//! }
//! ```

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::claims::{ClaimsPrincipal, SampleExtraClaims};
use crate::errors::ApiError;
use crate::logging::middleware::current_entry;
use crate::state::AppState;

/// The principal of the current request.
///
/// Uses the principal stored by the [`authorize`](super::middleware::authorize)
/// middleware when present, and otherwise authorizes the request itself.
pub struct Auth(pub Arc<ClaimsPrincipal<SampleExtraClaims>>);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts
            .extensions
            .get::<Arc<ClaimsPrincipal<SampleExtraClaims>>>()
            .cloned()
        {
            return Ok(Auth(principal));
        }

        let entry = current_entry(&parts.extensions, state);
        entry.start(&parts.method, &parts.uri, &parts.headers);

        let principal = Arc::new(state.authorizer.authorize(&parts.headers, &entry).await?);
        parts.extensions.insert(principal.clone());
        Ok(Auth(principal))
    }
}
