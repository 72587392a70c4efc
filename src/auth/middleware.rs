// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization middleware for Axum.
//!
//! Applied with `route_layer` to every protected route. On success the
//! principal is stored in the request extensions, where the
//! [`Auth`](super::extractor::Auth) extractor finds it.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/investments/companies", get(list_companies))
//!     .route_layer(from_fn_with_state(state.clone(), authorize));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::{codes, ApiError, ServerError};
use crate::logging::middleware::current_entry;
use crate::state::AppState;

/// Testers set this header to an API's name to make that API fail with a 500.
pub const TEST_EXCEPTION_HEADER: &str = "x-test-exception";

pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let entry = current_entry(&parts.extensions, &state);
    entry.start(&parts.method, &parts.uri, &parts.headers);

    let principal = match state.authorizer.authorize(&parts.headers, &entry).await {
        Ok(principal) => principal,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = simulated_exception(&parts.headers, &state.api_name) {
        return error.into_response();
    }

    parts.extensions.insert(Arc::new(principal));
    next.run(Request::from_parts(parts, body)).await
}

fn simulated_exception(headers: &HeaderMap, api_name: &str) -> Result<(), ApiError> {
    let requested = headers
        .get(TEST_EXCEPTION_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|target| target.eq_ignore_ascii_case(api_name));

    if requested {
        return Err(ServerError::new(
            codes::EXCEPTION_SIMULATION,
            "An exception was simulated in the API",
        )
        .into());
    }
    Ok(())
}
