// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request logging middleware.
//!
//! Creates the [`LogEntry`] for a request, hands it to inner layers through
//! the request extensions and writes it once the response is ready. Errors
//! travel back in the response extensions as [`ApiError`].

use axum::{
    extract::{rejection::RawPathParamsRejection, MatchedPath, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

use super::LogEntry;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn request_log(
    State(state): State<AppState>,
    path_params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let entry = state.new_log_entry();
    entry.start(request.method(), request.uri(), request.headers());
    if let Ok(params) = &path_params {
        entry.set_resource_id(params.iter().map(|(_, value)| value));
    }

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());
    request.extensions_mut().insert(entry.clone());

    let mut response = next.run(request).await;

    if let Some(error) = response.extensions().get::<ApiError>().cloned() {
        entry.set_error(&error);
        if matches!(error, ApiError::Server(_)) {
            response = error.to_response(&state.api_name);
        }
    }

    entry.end(response.status(), route.as_deref());
    entry.write(state.log_sink.as_ref());
    response
}

/// The log entry of the current request.
///
/// Falls back to a detached entry when the logging middleware is not
/// installed, so callers never need to special-case it.
pub fn current_entry(request_extensions: &axum::http::Extensions, state: &AppState) -> LogEntry {
    request_extensions
        .get::<LogEntry>()
        .cloned()
        .unwrap_or_else(|| state.new_log_entry())
}
