// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Taxonomy
//!
//! Every failure that reaches the response boundary is an [`ApiError`]:
//!
//! - [`ClientError`] - the caller's fault (4xx), safe message, optional
//!   log-only context
//! - [`ServerError`] - an internal fault (500), full technical detail kept in
//!   logs, caller receives `{code, message, area, id, utcTime}`
//!
//! Unknown failures are mapped with [`ErrorClassifier`].

pub mod classifier;
pub mod client;
pub mod codes;
pub mod server;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

pub use classifier::ErrorClassifier;
pub use client::{ClientError, ErrorResponse, INVALID_TOKEN_MESSAGE};
pub use server::{ServerError, MAX_INSTANCE_ID, MIN_INSTANCE_ID};

/// A classified failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Client(e) => e.status(),
            ApiError::Server(e) => e.status(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::Client(e) => e.code(),
            ApiError::Server(e) => e.code(),
        }
    }

    /// The caller-safe error, with a support reference for 500s.
    pub fn to_client_error(&self, area: &str) -> ClientError {
        match self {
            ApiError::Client(e) => e.clone(),
            ApiError::Server(e) => e.to_client_error(area),
        }
    }

    /// The error block of the request log.
    pub fn to_log_format(&self, area: &str) -> Value {
        match self {
            ApiError::Client(e) => e.to_log_format(),
            ApiError::Server(e) => e.to_log_format(area),
        }
    }

    /// Render the final response for an API named `area`.
    pub fn to_response(&self, area: &str) -> Response {
        let client = self.to_client_error(area);
        let mut response = (client.status(), Json(client.to_response_format())).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

/// Renders a provisional body and carries the error in the response
/// extensions.
///
/// The request logging middleware picks the error up from there, records it
/// and re-renders 500 bodies with the API name as the support `area`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Client(e) => e.to_response_format(),
            ApiError::Server(e) => ErrorResponse {
                code: e.code().to_string(),
                message: e.message().to_string(),
                area: None,
                id: Some(e.instance_id()),
                utc_time: None,
            },
        };

        let mut response = (self.status(), Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}
