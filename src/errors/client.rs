// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors caused by the caller (4xx), plus the caller-safe view of a 500.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::codes;

/// Generic message for every token validation failure.
///
/// The specific cause is only ever written to logs.
pub const INVALID_TOKEN_MESSAGE: &str = "Missing, invalid or expired access token";

/// JSON body returned to API callers for any classified failure.
///
/// `area`, `id` and `utcTime` are only present for 500 errors, where they
/// give the caller a reference to quote to support staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, rename = "utcTime", skip_serializing_if = "Option::is_none")]
    pub utc_time: Option<String>,
}

/// Support reference attached when a client error is derived from a 500.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorReference {
    area: String,
    instance_id: u32,
    utc_time: String,
}

/// An error the caller can act on, with a message that is safe to return.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ClientError {
    status: StatusCode,
    code: String,
    message: String,
    log_context: Option<Value>,
    reference: Option<ErrorReference>,
}

impl ClientError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            log_context: None,
            reference: None,
        }
    }

    /// Attach data that is written to logs but never returned to the caller.
    pub fn with_log_context(mut self, context: impl Into<Value>) -> Self {
        self.log_context = Some(context.into());
        self
    }

    /// A 401 with the generic token message; `reason` only reaches the logs.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let error = Self::new(StatusCode::UNAUTHORIZED, codes::INVALID_TOKEN, INVALID_TOKEN_MESSAGE);
        if reason.is_empty() {
            error
        } else {
            error.with_log_context(reason)
        }
    }

    /// A 403 raised when the token lacks the scope an operation needs.
    pub fn insufficient_scope(required_scope: &str) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::INSUFFICIENT_SCOPE,
            "Access token does not have a valid scope for this API endpoint",
        )
        .with_log_context(format!("Required scope: '{required_scope}'"))
    }

    /// A 403 raised when a claim needed for authorization is absent.
    pub fn missing_claim(claim_name: &str) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::CLAIMS_FAILURE,
            "Authorization data not found",
        )
        .with_log_context(format!("Missing claim in input: '{claim_name}'"))
    }

    pub(crate) fn with_reference(mut self, area: &str, instance_id: u32, utc_time: &str) -> Self {
        self.reference = Some(ErrorReference {
            area: area.to_string(),
            instance_id,
            utc_time: utc_time.to_string(),
        });
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn log_context(&self) -> Option<&Value> {
        self.log_context.as_ref()
    }

    /// The body returned to the caller.
    pub fn to_response_format(&self) -> ErrorResponse {
        let (area, id, utc_time) = match &self.reference {
            Some(r) => (Some(r.area.clone()), Some(r.instance_id), Some(r.utc_time.clone())),
            None => (None, None, None),
        };

        ErrorResponse {
            code: self.code.clone(),
            message: self.message.clone(),
            area,
            id,
            utc_time,
        }
    }

    /// The block written to the request log.
    pub fn to_log_format(&self) -> Value {
        let mut data = json!({
            "statusCode": self.status.as_u16(),
            "clientError": self.to_response_format(),
        });

        if let Some(context) = &self.log_context {
            data["context"] = context.clone();
        }

        data
    }
}
