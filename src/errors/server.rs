// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Internal failures (5xx).
//!
//! Technical details and the cause chain stay in the logs. Callers only see
//! the error code, the message and an `{area, id, utcTime}` reference.

use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde_json::{json, Value};

use super::client::ClientError;

/// Lowest generated instance id.
pub const MIN_INSTANCE_ID: u32 = 10_000;

/// Highest generated instance id.
pub const MAX_INSTANCE_ID: u32 = 99_999;

/// A failure that is not the caller's fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServerError {
    code: String,
    message: String,
    instance_id: u32,
    utc_time: DateTime<Utc>,
    details: Option<Value>,
    causes: Vec<String>,
}

impl ServerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            instance_id: rand::rng().random_range(MIN_INSTANCE_ID..=MAX_INSTANCE_ID),
            utc_time: Utc::now(),
            details: None,
            causes: Vec::new(),
        }
    }

    /// Attach technical details for the logs.
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Record the message of `cause` and of every error in its source chain.
    pub fn with_cause(mut self, cause: &(dyn std::error::Error + 'static)) -> Self {
        let mut current = Some(cause);
        while let Some(error) = current {
            self.causes.push(error.to_string());
            current = error.source();
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    fn utc_time_text(&self) -> String {
        self.utc_time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// The caller-safe view: code, message and a support reference only.
    pub fn to_client_error(&self, area: &str) -> ClientError {
        ClientError::new(self.status(), self.code.clone(), self.message.clone()).with_reference(
            area,
            self.instance_id,
            &self.utc_time_text(),
        )
    }

    /// The block written to the request log, including technical detail.
    pub fn to_log_format(&self, area: &str) -> Value {
        let mut service_error = json!({ "errorCode": self.code });
        if let Some(details) = &self.details {
            service_error["details"] = details.clone();
        }
        if !self.causes.is_empty() {
            service_error["causes"] = json!(self.causes);
        }

        json!({
            "statusCode": self.status().as_u16(),
            "clientError": self.to_client_error(area).to_response_format(),
            "serviceError": service_error,
        })
    }
}
