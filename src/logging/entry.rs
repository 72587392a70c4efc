// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request log record.
//!
//! One [`LogEntry`] is created per request by the logging middleware and
//! travels in the request extensions. Handlers and the authorizer enrich it.
//! The middleware writes it exactly once when the response is ready.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::performance::{elapsed_ms, Breakdowns, PerformanceBreakdown, PerformanceSpan};
use super::sink::LogSink;
use crate::claims::TokenClaims;
use crate::errors::ApiError;

/// Optional header naming the calling application.
pub const CLIENT_NAME_HEADER: &str = "x-api-client-name";

/// Optional header linking related requests; generated when absent.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Optional header grouping requests from one client session.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Fields written for one request. Empty strings and zero numbers are
/// omitted, except `millisecondsTaken`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryData {
    #[serde(rename = "type")]
    pub record_type: String,
    pub id: String,
    pub utc_time: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operation_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(skip_serializing_if = "is_zero_u16")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_code: String,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub error_id: u32,
    pub milliseconds_taken: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub info_data: Vec<Value>,
}

fn is_zero_u16(value: &u16) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

struct EntryState {
    data: LogEntryData,
    performance_threshold_ms: u64,
    started_at: Option<Instant>,
    ended: bool,
    written: bool,
}

/// Cloneable handle to the log record of one request.
#[derive(Clone)]
pub struct LogEntry {
    state: Arc<Mutex<EntryState>>,
    breakdowns: Arc<Breakdowns>,
}

impl LogEntry {
    pub fn new(api_name: &str, host_name: &str, performance_threshold: Duration) -> Self {
        let data = LogEntryData {
            record_type: "request".to_string(),
            id: Uuid::new_v4().to_string(),
            utc_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            api_name: api_name.to_string(),
            host_name: host_name.to_string(),
            ..Default::default()
        };

        Self {
            state: Arc::new(Mutex::new(EntryState {
                data,
                performance_threshold_ms: u64::try_from(performance_threshold.as_millis())
                    .unwrap_or(u64::MAX),
                started_at: None,
                ended: false,
                written: false,
            })),
            breakdowns: Arc::new(Breakdowns::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Capture the start time and request metadata.
    ///
    /// Calling this again on a started entry changes nothing.
    pub fn start(&self, method: &Method, uri: &Uri, headers: &HeaderMap) {
        let mut state = self.state();
        if state.started_at.is_some() {
            return;
        }
        state.started_at = Some(Instant::now());

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let data = &mut state.data;
        data.method = method.to_string();
        data.path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        data.client_name = header(CLIENT_NAME_HEADER).unwrap_or_default();
        data.correlation_id =
            header(CORRELATION_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string());
        data.session_id = header(SESSION_ID_HEADER).unwrap_or_default();
    }

    pub fn set_operation_name(&self, name: impl Into<String>) {
        self.state().data.operation_name = name.into();
    }

    /// Record who made the request.
    pub fn set_identity(&self, claims: &TokenClaims) {
        let mut state = self.state();
        state.data.user_id = claims.subject().to_string();
        state.data.scope = claims.scopes().iter().cloned().collect();
        state.data.client_id = claims.client_id().unwrap_or_default().to_string();
    }

    /// Join path parameter values into the resource id.
    pub fn set_resource_id<I, S>(&self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("/");
        self.state().data.resource_id = joined;
    }

    /// Record a classified failure.
    pub fn set_error(&self, error: &ApiError) {
        let mut state = self.state();
        let log_format = error.to_log_format(&state.data.api_name);
        state.data.error_data = Some(log_format);
        state.data.error_code = error.code().to_string();
        state.data.error_id = match error {
            ApiError::Server(e) => e.instance_id(),
            ApiError::Client(_) => 0,
        };
    }

    /// Attach free-form information to the record.
    pub fn add_info(&self, info: impl Into<Value>) {
        self.state().data.info_data.push(info.into());
    }

    /// Open a top-level timing span.
    pub fn create_performance_breakdown(&self, name: impl Into<String>) -> PerformanceSpan<'static> {
        PerformanceSpan::for_entry(name, self.breakdowns.clone())
    }

    /// Capture the final status and the operation name.
    ///
    /// `default_operation` is used when no handler set an operation name.
    pub fn end(&self, status: StatusCode, default_operation: Option<&str>) {
        let mut state = self.state();
        if state.ended {
            return;
        }
        state.ended = true;
        state.data.status_code = status.as_u16();
        if state.data.operation_name.is_empty() {
            if let Some(name) = default_operation {
                state.data.operation_name = name.to_string();
            }
        }
        Self::finalise(&mut state, &self.breakdowns);
    }

    fn finalise(state: &mut EntryState, breakdowns: &Breakdowns) {
        let total = state.started_at.map(elapsed_ms).unwrap_or(0);
        state.data.milliseconds_taken = total;

        if total >= state.performance_threshold_ms {
            let children = breakdowns
                .lock()
                .map(|b| b.clone())
                .unwrap_or_default();
            state.data.performance = Some(PerformanceBreakdown {
                name: "total".to_string(),
                milliseconds_taken: total,
                details: None,
                children,
            });
        }
    }

    /// Write the record to `sink`. Only the first call writes.
    ///
    /// Returns whether this call wrote the record.
    pub fn write(&self, sink: &dyn LogSink) -> bool {
        let (record, is_error) = {
            let mut state = self.state();
            if state.written {
                return false;
            }
            state.written = true;
            if !state.ended {
                state.ended = true;
                Self::finalise(&mut state, &self.breakdowns);
            }

            let is_error = state.data.error_data.is_some();
            match serde_json::to_value(&state.data) {
                Ok(record) => (record, is_error),
                Err(_) => return false,
            }
        };

        if is_error {
            sink.error(&record);
        } else {
            sink.info(&record);
        }
        true
    }

    /// A copy of the current record.
    pub fn data(&self) -> LogEntryData {
        self.state().data.clone()
    }
}
