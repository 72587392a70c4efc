// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Logging
//!
//! Two kinds of output share one `tracing` subscriber:
//!
//! - process events (`info!`, `warn!`, ...) from across the crate
//! - one request record per HTTP request, built by [`LogEntry`] and written
//!   by [`middleware::request_log`] on the `api_request` target

pub mod entry;
pub mod middleware;
pub mod performance;
pub mod sink;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig, DEFAULT_LOG_FILTER};

pub use entry::{LogEntry, LogEntryData, CLIENT_NAME_HEADER, CORRELATION_ID_HEADER, SESSION_ID_HEADER};
pub use performance::{PerformanceBreakdown, PerformanceSpan};
pub use sink::{LogSink, TracingLogSink, REQUEST_LOG_TARGET};

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}
