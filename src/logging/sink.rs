// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Destinations for request log records.

use serde_json::Value;
use tracing::{error, info};

/// Tracing target used for request records, so they can be filtered
/// separately with `RUST_LOG=api_request=info`.
pub const REQUEST_LOG_TARGET: &str = "api_request";

/// Receives finished request records.
pub trait LogSink: Send + Sync {
    fn info(&self, record: &Value);
    fn error(&self, record: &Value);
}

/// Emits request records as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn info(&self, record: &Value) {
        info!(target: REQUEST_LOG_TARGET, request = %record, "API request");
    }

    fn error(&self, record: &Value) {
        error!(target: REQUEST_LOG_TARGET, request = %record, "API request failed");
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryLogSink;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use serde_json::Value;
    use tracing::Level;

    use super::LogSink;

    /// Keeps records in memory for assertions.
    #[derive(Default)]
    pub(crate) struct MemoryLogSink {
        records: Mutex<Vec<(Level, Value)>>,
    }

    impl MemoryLogSink {
        pub(crate) fn records(&self) -> Vec<(Level, Value)> {
            self.records.lock().unwrap().clone()
        }

        pub(crate) fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl LogSink for MemoryLogSink {
        fn info(&self, record: &Value) {
            self.records.lock().unwrap().push((Level::INFO, record.clone()));
        }

        fn error(&self, record: &Value) {
            self.records.lock().unwrap().push((Level::ERROR, record.clone()));
        }
    }
}
