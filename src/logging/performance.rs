// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Nested timing spans for request logs.
//!
//! A [`PerformanceSpan`] records its elapsed time into its parent when it is
//! dropped, on success and error paths alike. Children borrow their parent,
//! so a parent cannot be closed while a child is still open.

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

/// A closed timing measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBreakdown {
    pub name: String,
    pub milliseconds_taken: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PerformanceBreakdown>,
}

pub(crate) type Breakdowns = Mutex<Vec<PerformanceBreakdown>>;

enum Parent<'a> {
    Entry(Arc<Breakdowns>),
    Span(&'a Breakdowns),
}

/// An open timing measurement.
pub struct PerformanceSpan<'a> {
    name: String,
    started: Instant,
    details: Option<Value>,
    children: Breakdowns,
    parent: Parent<'a>,
}

impl PerformanceSpan<'static> {
    pub(crate) fn for_entry(name: impl Into<String>, breakdowns: Arc<Breakdowns>) -> Self {
        Self::open(name.into(), Parent::Entry(breakdowns))
    }
}

impl<'a> PerformanceSpan<'a> {
    fn open(name: String, parent: Parent<'a>) -> Self {
        Self {
            name,
            started: Instant::now(),
            details: None,
            children: Mutex::new(Vec::new()),
            parent,
        }
    }

    /// Open a nested span.
    pub fn child(&self, name: impl Into<String>) -> PerformanceSpan<'_> {
        PerformanceSpan::open(name.into(), Parent::Span(&self.children))
    }

    /// Attach structured detail, such as the resource being looked up.
    pub fn set_details(&mut self, details: impl Into<Value>) {
        self.details = Some(details.into());
    }

    /// Close the span now rather than at the end of the scope.
    pub fn close(self) {}
}

impl Drop for PerformanceSpan<'_> {
    fn drop(&mut self) {
        let children = self
            .children
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        let breakdown = PerformanceBreakdown {
            name: mem::take(&mut self.name),
            milliseconds_taken: elapsed_ms(self.started),
            details: self.details.take(),
            children: mem::take(children),
        };

        let parent = match &self.parent {
            Parent::Entry(breakdowns) => breakdowns.as_ref(),
            Parent::Span(breakdowns) => *breakdowns,
        };
        if let Ok(mut siblings) = parent.lock() {
            siblings.push(breakdown);
        }
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
