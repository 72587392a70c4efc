// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth Claims API - API-side authorization with claims caching
//!
//! Every protected request presents a bearer access token. The token is
//! validated once, enriched with business claims and cached until it expires.
//! Each request produces exactly one structured log record.
//!
//! ## Modules
//!
//! - `api` - HTTP routes (Axum) for the sample investments API
//! - `auth` - Token validation, user info and the authorizer
//! - `claims` - Claims principal, extra claims providers and the claims cache
//! - `errors` - Client and server error taxonomy
//! - `logging` - Request log records, performance timings and tracing setup

pub mod api;
pub mod auth;
pub mod claims;
pub mod config;
pub mod errors;
pub mod logging;
pub mod state;

#[cfg(test)]
mod test_support;
