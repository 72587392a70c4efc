// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error codes returned to callers and written to request logs.

/// Generic code for unexpected failures.
pub const SERVER_ERROR: &str = "server_error";

/// Missing, invalid or expired access token.
pub const INVALID_TOKEN: &str = "invalid_token";

/// Token signing keys could not be downloaded.
pub const JWKS_DOWNLOAD_FAILURE: &str = "jwks_download_failure";

/// The introspection endpoint could not be called or returned an error.
pub const INTROSPECTION_FAILURE: &str = "introspection_failure";

/// The user info endpoint could not be called or returned an error.
pub const USERINFO_FAILURE: &str = "userinfo_failure";

/// The token does not carry the scope an operation requires.
pub const INSUFFICIENT_SCOPE: &str = "insufficient_scope";

/// A claim needed for authorization was not present.
pub const CLAIMS_FAILURE: &str = "claims_failure";

/// A tester asked the API to fail via the test exception header.
pub const EXCEPTION_SIMULATION: &str = "exception_simulation";

/// Sample API: the company id in the path is not a positive integer.
pub const INVALID_COMPANY_ID: &str = "invalid_company_id";

/// Sample API: the company does not exist or the caller may not see it.
pub const COMPANY_NOT_FOUND: &str = "company_not_found";
