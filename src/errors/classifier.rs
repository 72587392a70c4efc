// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Maps arbitrary failures into the [`ApiError`] taxonomy.

use std::any::Any;
use std::error::Error;

use super::{codes, ApiError, ClientError, ServerError};
use crate::auth::AuthError;

const UNEXPECTED_MESSAGE: &str = "An unexpected exception occurred in the API";

/// Classifies failures as client or server errors.
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Walk the source chain of `error` for an already classified error.
    ///
    /// Wrapping errors (for example a provider error type that keeps an
    /// [`ApiError`] as its `source`) are looked through. Anything else becomes
    /// a `server_error` that keeps the message chain for the logs.
    pub fn classify(error: &(dyn Error + 'static)) -> ApiError {
        let mut current = Some(error);
        while let Some(candidate) = current {
            if let Some(classified) = Self::as_classified(candidate) {
                return classified;
            }
            current = candidate.source();
        }

        Self::unexpected(error)
    }

    /// A `server_error` built from an unclassified failure.
    pub fn unexpected(error: &(dyn Error + 'static)) -> ApiError {
        ServerError::new(codes::SERVER_ERROR, UNEXPECTED_MESSAGE)
            .with_details(error.to_string())
            .with_cause(error)
            .into()
    }

    /// A `server_error` built from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> ApiError {
        let details = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };

        ServerError::new(codes::SERVER_ERROR, UNEXPECTED_MESSAGE)
            .with_details(details)
            .into()
    }

    fn as_classified(error: &(dyn Error + 'static)) -> Option<ApiError> {
        if let Some(e) = error.downcast_ref::<ApiError>() {
            return Some(e.clone());
        }
        if let Some(e) = error.downcast_ref::<ServerError>() {
            return Some(ApiError::Server(e.clone()));
        }
        if let Some(e) = error.downcast_ref::<ClientError>() {
            return Some(ApiError::Client(e.clone()));
        }
        if let Some(e) = error.downcast_ref::<AuthError>() {
            return Some(ApiError::from(e.clone()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[derive(Debug, thiserror::Error)]
    #[error("repository lookup failed")]
    struct RepositoryError(#[source] ApiError);

    #[derive(Debug, thiserror::Error)]
    #[error("task failed")]
    struct TaskError(#[source] RepositoryError);

    #[test]
    fn finds_nested_client_error() {
        let inner = ApiError::from(ClientError::insufficient_scope("transactions"));
        let wrapped = TaskError(RepositoryError(inner));

        let classified = ErrorClassifier::classify(&wrapped);
        assert_eq!(classified.status(), StatusCode::FORBIDDEN);
        assert_eq!(classified.code(), "insufficient_scope");
    }

    #[test]
    fn finds_nested_server_error() {
        let server = ServerError::new("jwks_download_failure", "Problem downloading token signing keys");
        let id = server.instance_id();
        let wrapped = RepositoryError(server.into());

        match ErrorClassifier::classify(&wrapped) {
            ApiError::Server(e) => assert_eq!(e.instance_id(), id),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn auth_errors_are_collapsed() {
        let classified = ErrorClassifier::classify(&AuthError::InvalidIssuer);
        assert_eq!(classified.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(classified.code(), "invalid_token");
    }

    #[test]
    fn unknown_errors_become_server_errors() {
        let io = std::io::Error::other("socket closed");
        match ErrorClassifier::classify(&io) {
            ApiError::Server(e) => {
                assert_eq!(e.code(), "server_error");
                assert_eq!(e.details().unwrap(), "socket closed");
                assert_eq!(e.causes(), ["socket closed"]);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn boxed_errors_are_classified() {
        let boxed: Box<dyn Error + Send + Sync> =
            Box::new(ApiError::from(ClientError::missing_claim("manager_id")));
        let classified = ErrorClassifier::classify(boxed.as_ref());
        assert_eq!(classified.code(), "claims_failure");
    }

    #[test]
    fn panic_payload_is_kept_in_details() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        match ErrorClassifier::from_panic(payload) {
            ApiError::Server(e) => assert_eq!(e.details().unwrap(), "index out of bounds"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
