// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;

use axum::{
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::middleware::authorize;
use crate::errors::ErrorClassifier;
use crate::logging::middleware::request_log;
use crate::state::AppState;

pub mod companies;
pub mod health;
pub mod userinfo;

/// Build the HTTP router.
///
/// Layers, outermost first: CORS, HTTP tracing, request logging, panic
/// capture. Protected routes additionally run the `authorize` middleware.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/investments/userinfo", get(userinfo::get_user_info))
        .route("/investments/companies", get(companies::list_companies))
        .route(
            "/investments/companies/{company_id}/transactions",
            get(companies::get_company_transactions),
        )
        .route_layer(from_fn_with_state(state.clone(), authorize));

    Router::new()
        .route("/health", get(health::health))
        .merge(protected)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.clone(), request_log))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    ErrorClassifier::from_panic(payload).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use jsonwebtoken::Algorithm;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::authorizer::ClaimsAuthorizer;
    use crate::auth::introspection::IntrospectionValidator;
    use crate::auth::jwks::JwksManager;
    use crate::auth::jwt::JwtValidator;
    use crate::auth::middleware::TEST_EXCEPTION_HEADER;
    use crate::auth::validator::TokenValidator;
    use crate::claims::{ClaimsCache, SampleExtraClaimsProvider};
    use crate::errors::{codes, INVALID_TOKEN_MESSAGE, MAX_INSTANCE_ID, MIN_INSTANCE_ID};
    use crate::logging::sink::MemoryLogSink;
    use crate::logging::CORRELATION_ID_HEADER;
    use crate::test_support::{
        jwks_body, now_secs, TokenBuilder, AUDIENCE, ISSUER, KEY_ID, ROGUE_KEY_PEM, SIGNING_KEY_N,
        SUBJECT,
    };

    struct TestApp {
        router: Router,
        sink: Arc<MemoryLogSink>,
        state: AppState,
        _server: MockServer,
    }

    impl TestApp {
        fn new(validator: Arc<dyn TokenValidator>, server: MockServer) -> Self {
            let sink = Arc::new(MemoryLogSink::default());
            let authorizer = ClaimsAuthorizer::new(
                validator,
                Arc::new(SampleExtraClaimsProvider),
                Arc::new(ClaimsCache::new(100, 30)),
            );
            let state = AppState::new("SampleApi", authorizer).with_log_sink(sink.clone());

            Self {
                router: router(state.clone()),
                sink,
                state,
                _server: server,
            }
        }

        async fn with_jwks() -> Self {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/jwks"))
                .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(KEY_ID, SIGNING_KEY_N)))
                .mount(&server)
                .await;

            let jwks = Arc::new(JwksManager::new(
                format!("{}/jwks", server.uri()),
                reqwest::Client::new(),
            ));
            let validator =
                JwtValidator::new(jwks, ISSUER, Algorithm::RS256).with_audience(AUDIENCE);
            Self::new(Arc::new(validator), server)
        }

        async fn get(&self, uri: &str, token: Option<&str>, headers: &[(&str, &str)]) -> (StatusCode, Value) {
            let mut builder = Request::builder().uri(uri);
            if let Some(token) = token {
                builder = builder.header("authorization", format!("Bearer {token}"));
            }
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }

            let response = self
                .router
                .clone()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        fn last_record(&self) -> Value {
            self.sink.records().last().unwrap().1.clone()
        }
    }

    #[tokio::test]
    async fn missing_token_is_invalid_token() {
        let app = TestApp::with_jwks().await;
        let (status, body) = app.get("/investments/companies", None, &[]).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"code": "invalid_token", "message": INVALID_TOKEN_MESSAGE}));

        let records = app.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, tracing::Level::ERROR);
        assert_eq!(records[0].1["statusCode"], 401);
        assert_eq!(records[0].1["errorCode"], "invalid_token");
        assert_eq!(records[0].1["operationName"], "/investments/companies");
    }

    #[tokio::test]
    async fn valid_token_returns_data_and_logs_identity() {
        let app = TestApp::with_jwks().await;
        let token = TokenBuilder::new().sign();
        let (status, body) = app
            .get(
                "/investments/companies/2/transactions",
                Some(&token),
                &[(CORRELATION_ID_HEADER, "corr-42")],
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["company"]["name"], "Company 2");

        assert_eq!(app.sink.len(), 1);
        let record = app.last_record();
        assert_eq!(record["userId"], SUBJECT);
        assert_eq!(record["clientId"], "spa-client");
        assert_eq!(record["resourceId"], "2");
        assert_eq!(record["operationName"], "getCompanyTransactions");
        assert_eq!(record["correlationId"], "corr-42");
        assert_eq!(record["statusCode"], 200);
        assert!(record.get("errorData").is_none());
    }

    #[tokio::test]
    async fn token_without_transactions_scope_is_forbidden() {
        let app = TestApp::with_jwks().await;
        let token = TokenBuilder::new().claim("scope", "openid profile").sign();
        let (status, body) = app.get("/investments/companies", Some(&token), &[]).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "insufficient_scope");
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn simulated_exception_returns_support_reference() {
        let app = TestApp::with_jwks().await;
        let token = TokenBuilder::new().sign();
        let (status, body) = app
            .get("/investments/companies", Some(&token), &[(TEST_EXCEPTION_HEADER, "SampleApi")])
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], codes::EXCEPTION_SIMULATION);
        assert_eq!(body["area"], "SampleApi");
        assert!(body["utcTime"].as_str().is_some());
        let id = body["id"].as_u64().unwrap();
        assert!((u64::from(MIN_INSTANCE_ID)..=u64::from(MAX_INSTANCE_ID)).contains(&id));

        let record = app.last_record();
        assert_eq!(app.sink.records().last().unwrap().0, tracing::Level::ERROR);
        assert_eq!(record["errorId"], id);
        assert_eq!(record["errorCode"], codes::EXCEPTION_SIMULATION);
    }

    #[tokio::test]
    async fn rejected_tokens_share_one_generic_error() {
        let app = TestApp::with_jwks().await;
        let tokens = [
            TokenBuilder::new().claim("iss", "https://evil.example.com").sign(),
            TokenBuilder::new().claim("aud", "other-api").sign(),
            TokenBuilder::new().claim("exp", now_secs() - 3600).sign(),
            TokenBuilder::new().signed_with(ROGUE_KEY_PEM).sign(),
            "not-a-jwt".to_string(),
        ];

        for token in &tokens {
            let (status, body) = app.get("/investments/userinfo", Some(token), &[]).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({"code": "invalid_token", "message": INVALID_TOKEN_MESSAGE}));
        }
        assert_eq!(app.sink.len(), tokens.len());
        assert!(app.state.claims_cache().is_empty());
    }

    #[tokio::test]
    async fn concurrent_requests_with_new_token_agree() {
        let app = TestApp::with_jwks().await;
        let token = TokenBuilder::new().sign();

        let (first, second) = tokio::join!(
            app.get("/investments/userinfo", Some(&token), &[]),
            app.get("/investments/userinfo", Some(&token), &[]),
        );

        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(second.0, StatusCode::OK);
        assert_eq!(first.1, second.1);
        assert_eq!(first.1["title"], "Global Manager");
        assert_eq!(app.sink.len(), 2);
    }

    #[tokio::test]
    async fn cached_claims_skip_the_authorization_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "active": true,
                "sub": SUBJECT,
                "scope": "openid investments transactions",
                "exp": now_secs() + 900,
                "manager_id": "10345",
                "role": "user",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let validator = IntrospectionValidator::new(
            format!("{}/introspect", server.uri()),
            "api-client",
            "secret",
            reqwest::Client::new(),
        );
        let app = TestApp::new(Arc::new(validator), server);

        let (status, first) = app.get("/investments/companies", Some("opaque-token"), &[]).await;
        assert_eq!(status, StatusCode::OK);
        let (status, second) = app.get("/investments/companies", Some("opaque-token"), &[]).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(first, second);
        assert_eq!(first.as_array().unwrap().len(), 2);
        assert_eq!(app.state.claims_cache().len(), 1);
    }

    #[tokio::test]
    async fn jwks_outage_is_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let jwks = Arc::new(JwksManager::new(
            format!("{}/jwks", server.uri()),
            reqwest::Client::new(),
        ));
        let app = TestApp::new(Arc::new(JwtValidator::new(jwks, ISSUER, Algorithm::RS256)), server);

        let token = TokenBuilder::new().sign();
        let (status, body) = app.get("/investments/userinfo", Some(&token), &[]).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], codes::JWKS_DOWNLOAD_FAILURE);
        assert_eq!(body["area"], "SampleApi");

        let record = app.last_record();
        let details = record["errorData"]["serviceError"]["details"].as_str().unwrap_or_default();
        assert!(details.contains("/jwks"));
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = TestApp::with_jwks().await;
        let (status, body) = app.get("/health", None, &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(app.sink.len(), 1);
        assert_eq!(app.sink.records()[0].0, tracing::Level::INFO);
    }
}
