//! Common test utilities for the invocation endpoint.
//!
//! Builds the router in-process with a scripted booking client so requests
//! can be driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use oddjob_cli::{
    api::create_router,
    state::{AppState, ClientFactory},
};
use oddjob_core::{
    testing::MockBookingClient, BookingClient, BookingClientError, OrchestratorConfig, Platform,
};

/// Re-export fixtures for test convenience
pub use oddjob_core::testing::fixtures;

/// An in-process server with one mock platform client.
pub struct TestFixture {
    pub router: Router,
    pub client: MockBookingClient,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// A fixture serving Resy bookings only.
    pub fn new() -> Self {
        Self::for_platform(Platform::Resy)
    }

    pub fn for_platform(platform: Platform) -> Self {
        let client = MockBookingClient::new(platform);
        let state = AppState::new(OrchestratorConfig {
            max_attempts: 3,
            retry_delay_ms: 1,
        })
        .with_client_factory(platform, {
            let client = client.clone();
            let factory: ClientFactory =
                Arc::new(move || -> Result<Box<dyn BookingClient>, BookingClientError> {
                    Ok(Box::new(client.clone()))
                });
            factory
        })
        .with_today(fixtures::today());

        Self {
            router: create_router(Arc::new(state)),
            client,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }
}
