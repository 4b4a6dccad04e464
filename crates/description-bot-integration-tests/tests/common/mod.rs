//! Common test utilities for description-bot integration tests
//!
//! This module provides:
//! - Recording mock implementations of `TextGenerator` and `CatalogConnector`
//! - A valid test configuration and matching request builders
//! - Shared webhook payloads

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use description_bot_api::{create_router, AppState, MessageResponse, ServiceConfig};
use description_bot_core::{
    CatalogClient, CatalogConnector, CatalogError, GenerationError, TextGenerator,
};
use std::sync::{Arc, Mutex};

pub const USERNAME: &str = "leanix";
pub const PASSWORD: &str = "s3cret";
pub const USER_AGENT: &str = "LeanIX-Webhooks/1.0";
pub const ORIGIN: &str = "https://demo.leanix.net/services/webhooks";

// ============================================================================
// Mock Text Generator
// ============================================================================

/// Generator returning a fixed result and recording every call
#[derive(Clone)]
pub struct MockGenerator {
    result: Result<String, GenerationError>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGenerator {
    pub fn returning(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            result: Err(error),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recorded `(subject_name, prompt_template)` pairs
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate_description(
        &self,
        subject_name: &str,
        prompt_template: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((subject_name.to_string(), prompt_template.to_string()));
        self.result.clone()
    }
}

// ============================================================================
// Mock Catalog
// ============================================================================

/// Catalog recording connects and comments
#[derive(Clone, Default)]
pub struct MockCatalog {
    connect_error: Option<CatalogError>,
    comment_error: Option<CatalogError>,
    connects: Arc<Mutex<usize>>,
    comments: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_connect(error: CatalogError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::default()
        }
    }

    pub fn failing_comment(error: CatalogError) -> Self {
        Self {
            comment_error: Some(error),
            ..Self::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        *self.connects.lock().unwrap()
    }

    /// Recorded `(fact_sheet_id, comment)` pairs
    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }
}

struct MockCatalogClient {
    comment_error: Option<CatalogError>,
    comments: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn add_comment(&self, fact_sheet_id: &str, comment: &str) -> Result<(), CatalogError> {
        self.comments
            .lock()
            .unwrap()
            .push((fact_sheet_id.to_string(), comment.to_string()));
        match &self.comment_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogConnector for MockCatalog {
    async fn connect(&self) -> Result<Box<dyn CatalogClient>, CatalogError> {
        *self.connects.lock().unwrap() += 1;
        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }
        Ok(Box::new(MockCatalogClient {
            comment_error: self.comment_error.clone(),
            comments: Arc::clone(&self.comments),
        }))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Configuration matching the request builders below
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.security.username = USERNAME.to_string();
    config.security.password = PASSWORD.to_string();
    config.security.allowed_user_agents = vec![USER_AGENT.to_string()];
    config
}

/// Router wired to the given mocks
pub fn create_test_router(
    config: ServiceConfig,
    generator: &MockGenerator,
    catalog: &MockCatalog,
) -> Router {
    let state = AppState::build(config, Arc::new(generator.clone()), Arc::new(catalog.clone()))
        .expect("test configuration should be valid");
    create_router(state)
}

/// `Authorization` header value for the given credentials
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Request builder carrying every header the gatekeeper expects
pub fn admitted_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::AUTHORIZATION, basic_auth(USERNAME, PASSWORD))
        .header(header::USER_AGENT, USER_AGENT)
        .header("X-Webhooks-Event", ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
}

/// Admitted webhook request with the given body
pub fn webhook_request(body: impl Into<Body>) -> Request<Body> {
    admitted_request().body(body.into()).unwrap()
}

/// Admitted webhook request with one header replaced
pub fn webhook_request_with_header(
    name: &'static str,
    value: &str,
    body: impl Into<Body>,
) -> Request<Body> {
    let mut request = webhook_request(body);
    request.headers_mut().insert(
        header::HeaderName::from_static(name),
        header::HeaderValue::from_str(value).unwrap(),
    );
    request
}

/// JSON body of a fact sheet event
pub fn event_body(event_type: &str, id: &str, name: &str, fact_sheet_type: &str) -> String {
    serde_json::json!({
        "type": event_type,
        "factSheet": {
            "id": id,
            "name": name,
            "type": fact_sheet_type
        }
    })
    .to_string()
}

/// Body of scenario events: a newly created application
pub fn created_application_body() -> String {
    event_body("FactSheetCreatedEvent", "abc", "Orders API", "Application")
}

/// Decode the `{"message": ...}` response body
pub async fn response_message(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body: MessageResponse = serde_json::from_slice(&bytes).expect("body should be JSON");
    body.message
}
