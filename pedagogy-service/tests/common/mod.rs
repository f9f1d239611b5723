//! Test helpers for pedagogy-service integration tests.
//!
//! Requests go straight to the router with `oneshot`; the provider is the
//! mock, the work history lives in memory and exports use a fake renderer.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pedagogy_service::config::PedagogyConfig;
use pedagogy_service::models::{JobStatus, WorkRecord};
use pedagogy_service::services::export::{DocumentRenderer, ExportError, Exporter};
use pedagogy_service::services::history::{InMemoryWorkHistory, WorkHistoryStore};
use pedagogy_service::services::providers::mock::MockTextProvider;
use pedagogy_service::services::providers::TextProvider;
use pedagogy_service::startup::{router, AppState};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_USER: &str = "profesora-1";

/// Renderer that returns a format marker followed by the wrapped HTML.
pub struct FakeRenderer(pub &'static str);

#[async_trait]
impl DocumentRenderer for FakeRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        Ok(format!("{}\n{}", self.0, html).into_bytes())
    }
}

/// Renderer whose converter always fails.
pub struct BrokenRenderer;

#[async_trait]
impl DocumentRenderer for BrokenRenderer {
    async fn render(&self, _html: &str) -> Result<Vec<u8>, ExportError> {
        Err(ExportError::Failed("converter exited with status 1".to_string()))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub history: Arc<InMemoryWorkHistory>,
    pub provider: Arc<MockTextProvider>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_provider(MockTextProvider::new(true))
    }

    pub fn with_provider(provider: MockTextProvider) -> Self {
        Self::build(PedagogyConfig::for_tests(), provider, fake_exporter())
    }

    pub fn build(config: PedagogyConfig, provider: MockTextProvider, exporter: Exporter) -> Self {
        let history = Arc::new(InMemoryWorkHistory::new());
        let provider = Arc::new(provider);
        let state = AppState::new(
            config,
            provider.clone() as Arc<dyn TextProvider>,
            history.clone() as Arc<dyn WorkHistoryStore>,
            exporter,
        );

        Self {
            state,
            history,
            provider,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, &body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-user-id", TEST_USER)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        read_json(response).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .uri(uri)
                    .header("x-user-id", TEST_USER)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        read_json(response).await
    }

    /// Poll the store until the job reaches `status` or two seconds pass.
    pub async fn wait_for_status(&self, job_id: &str, status: JobStatus) -> WorkRecord {
        for _ in 0..200 {
            if let Some(record) = self.history.find_by_job_id(job_id).await.unwrap() {
                if record.status == status {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached status {}", job_id, status);
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.state.shutdown.cancel();
    }
}

pub fn fake_exporter() -> Exporter {
    Exporter::with_renderers(
        "Colegio Madre Paulina",
        Arc::new(FakeRenderer("DOCX")),
        Arc::new(FakeRenderer("PDF")),
    )
}

pub async fn read_body(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
