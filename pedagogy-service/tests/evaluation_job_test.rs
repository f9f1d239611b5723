//! Evaluation jobs: submit, worker processing, polling and inline runs.

mod common;

use axum::http::StatusCode;
use common::{fake_exporter, TestApp, TEST_USER};
use pedagogy_service::config::PedagogyConfig;
use pedagogy_service::models::{JobStatus, NewWorkRecord};
use pedagogy_service::services::history::WorkHistoryStore;
use pedagogy_service::services::providers::mock::MockTextProvider;
use serde_json::{json, Value};

fn evaluation_body() -> Value {
    json!({
        "titulo": "Evaluación de ciencias",
        "objetivos": ["OA 1: Explicar la fotosíntesis", "OA 2: Reconocer la célula"],
        "contenido": "La fotosíntesis y la célula vegetal",
        "tiempoEstimado": "60 minutos"
    })
}

#[tokio::test]
async fn submit_returns_accepted_with_status_endpoint() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json("/api/generar-evaluacion", evaluation_body())
        .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Evaluación iniciada para procesamiento en background"
    );
    assert_eq!(body["estimatedTime"], "2-5 minutos");

    let job_id = body["jobID"].as_str().unwrap();
    assert!(job_id.starts_with("eval_"));
    assert_eq!(
        body["statusEndpoint"],
        format!("/api/evaluacion-status?id={}", job_id)
    );
}

#[tokio::test]
async fn submitted_job_completes_and_can_be_polled() {
    let app = TestApp::with_provider(MockTextProvider::with_response(
        "# Evaluación\n1. ¿Qué es la fotosíntesis?",
    ));

    let (_, body) = app
        .post_json("/api/generar-evaluacion", evaluation_body())
        .await;
    let job_id = body["jobID"].as_str().unwrap().to_string();

    let record = app.wait_for_status(&job_id, JobStatus::Completed).await;
    assert_eq!(record.user_id, TEST_USER);
    assert_eq!(record.module_name, "GenerarEvaluacion");
    assert!(record.started_at.is_some());
    assert!(record.completed_at.is_some());

    let (status, body) = app
        .get_json(&format!("/api/evaluacion-status?id={}", job_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobID"], job_id.as_str());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"], "# Evaluación\n1. ¿Qué es la fotosíntesis?");
    assert!(body["error"].is_null());
    assert_eq!(body["metadata"]["tipo"], "evaluacion");
    assert_eq!(body["metadata"]["titulo"], "Evaluación de ciencias");
    assert!(body["metadata"]["processing_time"].as_i64().unwrap() >= 0);

    let prompt = &app.provider.prompts()[0];
    assert!(prompt.contains("OA 1: Explicar la fotosíntesis"));
    assert!(prompt.contains("60 minutos"));
}

#[tokio::test]
async fn missing_api_key_marks_job_as_error() {
    let app = TestApp::with_provider(MockTextProvider::new(false));

    let (status, body) = app
        .post_json("/api/generar-evaluacion", evaluation_body())
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobID"].as_str().unwrap().to_string();

    app.wait_for_status(&job_id, JobStatus::Error).await;

    let (_, body) = app
        .get_json(&format!("/api/evaluacion-status?id={}", job_id))
        .await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "API key not configured");
    assert!(body["result"].is_null());
}

#[tokio::test]
async fn submit_requires_objectives() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/api/generar-evaluacion",
            json!({"titulo": "Prueba", "contenido": "Células"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("objetivos is required"));
    assert!(app
        .history
        .list_for_user(TEST_USER, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn disabled_worker_pool_still_accepts_and_records_error() {
    let mut config = PedagogyConfig::for_tests();
    config.worker.enabled = false;
    let app = TestApp::build(config, MockTextProvider::new(true), fake_exporter());

    let (status, body) = app
        .post_json("/api/generar-evaluacion", evaluation_body())
        .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobID"].as_str().unwrap();

    let record = app.history.find_by_job_id(job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(
        record.error_message.as_deref(),
        Some("Worker pool is not running")
    );
    assert!(app.provider.prompts().is_empty());
}

#[tokio::test]
async fn status_requires_id() {
    let app = TestApp::spawn();

    let (status, body) = app.get_json("/api/evaluacion-status").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "id is required");
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let app = TestApp::spawn();

    let (status, _) = app
        .get_json("/api/evaluacion-status?id=eval_0_missing")
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn background_run_processes_pending_job_inline() {
    let mut config = PedagogyConfig::for_tests();
    config.worker.enabled = false;
    let app = TestApp::build(
        config,
        MockTextProvider::with_response("Evaluación lista"),
        fake_exporter(),
    );

    app.history
        .insert(NewWorkRecord::pending(
            "eval_1_inline",
            TEST_USER,
            "GenerarEvaluacion",
            evaluation_body(),
        ))
        .await
        .unwrap();

    let mut body = evaluation_body();
    body["jobID"] = json!("eval_1_inline");
    let (status, body) = app
        .post_json("/api/generar-evaluacion-background", body)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobID"], "eval_1_inline");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"], "Evaluación lista");
}

#[tokio::test]
async fn background_run_creates_missing_job_row() {
    let app = TestApp::with_provider(MockTextProvider::with_response("Evaluación lista"));

    let mut body = evaluation_body();
    body["jobID"] = json!("eval_2_new");
    let (status, _) = app
        .post_json("/api/generar-evaluacion-background", body)
        .await;
    assert_eq!(status, StatusCode::OK);

    let record = app
        .history
        .find_by_job_id("eval_2_new")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.user_id, TEST_USER);
    assert_eq!(record.result_text(), Some("Evaluación lista"));
}

#[tokio::test]
async fn background_run_refuses_finished_job() {
    let app = TestApp::spawn();

    let mut body = evaluation_body();
    body["jobID"] = json!("eval_3_done");
    let (first, _) = app
        .post_json("/api/generar-evaluacion-background", body.clone())
        .await;
    let (second, _) = app
        .post_json("/api/generar-evaluacion-background", body)
        .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(app.provider.prompts().len(), 1);
}

#[tokio::test]
async fn background_run_requires_job_id() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json("/api/generar-evaluacion-background", evaluation_body())
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("jobID is required"));
}
