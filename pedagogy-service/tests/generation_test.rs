//! Synchronous generation endpoints.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{TestApp, TEST_USER};
use pedagogy_service::models::JobStatus;
use pedagogy_service::services::history::WorkHistoryStore;
use pedagogy_service::services::providers::mock::MockTextProvider;
use serde_json::json;

#[tokio::test]
async fn bloom_analysis_returns_generated_text() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/api/analisis-bloom",
            json!({"content": "¿Cuál es la capital de Chile?"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let analysis = body["analysis"].as_str().unwrap();
    assert!(analysis.starts_with("Mock response for: "));
    assert!(analysis.contains("¿Cuál es la capital de Chile?"));
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn bloom_analysis_requires_content() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json("/api/analisis-bloom", json!({"type": "question"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("content is required"));
    assert!(app.provider.prompts().is_empty());
}

#[tokio::test]
async fn empty_body_is_treated_as_empty_object() {
    let app = TestApp::spawn();

    let (status, body) = app.post_raw("/api/elevar-dok3", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("objetivo_simple is required"));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = TestApp::spawn();

    let (status, body) = app.post_raw("/api/analisis-bloom", "{content: ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn balance_analysis_counts_dok_mentions() {
    let app = TestApp::with_provider(MockTextProvider::with_response(
        "Pregunta 1: DOK 1. Pregunta 2: DOK 2. Pregunta 3: DOK 2. Falta nivel 4.",
    ));

    let (status, body) = app
        .post_json(
            "/api/analisis-balance",
            json!({"examContent": "1. Defina célula\n2. Compare\n3. Explique"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "examen");
    assert_eq!(
        body["statistics"],
        json!({"dok1": 1, "dok2": 2, "dok3": 0, "dok4": 1, "total": 4})
    );
}

#[tokio::test]
async fn elevate_to_dok3_returns_objective() {
    let app = TestApp::with_provider(MockTextProvider::with_response(
        "Evaluar críticamente el impacto de la fotosíntesis en el ecosistema local.",
    ));

    let (status, body) = app
        .post_json(
            "/api/elevar-dok3",
            json!({"objetivo_simple": "Identificar la fotosíntesis", "contexto": "8° básico"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["objetivo_dok3"],
        "Evaluar críticamente el impacto de la fotosíntesis en el ecosistema local."
    );

    let prompt = &app.provider.prompts()[0];
    assert!(prompt.contains("Identificar la fotosíntesis"));
    assert!(prompt.contains("8° básico"));
}

#[tokio::test]
async fn rubric_defaults_to_four_levels() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/api/generar-rubrica",
            json!({
                "criterio": "Argumentación",
                "descripción": "Defiende una postura con evidencia",
                "objetivos": ["OA 7"],
                "asignatura": "Lenguaje"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parameters"]["niveles"], 4);
    assert_eq!(body["parameters"]["criterio"], "Argumentación");
    assert_eq!(body["parameters"]["objetivos"], json!(["OA 7"]));
    assert_eq!(body["parameters"]["asignatura"], "Lenguaje");
    assert_eq!(body["parameters"]["competencia"], "");
    assert!(body["rubric"].as_str().unwrap().contains("Argumentación"));
}

#[tokio::test]
async fn rubric_rejects_out_of_range_levels() {
    let app = TestApp::spawn();

    let (status, _) = app
        .post_json(
            "/api/generar-rubrica",
            json!({"criterio": "Argumentación", "niveles": 0}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn questions_are_parsed_from_model_json() {
    let app = TestApp::with_provider(MockTextProvider::with_response(
        r#"```json
[
  {"pregunta": "¿Qué es una fracción?", "nivel_dok": 1},
  {"pregunta": "Compare 1/2 y 2/4", "nivel_dok": 2},
  {"pregunta": "Diseñe un problema", "nivel_dok": 3},
  {"pregunta": "Justifique su estrategia", "nivel_dok": 3}
]
```"#,
    ));

    let (status, body) = app
        .post_json(
            "/api/generar-preguntas",
            json!({
                "objetivoAprendizaje": "Comprender fracciones equivalentes",
                "asignatura": "Matemática",
                "nivelEducativo": "5° básico"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let preguntas = body["preguntas"].as_array().unwrap();
    assert_eq!(preguntas.len(), 4);
    assert_eq!(preguntas[0]["nivel_dok"], 1);
    assert_eq!(preguntas[3]["pregunta"], "Justifique su estrategia");

    let metadata = &body["metadata"];
    assert_eq!(metadata["objetivo"], "Comprender fracciones equivalentes");
    assert_eq!(metadata["nivelEducativo"], "5° básico");
    assert_eq!(metadata["dificultad"], "intermedio");
    assert_eq!(metadata["totalPreguntas"], 4);
}

#[tokio::test]
async fn unparseable_questions_fall_back_to_raw_text() {
    let app = TestApp::with_provider(MockTextProvider::with_response(
        "No pude generar el formato pedido.",
    ));

    let (status, body) = app
        .post_json(
            "/api/generar-preguntas",
            json!({"objetivoAprendizaje": "Leer comprensivamente"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["preguntas"],
        json!([{"pregunta": "No pude generar el formato pedido.", "nivel_dok": 2}])
    );
}

#[tokio::test]
async fn empty_model_reply_uses_fallback_text() {
    let app = TestApp::with_provider(MockTextProvider::empty());

    let (status, body) = app
        .post_json("/api/analisis-bloom", json!({"content": "Pregunta"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"], "No se pudo generar análisis");
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let app = TestApp::with_provider(MockTextProvider::new(false));

    let (status, body) = app
        .post_json("/api/analisis-bloom", json!({"content": "Pregunta"}))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Configuration error");
    assert_eq!(body["details"], "API key not configured");
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let app = TestApp::with_provider(MockTextProvider::failing("quota exhausted"));

    let (status, body) = app
        .post_json("/api/generar-rubrica", json!({"criterio": "Orden"}))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["details"], "quota exhausted");
}

#[tokio::test]
async fn successful_generation_is_recorded_in_history() {
    let app = TestApp::spawn();

    app.post_json("/api/analisis-bloom", json!({"content": "Pregunta"}))
        .await;
    app.post_json(
        "/api/generar-preguntas",
        json!({"objetivoAprendizaje": "OA 3", "module_name": "PreguntasPersonalizadas"}),
    )
    .await;

    let records = app.history.list_for_user(TEST_USER, 10).await.unwrap();
    assert_eq!(records.len(), 2);

    // Newest first.
    assert_eq!(records[0].module_name, "PreguntasPersonalizadas");
    assert_eq!(records[1].module_name, "AnalizarReactivo");
    assert!(records.iter().all(|r| r.status == JobStatus::Completed));
    assert_eq!(records[1].input_data["content"], "Pregunta");
    assert!(records[1]
        .result_text()
        .unwrap()
        .starts_with("Mock response for: "));
}

#[tokio::test]
async fn failed_generation_is_not_recorded() {
    let app = TestApp::with_provider(MockTextProvider::new(false));

    app.post_json("/api/analisis-bloom", json!({"content": "Pregunta"}))
        .await;

    assert!(app
        .history
        .list_for_user(TEST_USER, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = TestApp::spawn();

    let response = app
        .send(
            Request::builder()
                .uri("/api/analisis-bloom")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let (status, body) = common::read_json(response).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers() {
    let app = TestApp::spawn();

    let response = app
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/generar-rubrica")
                .header(header::ORIGIN, "https://app.example.cl")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,apikey")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("x-client-info"));
    assert!(allowed.contains("apikey"));
}

#[tokio::test]
async fn bare_options_request_is_ok() {
    let app = TestApp::spawn();

    let response = app
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/analisis-bloom")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}
