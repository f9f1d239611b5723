//! Application startup and lifecycle management.

use crate::config::{PedagogyConfig, ProviderKind};
use crate::handlers::{analysis, evaluation, export, health, history, objectives, rubric};
use crate::middleware::json_method_not_allowed;
use crate::services::export::Exporter;
use crate::services::generation::GenerationService;
use crate::services::history::{InMemoryWorkHistory, PgWorkHistory, WorkHistoryStore};
use crate::services::metrics::init_metrics;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::TextProvider;
use crate::workers::{EvaluationProcessor, EvaluationWorkerPool, JobQueue};
use axum::{
    body::Body,
    http::{header, HeaderName, Method, Request},
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{make_request_span, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: PedagogyConfig,
    pub generation: GenerationService,
    pub history: Arc<dyn WorkHistoryStore>,
    pub processor: EvaluationProcessor,
    /// `None` when the worker pool is disabled.
    pub jobs: Option<JobQueue>,
    pub exporter: Exporter,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the services together and start the evaluation worker pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: PedagogyConfig,
        provider: Arc<dyn TextProvider>,
        history: Arc<dyn WorkHistoryStore>,
        exporter: Exporter,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let generation = GenerationService::new(provider);
        let processor = EvaluationProcessor::new(generation.clone(), history.clone());

        let jobs = EvaluationWorkerPool::new(
            config.worker.clone(),
            processor.clone(),
            shutdown.clone(),
        )
        .map(|(pool, queue)| {
            pool.start();
            queue
        });

        Self {
            config,
            generation,
            history,
            processor,
            jobs,
            exporter,
            shutdown,
        }
    }
}

/// API routes with CORS, request ids and request tracing.
///
/// The CORS layer answers every `OPTIONS` request, preflight or not.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/analisis-bloom", post(analysis::analyze_bloom))
        .route("/analisis-balance", post(analysis::analyze_balance))
        .route("/elevar-dok3", post(objectives::elevate_to_dok3))
        .route("/generar-rubrica", post(rubric::generate_rubric))
        .route("/generar-preguntas", post(objectives::generate_questions))
        .route("/generar-evaluacion", post(evaluation::submit_evaluation))
        .route("/generar-evaluacion-background", post(evaluation::run_evaluation))
        .route("/evaluacion-status", get(evaluation::evaluation_status))
        .route("/export-docx", post(export::export_docx))
        .route("/export-pdf", post(export::export_pdf))
        .route("/history", get(history::list_history))
        .route("/models", get(history::list_models));

    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .nest("/api", api)
        .with_state(state)
        .layer(middleware::from_fn(json_method_not_allowed))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| make_request_span(request)),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::AUTHORIZATION,
                    HeaderName::from_static("x-client-info"),
                    HeaderName::from_static("apikey"),
                    header::CONTENT_TYPE,
                ])
                .max_age(Duration::from_secs(86400)),
        )
}

fn build_provider(config: &PedagogyConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    let provider: Arc<dyn TextProvider> = match config.genai.provider {
        ProviderKind::Gemini => {
            if config.genai.api_key.is_none() {
                tracing::warn!("GEMINI_API_KEY not set; generation requests will fail");
            }
            Arc::new(
                GeminiTextProvider::new(GeminiConfig::from(&config.genai))
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            )
        }
        ProviderKind::Mock => Arc::new(MockTextProvider::new(true)),
    };

    tracing::info!(model = %provider.model(), "Initialized text provider");
    Ok(provider)
}

async fn build_history(config: &PedagogyConfig) -> Result<Arc<dyn WorkHistoryStore>, AppError> {
    match &config.database {
        Some(database) => {
            let store = PgWorkHistory::connect(database).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                AppError::from(e)
            })?;
            store.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run database migrations");
                AppError::from(e)
            })?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory work history");
            Ok(Arc::new(InMemoryWorkHistory::new()))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    pub async fn build(config: PedagogyConfig) -> Result<Self, AppError> {
        init_metrics();

        let provider = build_provider(&config)?;
        let history = build_history(&config).await?;
        let exporter = Exporter::from_config(&config.export);

        // Port 0 picks a random port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let state = AppState::new(config, provider, history, exporter);

        tracing::info!(port = port, "Pedagogy service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Token that stops the HTTP server and the worker pool when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let shutdown = self.state.shutdown.clone();
        let app = router(self.state);

        tracing::info!(
            service = "pedagogy-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    }
}
