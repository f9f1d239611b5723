//! Generation on top of a text provider.

use crate::services::metrics::{
    GENERATIONS_TOTAL, PROVIDER_ERRORS_TOTAL, PROVIDER_LATENCY, TOKENS_TOTAL,
};
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

/// The pedagogy tools, as recorded in the work history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedagogyModule {
    BloomAnalysis,
    BalanceAnalysis,
    ElevateDok3,
    Rubric,
    Questions,
    Evaluation,
}

impl PedagogyModule {
    /// Name stored in `module_name` when the client does not send one.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BloomAnalysis => "AnalizarReactivo",
            Self::BalanceAnalysis => "AnalizarPrueba",
            Self::ElevateDok3 => "ElevarDOK3",
            Self::Rubric => "GenerarRubrica",
            Self::Questions => "PreguntasOA",
            Self::Evaluation => crate::models::work_history::EVALUATION_MODULE,
        }
    }

    /// Text returned when the model answers without any text.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            Self::BloomAnalysis => "No se pudo generar análisis",
            Self::BalanceAnalysis => "No se pudo generar análisis de balance",
            Self::ElevateDok3 => "No se pudo elevar el objetivo",
            Self::Rubric => "No se pudo generar rúbrica",
            Self::Questions => "No se pudo generar preguntas",
            Self::Evaluation => "No se pudo generar evaluación",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            ProviderError::RateLimited => AppError::TooManyRequests(
                "Generation rate limit exceeded, try again later".to_string(),
                None,
            ),
            ProviderError::ContentFiltered => {
                AppError::bad_request("Content was blocked by the provider's safety filters")
            }
            ProviderError::ApiError(msg) | ProviderError::InvalidRequest(msg) => {
                AppError::BadGateway(msg)
            }
            ProviderError::NetworkError(msg) => {
                AppError::InternalError(anyhow::anyhow!("Network error: {}", msg))
            }
        }
    }
}

fn error_type(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::NotConfigured(_) => "not_configured",
        ProviderError::ApiError(_) => "api_error",
        ProviderError::InvalidRequest(_) => "invalid_request",
        ProviderError::RateLimited => "rate_limited",
        ProviderError::ContentFiltered => "content_filtered",
        ProviderError::NetworkError(_) => "network_error",
    }
}

/// Runs prompts through the provider with the shared sampling settings.
#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl GenerationService {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            params: GenerationParams::pedagogy_defaults(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    /// Generate text for `module`, substituting the module's fallback text
    /// when the model returns none.
    #[instrument(skip(self, prompt), fields(module = module.name(), model = %self.provider.model(), prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        module: PedagogyModule,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let timer = PROVIDER_LATENCY
            .with_label_values(&[module.name()])
            .start_timer();

        let result = self.provider.generate(prompt, &self.params).await;
        timer.observe_duration();

        match result {
            Ok(response) => {
                GENERATIONS_TOTAL
                    .with_label_values(&[module.name(), "ok"])
                    .inc();
                TOKENS_TOTAL
                    .with_label_values(&["input"])
                    .inc_by(response.input_tokens.max(0) as f64);
                TOKENS_TOTAL
                    .with_label_values(&["output"])
                    .inc_by(response.output_tokens.max(0) as f64);

                tracing::info!(
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    finish_reason = response.finish_reason.as_str(),
                    "Generation completed"
                );

                Ok(response
                    .text
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| module.fallback_text().to_string()))
            }
            Err(e) => {
                GENERATIONS_TOTAL
                    .with_label_values(&[module.name(), "error"])
                    .inc();
                PROVIDER_ERRORS_TOTAL
                    .with_label_values(&[error_type(&e)])
                    .inc();
                tracing::error!(error = %e, "Generation failed");
                Err(e)
            }
        }
    }
}
