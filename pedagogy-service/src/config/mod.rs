use service_core::config::{self as core_config, get_env, parse_env};
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Gemini model used for every generation module.
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct PedagogyConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    /// `None` selects the in-memory work history (never allowed in prod).
    pub database: Option<DatabaseConfig>,
    pub genai: GenaiConfig,
    pub worker: WorkerConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl std::str::FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GENAI_PROVIDER '{}': expected gemini or mock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenaiConfig {
    pub provider: ProviderKind,
    /// Missing keys are tolerated at startup; generation then fails with 500.
    pub api_key: Option<String>,
    pub text_model: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl GenaiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub worker_count: usize,
    pub queue_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_count: 4,
            queue_size: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub pandoc_bin: String,
    pub pdf_bin: String,
    pub timeout_secs: u64,
    pub temp_dir: PathBuf,
    pub institution_name: String,
}

impl ExportConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pandoc_bin: "pandoc".to_string(),
            pdf_bin: "wkhtmltopdf".to_string(),
            timeout_secs: 60,
            temp_dir: env::temp_dir(),
            institution_name: "Colegio Madre Paulina".to_string(),
        }
    }
}

impl PedagogyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();

        let database = match env::var("DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1),
            }),
            Err(_) if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required in production but not set"
                )))
            }
            Err(_) => None,
        };

        let export_defaults = ExportConfig::default();

        Ok(Self {
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "pedagogy-service".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database,
            genai: GenaiConfig {
                provider: get_env("GENAI_PROVIDER", Some("gemini"), false)?.parse()?,
                api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                text_model: get_env("GENAI_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL), false)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), false)?,
                request_timeout_secs: parse_env("GENAI_REQUEST_TIMEOUT_SECS", 120),
            },
            worker: WorkerConfig {
                enabled: parse_env("WORKER_ENABLED", true),
                worker_count: parse_env("WORKER_COUNT", 4usize).max(1),
                queue_size: parse_env("WORKER_QUEUE_SIZE", 100usize).max(1),
            },
            export: ExportConfig {
                pandoc_bin: get_env("EXPORT_PANDOC_BIN", Some("pandoc"), false)?,
                pdf_bin: get_env("EXPORT_PDF_BIN", Some("wkhtmltopdf"), false)?,
                timeout_secs: parse_env("EXPORT_TIMEOUT_SECS", export_defaults.timeout_secs),
                temp_dir: env::var("EXPORT_TEMP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(export_defaults.temp_dir),
                institution_name: env::var("EXPORT_INSTITUTION_NAME")
                    .unwrap_or(export_defaults.institution_name),
            },
            common,
        })
    }

    /// Configuration for tests and local runs: mock provider, in-memory
    /// history, random port.
    pub fn for_tests() -> Self {
        Self {
            common: core_config::Config {
                port: 0,
                environment: "test".to_string(),
            },
            service_name: "pedagogy-service-test".to_string(),
            log_level: "debug".to_string(),
            otlp_endpoint: None,
            database: None,
            genai: GenaiConfig {
                provider: ProviderKind::Mock,
                api_key: Some("test-api-key".to_string()),
                text_model: DEFAULT_TEXT_MODEL.to_string(),
                api_base: DEFAULT_GEMINI_API_BASE.to_string(),
                request_timeout_secs: 5,
            },
            worker: WorkerConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("mock".parse::<ProviderKind>().unwrap(), ProviderKind::Mock);
        assert!("openai".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_config_uses_mock_and_memory_store() {
        let config = PedagogyConfig::for_tests();
        assert_eq!(config.genai.provider, ProviderKind::Mock);
        assert!(config.database.is_none());
        assert_eq!(config.common.port, 0);
    }
}
