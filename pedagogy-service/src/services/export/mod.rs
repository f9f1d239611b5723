//! Document export.
//!
//! Generated HTML is wrapped in the institution's page template and handed to
//! an external converter. Layout is entirely up to the converter.

mod executor;
mod renderer;

pub use executor::CommandExecutor;
pub use renderer::{DocumentRenderer, PandocDocxRenderer, WkhtmltopdfRenderer};

use crate::config::ExportConfig;
use crate::services::metrics::EXPORTS_TOTAL;
use chrono::{Local, NaiveDate};
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion timed out after {0} seconds")]
    Timeout(u64),

    #[error("Conversion failed: {0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::InternalError(anyhow::anyhow!(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    pub fn default_filename(&self) -> &'static str {
        match self {
            Self::Docx => "documento.docx",
            Self::Pdf => "documento.pdf",
        }
    }
}

/// A converted document ready to send.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap body HTML in the branded page: institution header, title, and a
/// footer dated `dd-mm-yyyy`.
pub fn wrap_document(institution: &str, title: &str, body_html: &str, date: NaiveDate) -> String {
    let institution = escape_html(institution);
    let title = escape_html(title);
    let date = date.format("%d-%m-%Y");

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8">
<title>{title} - {institution}</title>
<style>
body {{ font-family: Arial, sans-serif; line-height: 1.6; margin: 20px; }}
.header {{ text-align: center; margin-bottom: 30px; border-bottom: 2px solid #6B73FF; padding-bottom: 20px; }}
.school-name {{ color: #6B73FF; font-size: 24px; font-weight: bold; margin-bottom: 5px; }}
.document-title {{ color: #333; font-size: 18px; margin-top: 10px; }}
.content {{ margin: 20px 0; }}
.footer {{ margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd; font-size: 12px; color: #666; text-align: center; }}
</style>
</head>
<body>
<div class="header">
<h1 class="school-name">{institution}</h1>
<div class="document-title">{title}</div>
</div>
<div class="content">
{body_html}
</div>
<div class="footer">
<p>Generado con IA - Plataforma Docente {institution}</p>
<p>Fecha: {date}</p>
</div>
</body>
</html>
"#
    )
}

/// Holds one renderer per format.
#[derive(Clone)]
pub struct Exporter {
    institution_name: String,
    docx: Arc<dyn DocumentRenderer>,
    pdf: Arc<dyn DocumentRenderer>,
}

impl Exporter {
    pub fn from_config(config: &ExportConfig) -> Self {
        let executor = CommandExecutor::new(config.command_timeout());
        Self {
            institution_name: config.institution_name.clone(),
            docx: Arc::new(PandocDocxRenderer::new(
                config.pandoc_bin.clone(),
                executor.clone(),
                config.temp_dir.clone(),
            )),
            pdf: Arc::new(WkhtmltopdfRenderer::new(
                config.pdf_bin.clone(),
                executor,
                config.temp_dir.clone(),
            )),
        }
    }

    pub fn with_renderers(
        institution_name: impl Into<String>,
        docx: Arc<dyn DocumentRenderer>,
        pdf: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            institution_name: institution_name.into(),
            docx,
            pdf,
        }
    }

    #[tracing::instrument(skip(self, html_content), fields(format = format.as_str(), html_len = html_content.len()))]
    pub async fn export(
        &self,
        format: ExportFormat,
        html_content: &str,
        title: &str,
        filename: Option<&str>,
    ) -> Result<ExportedFile, ExportError> {
        let renderer = match format {
            ExportFormat::Docx => &self.docx,
            ExportFormat::Pdf => &self.pdf,
        };

        let page = wrap_document(
            &self.institution_name,
            title,
            html_content,
            Local::now().date_naive(),
        );

        let result = renderer.render(&page).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        EXPORTS_TOTAL
            .with_label_values(&[format.as_str(), status])
            .inc();

        let bytes = result?;
        let filename = match filename.filter(|f| !f.is_empty()) {
            Some(name) => sanitize_filename(name),
            None => format.default_filename().to_string(),
        };

        tracing::info!(filename = %filename, size = bytes.len(), "Document exported");

        Ok(ExportedFile {
            filename,
            content_type: format.content_type(),
            bytes,
        })
    }
}
