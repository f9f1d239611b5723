//! HTML to DOCX/PDF converters.

use super::executor::CommandExecutor;
use super::{ExportError, ExportFormat};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Convert a complete HTML document into the target format.
    async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError>;
}

/// Scratch files for one conversion, removed on drop.
struct Scratch {
    input: PathBuf,
    output: PathBuf,
}

impl Scratch {
    fn new(temp_dir: &Path, extension: &str) -> Self {
        let stem = format!("pedagogy-export-{}", Uuid::new_v4());
        Self {
            input: temp_dir.join(format!("{}.html", stem)),
            output: temp_dir.join(format!("{}.{}", stem, extension)),
        }
    }

    fn input(&self) -> Result<&str, ExportError> {
        path_str(&self.input)
    }

    fn output(&self) -> Result<&str, ExportError> {
        path_str(&self.output)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                // The converter may have failed before writing its output.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Failed to remove export scratch file")
                }
            }
        }
    }
}

fn path_str(path: &Path) -> Result<&str, ExportError> {
    path.to_str()
        .ok_or_else(|| ExportError::Failed(format!("Non UTF-8 temp path: {}", path.display())))
}

/// Converts through a program that reads an HTML file and writes the output file.
async fn convert(
    executor: &CommandExecutor,
    program: &str,
    temp_dir: &Path,
    format: ExportFormat,
    html: &str,
    args: impl FnOnce(&str, &str) -> Vec<String>,
) -> Result<Vec<u8>, ExportError> {
    let scratch = Scratch::new(temp_dir, format.extension());
    tokio::fs::write(&scratch.input, html).await?;

    let args = args(scratch.input()?, scratch.output()?);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    executor.execute(program, &args, temp_dir).await?;

    let bytes = tokio::fs::read(&scratch.output).await?;
    if bytes.is_empty() {
        return Err(ExportError::Failed(format!(
            "{} produced an empty {} file",
            program,
            format.as_str()
        )));
    }
    Ok(bytes)
}

/// DOCX through `pandoc`.
pub struct PandocDocxRenderer {
    program: String,
    executor: CommandExecutor,
    temp_dir: PathBuf,
}

impl PandocDocxRenderer {
    pub fn new(program: impl Into<String>, executor: CommandExecutor, temp_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            executor,
            temp_dir,
        }
    }
}

#[async_trait]
impl DocumentRenderer for PandocDocxRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        convert(
            &self.executor,
            &self.program,
            &self.temp_dir,
            ExportFormat::Docx,
            html,
            |input, output| {
                vec![
                    "--from=html".to_string(),
                    "--to=docx".to_string(),
                    "--output".to_string(),
                    output.to_string(),
                    input.to_string(),
                ]
            },
        )
        .await
    }
}

/// PDF through `wkhtmltopdf`.
pub struct WkhtmltopdfRenderer {
    program: String,
    executor: CommandExecutor,
    temp_dir: PathBuf,
}

impl WkhtmltopdfRenderer {
    pub fn new(program: impl Into<String>, executor: CommandExecutor, temp_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            executor,
            temp_dir,
        }
    }
}

#[async_trait]
impl DocumentRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        convert(
            &self.executor,
            &self.program,
            &self.temp_dir,
            ExportFormat::Pdf,
            html,
            |input, output| {
                [
                    "--quiet",
                    "--encoding",
                    "utf-8",
                    "--page-size",
                    "A4",
                    "--footer-center",
                    "[page]",
                    input,
                    output,
                ]
                .map(str::to_string)
                .to_vec()
            },
        )
        .await
    }
}
