use super::ExportError;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Runs an external converter with a hard timeout.
///
/// Converters write their result to a file, so only stderr is captured. The
/// child is killed if the timeout fires.
#[derive(Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn execute(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<(), ExportError> {
        let mut converter = Command::new(program);
        converter
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let finished = tokio::time::timeout(self.timeout, converter.output())
            .await
            .map_err(|_| {
                tracing::warn!(program = %program, "Converter timed out");
                ExportError::Timeout(self.timeout.as_secs())
            })?
            .map_err(|e| ExportError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&finished.stderr).trim().to_string();
            tracing::error!(
                program = %program,
                exit_code = ?finished.status.code(),
                stderr = %stderr,
                "Converter failed"
            );
            return Err(ExportError::Failed(stderr));
        }

        tracing::debug!(
            program = %program,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Converter finished"
        );

        Ok(())
    }
}
