//! Chart rendering through an external script.
//!
//! The request JSON is written to the script's stdin; the script answers on
//! stdout with `{image, chartType, title}` or `{error}`. Anything on stderr
//! counts as a failure.

use async_trait::async_trait;
use folio_editor::{ChartError, ChartImage, ChartRenderer, ChartRequest};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "python";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptOutput {
    Failed { error: String },
    Image(ChartImage),
}

/// Runs `program script` once per request
#[derive(Debug, Clone)]
pub struct ProcessChartRenderer {
    program: String,
    script: PathBuf,
    timeout: Duration,
}

impl ProcessChartRenderer {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    async fn run(&self, input: Vec<u8>) -> Result<std::process::Output, ChartError> {
        if !self.script.exists() {
            return Err(ChartError::Spawn(format!(
                "visualization script not found: {}",
                self.script.display()
            )));
        }

        let mut child = Command::new(&self.program)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ChartError::Spawn(format!("{}: {}", self.program, err)))?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                // a script that exits without reading stdin is judged by its output
                let _ = stdin.write_all(&input).await;
                let _ = stdin.shutdown().await;
            });
        }

        tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ChartError::Renderer(format!("timed out after {:?}", self.timeout)))?
            .map_err(|err| ChartError::Spawn(err.to_string()))
    }
}

#[async_trait]
impl ChartRenderer for ProcessChartRenderer {
    async fn render(&self, request: &ChartRequest) -> Result<ChartImage, ChartError> {
        request.validate()?;
        let input = serde_json::to_vec(request).map_err(|err| ChartError::InvalidRequest(err.to_string()))?;

        debug!(
            program = %self.program,
            script = %self.script.display(),
            chart_type = request.chart_type.as_str(),
            "running chart script"
        );
        let output = self.run(input).await?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ChartError::Exit {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(ChartError::Diagnostics(stderr));
        }

        match serde_json::from_slice::<ScriptOutput>(&output.stdout) {
            Ok(ScriptOutput::Image(image)) => Ok(image),
            Ok(ScriptOutput::Failed { error }) => Err(ChartError::Renderer(error)),
            Err(err) => Err(ChartError::InvalidOutput(err.to_string())),
        }
    }
}
