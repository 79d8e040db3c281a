use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{tool} exited with {status}: {stderr}")]
    Tool {
        tool: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Builds a `Tool` error from a finished command's captured output.
    pub fn from_output(tool: &str, output: &std::process::Output) -> Self {
        AppError::Tool {
            tool: tool.to_string(),
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
