//! Error type shared by the story agent library

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("Prompt template '{name}' not found at {}", .path.display())]
    TemplateNotFound { name: String, path: PathBuf },
    #[error("OpenAI-compatible request failed: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),
    #[error("Ollama request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Model response contained no message content")]
    EmptyCompletion,
    #[error("Too many scene files to assign the next index ({0} found)")]
    SceneIndexOverflow(usize),
    #[error("{} does not contain a YAML mapping", .path.display())]
    NotAMapping { path: PathBuf },
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
