use std::path::PathBuf;

/// Failures a task action can end in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task {0} not found")]
    NotFound(String),
    #[error("Request failed: {0}")]
    Network(String),
    #[error("{0}")]
    Validation(String),
    /// Another change to the same task has not come back yet.
    #[error("Task {0} is still being updated")]
    InFlight(String),
}

impl TaskError {
    pub fn title_required() -> Self {
        Self::Validation("Title is required".to_string())
    }
}

impl From<reqwest::Error> for TaskError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid port: {0}")]
    Port(String),
    #[error("Invalid bind address: {0}")]
    Address(String),
}
