use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmartCustomError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for SmartCustomError {
    fn from(err: anyhow::Error) -> Self {
        SmartCustomError::Other(format!("{:#}", err))
    }
}

impl From<String> for SmartCustomError {
    fn from(msg: String) -> Self {
        SmartCustomError::Other(msg)
    }
}

impl From<&str> for SmartCustomError {
    fn from(msg: &str) -> Self {
        SmartCustomError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SmartCustomError>;
