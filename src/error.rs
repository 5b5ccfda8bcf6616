use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {after:?} waiting on {url}")]
    Timeout { url: String, after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a failed fetch, reported alongside the error line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Timeout,
    Connect,
    Status,
    Decode,
    Other,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Timeout { .. } => FailureKind::Timeout,
            Error::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Error::Http(e) if e.is_connect() => FailureKind::Connect,
            Error::Http(e) if e.is_status() => FailureKind::Status,
            Error::Http(e) if e.is_decode() || e.is_body() => FailureKind::Decode,
            _ => FailureKind::Other,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::Status => "status",
            FailureKind::Decode => "decode",
            FailureKind::Other => "other",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_errors_classify_as_timeout() {
        let err = Error::Timeout {
            url: "http://example.invalid".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert!(err.to_string().contains("example.invalid"));
    }

    #[test]
    fn config_errors_are_other() {
        assert_eq!(Error::Config("bad".into()).kind(), FailureKind::Other);
    }
}
