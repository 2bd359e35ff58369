use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote query error: {}", remote_messages(.0))]
    RemoteQuery(Vec<serde_json::Value>),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl Error {
    /// Whether a retry could plausibly succeed. Only transport-level failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Join the `message` of each GraphQL error, falling back to the raw JSON.
fn remote_messages(errors: &[serde_json::Value]) -> String {
    if errors.is_empty() {
        return "empty error list".to_string();
    }
    errors
        .iter()
        .map(|e| match e.get("message").and_then(|m| m.as_str()) {
            Some(msg) => msg.to_string(),
            None => e.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
