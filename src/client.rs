use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const PIPEFY_API_URL: &str = "https://api.pipefy.com/graphql";
pub const MAX_ATTEMPTS: u32 = 3;
pub const INITIAL_BACKOFF_MS: u64 = 500;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Client abstraction (for testability)
// ---------------------------------------------------------------------------

/// A GraphQL endpoint. Returns the full response envelope (`data` and/or `errors`).
pub trait GraphqlClient {
    fn execute(&self, query: &str, variables: serde_json::Value) -> Result<serde_json::Value>;
}

/// Bounded exponential retry policy for transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_backoff_ms: INITIAL_BACKOFF_MS,
        }
    }
}

/// Pipefy GraphQL over HTTPS, authenticated with a bearer token.
pub struct HttpGraphqlClient {
    agent: ureq::Agent,
    url: String,
    token: String,
    retry: RetryPolicy,
}

impl HttpGraphqlClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            url: url.into(),
            token: token.into(),
            retry,
        }
    }

    fn post_once(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        match self
            .agent
            .post(&self.url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", "application/json")
            .send_json(body)
        {
            Ok(response) => response.into_json().map_err(|e| {
                Error::MalformedResponse(format!("response body is not valid JSON: {e}"))
            }),
            Err(ureq::Error::Status(code, response)) => Err(status_error(code, response)),
            Err(ureq::Error::Transport(t)) => {
                Err(Error::Transport(format!("request to {} failed: {t}", self.url)))
            }
        }
    }
}

impl GraphqlClient for HttpGraphqlClient {
    fn execute(&self, query: &str, variables: serde_json::Value) -> Result<serde_json::Value> {
        if self.token.trim().is_empty() {
            return Err(Error::Authentication("API token is empty".to_string()));
        }

        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        debug!(url = %self.url, "posting GraphQL request");
        retry_with_backoff_ms(
            || self.post_once(&body),
            self.retry.initial_backoff_ms,
            self.retry.max_attempts,
        )
    }
}

/// Map a non-2xx HTTP status to the error taxonomy.
///
/// 401/403 are authentication failures. 429 and 5xx are transient. Anything
/// else carrying a GraphQL `errors` array is a remote query error.
fn status_error(code: u16, response: ureq::Response) -> Error {
    match code {
        401 | 403 => Error::Authentication(format!("service rejected the token (HTTP {code})")),
        429 => Error::Transport("rate limited (HTTP 429)".to_string()),
        c if c >= 500 => Error::Transport(format!("server error (HTTP {c})")),
        c => {
            let body = response.into_string().unwrap_or_default();
            match serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("errors").and_then(|e| e.as_array()).cloned())
            {
                Some(errors) if !errors.is_empty() => Error::RemoteQuery(errors),
                _ => Error::Transport(format!("unexpected HTTP status {c}")),
            }
        }
    }
}

/// Extract `data` from a response envelope.
///
/// A non-empty `errors` array wins even when `data` is also present.
pub fn envelope_data(envelope: serde_json::Value) -> Result<serde_json::Value> {
    let serde_json::Value::Object(mut map) = envelope else {
        return Err(Error::MalformedResponse(
            "response envelope is not a JSON object".to_string(),
        ));
    };

    match map.remove("errors") {
        Some(serde_json::Value::Array(errors)) if !errors.is_empty() => {
            return Err(Error::RemoteQuery(errors));
        }
        Some(serde_json::Value::Array(_)) | Some(serde_json::Value::Null) | None => {}
        Some(other) => return Err(Error::RemoteQuery(vec![other])),
    }

    match map.remove("data") {
        Some(serde_json::Value::Null) | None => Err(Error::MalformedResponse(
            "response has no data".to_string(),
        )),
        Some(data) => Ok(data),
    }
}

// ---------------------------------------------------------------------------
// Retry with exponential backoff
// ---------------------------------------------------------------------------

/// Run `f` up to `max_attempts` times, sleeping between transient failures.
/// Non-transient errors are returned immediately.
pub fn retry_with_backoff_ms<F, T>(f: F, initial_backoff_ms: u64, max_attempts: u32) -> Result<T>
where
    F: Fn() -> Result<T>,
{
    let mut backoff_ms = initial_backoff_ms;
    let mut attempt = 1;

    loop {
        match f() {
            Ok(val) => return Ok(val),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    attempt,
                    error = %e,
                    backoff_ms,
                    "retrying Pipefy API after transient error"
                );
                thread::sleep(Duration::from_millis(backoff_ms));
                backoff_ms = backoff_ms.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
