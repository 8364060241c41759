//! Shared HTTP client and status mapping.

use std::sync::OnceLock;

use crate::error::GenUiError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> GenUiError {
    match status {
        401 | 403 => GenUiError::Authentication(error_message(body)),
        429 => GenUiError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => GenUiError::api(status, error_message(body)),
    }
}

/// Prefer `error.message` / `error` / `message` from a JSON body over the raw text.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let message = match value.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(err) => err.get("message").and_then(|m| m.as_str()).map(str::to_string),
        None => value.get("message").and_then(|m| m.as_str()).map(str::to_string),
    };
    message.unwrap_or_else(|| body.to_string())
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
