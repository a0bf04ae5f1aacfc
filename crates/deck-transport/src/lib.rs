//! Retrying HTTP transport shared by every remote adapter that talks to an
//! actual API. Bounded exponential backoff distinguishing transient
//! failures (rate limiting, 5xx) from permanent ones (4xx) — the only
//! retry policy any adapter in this workspace needs.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use thiserror::Error;

/// Hard cap on attempts for one logical request, including the first try.
pub const MAX_ATTEMPTS: u32 = 10;
const INITIAL_WAIT: Duration = Duration::from_secs(1);
const MAX_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Whether an HTTP status should be retried (rate-limited or server error)
/// rather than surfaced immediately.
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Doubles `wait`, capped at `MAX_WAIT`. Exposed standalone so the backoff
/// schedule can be asserted on without driving a real HTTP call.
pub fn next_wait(wait: Duration) -> Duration {
    (wait * 2).min(MAX_WAIT)
}

pub struct Transport {
    client: Client,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Sends a JSON request, retrying transient failures with exponential
    /// backoff (1s, 2s, 4s, ... capped at 30s) up to `MAX_ATTEMPTS` times.
    /// Permanent (4xx, excluding 429) failures and decode errors are
    /// returned immediately without a retry.
    pub async fn request_json(
        &self,
        method: Method,
        url: &str,
        bearer_token: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, TransportError> {
        let mut wait = INITIAL_WAIT;
        for attempt in 1..=MAX_ATTEMPTS {
            let mut request = self.client.request(method.clone(), url);
            if let Some(token) = bearer_token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json()
                            .await
                            .map_err(|e| TransportError::Decode(e.to_string()));
                    }
                    let text = response.text().await.unwrap_or_default();
                    if is_transient(status) && attempt < MAX_ATTEMPTS {
                        tracing::warn!(
                            target: "deck_transport",
                            status = status.as_u16(),
                            attempt,
                            "transient failure, retrying"
                        );
                        tokio::time::sleep(wait).await;
                        wait = next_wait(wait);
                        continue;
                    }
                    return Err(TransportError::Status {
                        status: status.as_u16(),
                        body: text,
                    });
                }
                Err(error) => {
                    let retryable = error.is_timeout() || error.is_connect();
                    if retryable && attempt < MAX_ATTEMPTS {
                        tracing::warn!(
                            target: "deck_transport",
                            attempt,
                            error = %error,
                            "network error, retrying"
                        );
                        tokio::time::sleep(wait).await;
                        wait = next_wait(wait);
                        continue;
                    }
                    return Err(TransportError::Network(error.to_string()));
                }
            }
        }
        unreachable!("loop always returns within MAX_ATTEMPTS iterations")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn permanent_statuses() {
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
        assert!(!is_transient(StatusCode::NOT_FOUND));
    }

    #[test]
    fn backoff_doubles_and_caps_at_thirty_seconds() {
        let mut wait = INITIAL_WAIT;
        let mut seen = vec![wait];
        for _ in 0..6 {
            wait = next_wait(wait);
            seen.push(wait);
        }
        assert_eq!(
            seen,
            vec![1, 2, 4, 8, 16, 30, 30].into_iter().map(Duration::from_secs).collect::<Vec<_>>()
        );
    }
}
