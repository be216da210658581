use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use url::Url;

use super::types::{EventFilter, EventId, EventPage, ObjectResponse};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    #[error("RPC server returned HTTP {0}")]
    Http(u16),

    #[error("RPC error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// Whether the error is transient enough to be worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport(_) => true,
            RpcError::Http(status) => *status == 429 || *status >= 500,
            RpcError::Server { message, .. } => is_retryable_message(message),
            RpcError::InvalidUrl(_) | RpcError::InvalidResponse(_) => false,
        }
    }
}

/// Check if an error message indicates a transient failure.
fn is_retryable_message(msg: &str) -> bool {
    let msg_lower = msg.to_lowercase();
    msg_lower.contains("timeout")
        || msg_lower.contains("timed out")
        || msg_lower.contains("connection")
        || msg_lower.contains("reset")
        || msg_lower.contains("broken pipe")
        || msg_lower.contains("rate limit")
        || msg_lower.contains("too many requests")
        || msg_lower.contains("overloaded")
        || msg_lower.contains("temporarily unavailable")
        || msg_lower.contains("try again")
}

/// Retry policy for individual RPC calls. This bounds in-call retries only;
/// errors that outlive it surface to the ingestion loop, which has its own
/// recovery interval.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-based), growing exponentially
    /// and capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let delay_ms = (self.initial_delay.as_millis() as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}

/// Run `operation`, retrying transient failures according to `config`.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RpcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RpcError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    operation_name,
                    attempt,
                    config.max_retries,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempt > 0 {
                    tracing::error!("{} failed after {} retries: {}", operation_name, attempt, e);
                }
                return Err(e);
            }
        }
    }
}

/// Configuration for [`SuiClient`].
#[derive(Debug, Clone)]
pub struct SuiClientConfig {
    pub url: Url,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
}

impl SuiClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// JSON-RPC 2.0 client for a Sui fullnode.
///
/// Wraps the two calls the indexer needs, `suix_queryEvents` and
/// `sui_getObject`, with typed responses and bounded retries.
pub struct SuiClient {
    config: SuiClientConfig,
    http: reqwest::Client,
    next_request_id: AtomicU64,
}

impl SuiClient {
    pub fn new(config: SuiClientConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            http,
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Build a client for `url` with default retry settings.
    pub fn from_url(url: &str) -> Result<Self, RpcError> {
        let url = Url::parse(url).map_err(|e| RpcError::InvalidUrl(format!("{}: {}", url, e)))?;
        Self::new(SuiClientConfig::new(url))
    }

    /// Fetch one page of events matching `filter`, strictly after `cursor`,
    /// oldest first.
    pub async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        limit: Option<usize>,
    ) -> Result<EventPage, RpcError> {
        let operation = format!("suix_queryEvents({})", filter);
        // Fourth element is descending_order; the loop always reads forward.
        let params = json!([filter, cursor, limit, false]);
        with_retry(&self.config.retry, &operation, || {
            self.request("suix_queryEvents", &params)
        })
        .await
    }

    /// Fetch the current Move fields of `object_id`, or `None` when the
    /// object does not exist or carries no Move content.
    pub async fn object_fields(
        &self,
        object_id: &str,
    ) -> Result<Option<Map<String, Value>>, RpcError> {
        let operation = format!("sui_getObject({})", object_id);
        let params = json!([object_id, {"showContent": true}]);
        let response: ObjectResponse = with_retry(&self.config.retry, &operation, || {
            self.request("sui_getObject", &params)
        })
        .await?;

        if let Some(error) = &response.error {
            tracing::debug!("Object {} lookup returned {}", object_id, error);
        }
        Ok(response
            .data
            .and_then(|data| data.content)
            .filter(|content| content.data_type == "moveObject")
            .map(|content| content.fields))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Value,
    ) -> Result<T, RpcError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.config.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http(status.as_u16()));
        }

        let envelope: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Server {
                code: error.code,
                message: error.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{} returned neither result nor error", method)))
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_delay_for_attempt_backs_off_exponentially() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_delay_for_attempt_caps_at_max_delay() {
        let config = RetryConfig::default().with_initial_delay(Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(5));
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(RpcError::Transport("connection closed before message completed".to_string())
            .is_retryable());
        assert!(RpcError::Http(503).is_retryable());
        assert!(RpcError::Http(429).is_retryable());
        assert!(RpcError::Server {
            code: -32000,
            message: "Request timed out".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_permanent_errors_are_not_retryable() {
        assert!(!RpcError::Http(400).is_retryable());
        assert!(!RpcError::InvalidResponse("truncated body".to_string()).is_retryable());
        assert!(!RpcError::Server {
            code: -32602,
            message: "Invalid params".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_envelope_with_result_only_decodes() {
        let envelope: JsonRpcResponse<EventPage> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"data": [], "nextCursor": null, "hasNextPage": false}
        }))
        .unwrap();

        assert!(envelope.error.is_none());
        assert!(!envelope.result.unwrap().has_next_page);
    }

    #[test]
    fn test_envelope_with_error_only_decodes() {
        let envelope: JsonRpcResponse<EventPage> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": -32602, "message": "Invalid params"}
        }))
        .unwrap();

        assert!(envelope.result.is_none());
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Invalid params");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_recovers_from_transient_errors() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::default(), "op", || {
            let n = attempts.fetch_add(1, Ordering::Relaxed);
            async move {
                if n < 2 {
                    Err(RpcError::Transport("connection reset".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_on_permanent_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&RetryConfig::default(), "op", || {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { Err(RpcError::InvalidResponse("missing result".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(RpcError::InvalidResponse(_))));
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_exhausts_its_budget() {
        let config = RetryConfig::default().with_max_retries(2);
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&config, "op", || {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { Err(RpcError::Transport("timeout".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(RpcError::Transport(_))));
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }
}
