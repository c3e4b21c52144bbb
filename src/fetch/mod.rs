//! API request execution with retry policy.
//!
//! The [`Fetcher`] runs one job against the API:
//! - Acquires a rate-limiter token before every attempt, retries included
//! - Retries transient failures (400/429/500/502/503, timeouts, connection
//!   failures) on a 4s then 8s back-off, for at most 3 attempts
//! - Classifies the final outcome as a [`FetchOutcome`]

mod response;
mod transport;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio_retry::RetryIf;

use crate::config::RETRY_MAX_ATTEMPTS;
use crate::error_handling::{
    categorize_status, categorize_transport_error, get_retry_strategy, is_retryable_status,
    is_retryable_transport, update_error_stats, ErrorType, InfoType, ProcessingStats,
    TransportError,
};
use crate::initialization::RateLimiter;
use crate::models::Job;

pub use response::{api_error_message, canonical_reason};
pub use transport::{ApiResponse, ReqwestTransport, Transport};

/// Final failure of a job after the retry policy gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub kind: ErrorType,
    /// HTTP status of the last response, if one was received
    pub http_status: Option<u16>,
    pub message: String,
    pub attempts_made: u32,
}

/// Result of fetching one job.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A 2xx response. `payload` is `Value::Null` when the body wasn't valid JSON.
    Success { payload: Value, attempts_made: u32 },
    Failure(FetchFailure),
}

impl FetchOutcome {
    pub fn attempts_made(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts_made, .. } => *attempts_made,
            FetchOutcome::Failure(failure) => failure.attempts_made,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Failure of a single attempt.
#[derive(Debug)]
enum AttemptError {
    Status(ApiResponse),
    Transport(TransportError),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Status(response) => is_retryable_status(response.status),
            AttemptError::Transport(error) => is_retryable_transport(error),
        }
    }

    fn into_failure(self, attempts_made: u32) -> FetchFailure {
        match self {
            AttemptError::Status(response) => {
                let reason = api_error_message(&response.body)
                    .unwrap_or_else(|| canonical_reason(response.status).to_string());
                FetchFailure {
                    kind: categorize_status(response.status),
                    http_status: Some(response.status),
                    message: format!("HTTP {}: {}", response.status, reason),
                    attempts_made,
                }
            }
            AttemptError::Transport(error) => FetchFailure {
                kind: categorize_transport_error(&error),
                http_status: None,
                message: error.to_string(),
                attempts_made,
            },
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Status(response) => write!(f, "HTTP {}", response.status),
            AttemptError::Transport(error) => write!(f, "{error}"),
        }
    }
}

/// Executes jobs against a [`Transport`] under the shared rate limit.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    stats: Arc<ProcessingStats>,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            transport,
            limiter,
            stats,
        }
    }

    /// Fetches one job, retrying transient failures.
    ///
    /// Never returns an error: every way the request can go wrong is a
    /// `FetchOutcome::Failure`.
    pub async fn fetch(&self, job: &Job) -> FetchOutcome {
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let result = RetryIf::spawn(
            get_retry_strategy(),
            move || async move {
                let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
                self.attempt(job, attempt).await
            },
            |error: &AttemptError| error.is_retryable(),
        )
        .await;

        let attempts_made = attempts.load(Ordering::SeqCst);

        match result {
            Ok(body) => {
                let payload = serde_json::from_str::<Value>(&body).unwrap_or_else(|e| {
                    log::warn!(
                        "Unparseable API response for {} ({}): {}",
                        job.url,
                        job.strategy,
                        e
                    );
                    self.stats.increment_info(InfoType::DegradedPayload);
                    Value::Null
                });
                FetchOutcome::Success {
                    payload,
                    attempts_made,
                }
            }
            Err(error) => {
                let failure = error.into_failure(attempts_made);
                log::warn!(
                    "Failed {} ({}) after {} attempt(s): {}",
                    job.url,
                    job.strategy,
                    attempts_made,
                    failure.message
                );
                update_error_stats(&self.stats, failure.kind);
                FetchOutcome::Failure(failure)
            }
        }
    }

    async fn attempt(&self, job: &Job, attempt: u32) -> Result<String, AttemptError> {
        if attempt > 1 {
            self.stats.increment_info(InfoType::RetryAttempt);
        }

        self.limiter.acquire().await;

        let result = match self.transport.get(&job.url, job.strategy).await {
            Ok(response) if response.is_success() => Ok(response.body),
            Ok(response) => Err(AttemptError::Status(response)),
            Err(error) => Err(AttemptError::Transport(error)),
        };

        if let Err(ref error) = result {
            if error.is_retryable() && attempt < RETRY_MAX_ATTEMPTS {
                log::warn!(
                    "Attempt {}/{} for {} ({}) failed: {}; retrying",
                    attempt,
                    RETRY_MAX_ATTEMPTS,
                    job.url,
                    job.strategy,
                    error
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::time::{Duration, Instant};

    /// Replays a fixed script of responses; the last entry repeats forever.
    struct ScriptedTransport {
        script: Vec<Result<ApiResponse, TransportError>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &str, _strategy: Strategy) -> Result<ApiResponse, TransportError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(Instant::now());
                calls.len() - 1
            };
            self.script[index.min(self.script.len() - 1)].clone()
        }
    }

    fn status(code: u16, body: &str) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse {
            status: code,
            body: body.to_string(),
        })
    }

    fn job() -> Job {
        Job {
            url: "https://a.test/".to_string(),
            strategy: Strategy::Mobile,
            sequence_index: 0,
        }
    }

    fn fetcher(transport: Arc<ScriptedTransport>) -> (Fetcher, Arc<ProcessingStats>) {
        let stats = Arc::new(ProcessingStats::new());
        let fetcher = Fetcher::new(
            transport,
            Arc::new(RateLimiter::new(100.0)),
            Arc::clone(&stats),
        );
        (fetcher, stats)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_twice_then_succeed() {
        let transport = ScriptedTransport::new(vec![
            status(503, ""),
            Err(TransportError::Timeout(120)),
            status(200, r#"{"lighthouseResult":{}}"#),
        ]);
        let (fetcher, stats) = fetcher(Arc::clone(&transport));

        let outcome = fetcher.fetch(&job()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts_made(), 3);
        let calls = transport.call_times();
        assert_eq!(calls.len(), 3);
        assert!(calls[1] - calls[0] >= Duration::from_secs(4));
        assert!(calls[2] - calls[1] >= Duration::from_secs(8));
        assert_eq!(stats.get_info_count(InfoType::RetryAttempt), 2);
        assert_eq!(stats.total_errors(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_429_exhausts_after_three_attempts() {
        let transport = ScriptedTransport::new(vec![status(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded"}}"#,
        )]);
        let (fetcher, stats) = fetcher(Arc::clone(&transport));

        let outcome = fetcher.fetch(&job()).await;

        assert_eq!(
            outcome,
            FetchOutcome::Failure(FetchFailure {
                kind: ErrorType::HttpRequestTooManyRequests,
                http_status: Some(429),
                message: "HTTP 429: Quota exceeded".to_string(),
                attempts_made: 3,
            })
        );
        assert_eq!(transport.call_times().len(), 3);
        assert_eq!(stats.get_error_count(ErrorType::HttpRequestTooManyRequests), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_client_error_not_retried() {
        let transport = ScriptedTransport::new(vec![status(404, "")]);
        let (fetcher, _stats) = fetcher(Arc::clone(&transport));

        match fetcher.fetch(&job()).await {
            FetchOutcome::Failure(failure) => {
                assert_eq!(failure.attempts_made, 1);
                assert_eq!(failure.http_status, Some(404));
                assert_eq!(failure.kind, ErrorType::HttpRequestOtherClientError);
                assert_eq!(failure.message, "HTTP 404: Not Found");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_keeps_transport_message() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Connect(
            "connection refused".to_string(),
        ))]);
        let (fetcher, _stats) = fetcher(Arc::clone(&transport));

        match fetcher.fetch(&job()).await {
            FetchOutcome::Failure(failure) => {
                assert_eq!(failure.attempts_made, 3);
                assert_eq!(failure.http_status, None);
                assert_eq!(failure.kind, ErrorType::HttpRequestConnectError);
                assert_eq!(failure.message, "connection failed: connection refused");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_connection_is_retried() {
        // Server reads each request and hangs up without a response
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/runPagespeed", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
            }
        });

        let stats = Arc::new(ProcessingStats::new());
        let transport = ReqwestTransport::new(Arc::new(reqwest::Client::new()), endpoint, "k");
        let fetcher = Fetcher::new(
            Arc::new(transport),
            Arc::new(RateLimiter::new(100.0)),
            Arc::clone(&stats),
        );

        match fetcher.fetch(&job()).await {
            FetchOutcome::Failure(failure) => {
                assert_eq!(failure.attempts_made, 3);
                assert_eq!(failure.http_status, None);
                assert_eq!(failure.kind, ErrorType::HttpRequestConnectError);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(accepted.load(AtomicOrdering::SeqCst) >= 3);
        assert_eq!(stats.get_info_count(InfoType::RetryAttempt), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_transport_error_not_retried() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::Other("bad request".to_string()))]);
        let (fetcher, _stats) = fetcher(Arc::clone(&transport));

        let outcome = fetcher.fetch(&job()).await;
        assert_eq!(outcome.attempts_made(), 1);
        assert!(!outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_success_body_is_degraded_success() {
        let transport = ScriptedTransport::new(vec![status(200, "<html>not json</html>")]);
        let (fetcher, stats) = fetcher(Arc::clone(&transport));

        let outcome = fetcher.fetch(&job()).await;
        assert_eq!(
            outcome,
            FetchOutcome::Success {
                payload: Value::Null,
                attempts_made: 1,
            }
        );
        assert_eq!(stats.get_info_count(InfoType::DegradedPayload), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_acquires_a_token() {
        // At 0.1 requests/second a token takes 10s, longer than the 4s back-off
        let transport = ScriptedTransport::new(vec![status(500, ""), status(200, "{}")]);
        let stats = Arc::new(ProcessingStats::new());
        let limiter = Arc::new(RateLimiter::new(0.1));
        limiter.acquire().await; // drain the initial token
        let fetcher = Fetcher::new(Arc::clone(&transport) as Arc<dyn Transport>, limiter, stats);

        let start = Instant::now();
        let outcome = fetcher.fetch(&job()).await;
        assert_eq!(outcome.attempts_made(), 2);

        let calls = transport.call_times();
        assert!(calls[0] - start >= Duration::from_millis(9_900));
        assert!(calls[1] - calls[0] >= Duration::from_millis(9_900));
    }
}
