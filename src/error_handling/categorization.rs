//! Error categorization and retry strategy.
//!
//! Maps API outcomes onto `ErrorType` and decides which of them are transient.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::stats::ProcessingStats;
use super::types::{ErrorType, TransportError};
use crate::config::{
    HTTP_STATUS_BAD_GATEWAY, HTTP_STATUS_BAD_REQUEST, HTTP_STATUS_INTERNAL_SERVER_ERROR,
    HTTP_STATUS_SERVICE_UNAVAILABLE, HTTP_STATUS_TOO_MANY_REQUESTS, RETRYABLE_STATUS_CODES,
    RETRY_BACKOFF_BASE, RETRY_BACKOFF_FACTOR_MS, RETRY_MAX_ATTEMPTS,
};

/// Creates the back-off schedule between attempts.
///
/// Yields one delay per retry: 4s before the second attempt and 8s before the
/// third. The iterator is exhausted after `RETRY_MAX_ATTEMPTS - 1` items, which
/// is what bounds the number of attempts.
pub fn get_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(RETRY_BACKOFF_BASE)
        .factor(RETRY_BACKOFF_FACTOR_MS)
        .take(RETRY_MAX_ATTEMPTS.saturating_sub(1) as usize)
}

/// Whether an HTTP status from the API is worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Whether a transport failure is worth retrying.
///
/// Timeouts and connection failures (refused, reset, or closed before a
/// response) are transient. A malformed request or unreadable body would
/// fail the same way again.
pub fn is_retryable_transport(error: &TransportError) -> bool {
    matches!(
        error,
        TransportError::Timeout(_) | TransportError::Connect(_)
    )
}

/// Categorizes a non-success HTTP status into an `ErrorType`.
pub fn categorize_status(status: u16) -> ErrorType {
    match status {
        HTTP_STATUS_BAD_REQUEST => ErrorType::HttpRequestBadRequest,
        HTTP_STATUS_TOO_MANY_REQUESTS => ErrorType::HttpRequestTooManyRequests,
        HTTP_STATUS_INTERNAL_SERVER_ERROR => ErrorType::HttpRequestInternalServerError,
        HTTP_STATUS_BAD_GATEWAY => ErrorType::HttpRequestBadGateway,
        HTTP_STATUS_SERVICE_UNAVAILABLE => ErrorType::HttpRequestServiceUnavailable,
        400..=499 => ErrorType::HttpRequestOtherClientError,
        500..=599 => ErrorType::HttpRequestOtherServerError,
        _ => ErrorType::HttpRequestOtherStatus,
    }
}

/// Categorizes a transport failure into an `ErrorType`.
pub fn categorize_transport_error(error: &TransportError) -> ErrorType {
    match error {
        TransportError::Timeout(_) => ErrorType::HttpRequestTimeoutError,
        TransportError::Connect(_) => ErrorType::HttpRequestConnectError,
        TransportError::Other(_) => ErrorType::HttpRequestOtherError,
    }
}

/// Records a final (non-retried) failure in the processing statistics.
pub fn update_error_stats(stats: &ProcessingStats, error_type: ErrorType) {
    stats.increment_error(error_type);
}
