//! Error type definitions.
//!
//! This module defines all error and info types used throughout the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Structurally invalid scan input. These are the only errors that abort a scan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("No URLs to scan")]
    NoUrls,

    #[error("No strategies selected")]
    NoStrategies,

    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("Rate limit must be a positive number of requests per second (got {0})")]
    InvalidRate(f64),

    #[error("All {0} input URL(s) were rejected by validation; nothing to scan")]
    NoJobs(usize),
}

/// Reasons the URL validator refuses an input before any API quota is spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("unparseable URL: {0}")]
    Unparseable(String),

    #[error("unsupported scheme '{0}' (only http and https are scanned)")]
    UnsupportedScheme(String),

    #[error("URL has no hostname")]
    MissingHost,

    #[error("shortlink redirect loop at {0}")]
    RedirectLoop(String),

    #[error("shortlink did not resolve within {0} redirect hops")]
    TooManyRedirects(usize),

    #[error("shortlink resolution failed: {0}")]
    ShortlinkResolution(String),
}

/// Transport-level failure of a single API request (no HTTP response received).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<ReqwestError> for TransportError {
    fn from(err: ReqwestError) -> Self {
        // is_request() covers a connection the server closed or reset before
        // answering; only builder, body and decode errors remain `Other`
        if err.is_timeout() {
            TransportError::Timeout(crate::config::API_REQUEST_TIMEOUT.as_secs())
        } else if err.is_connect() || err.is_request() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Types of errors that can end a job as a failure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // HTTP status errors returned by the API
    HttpRequestBadRequest,          // 400 Bad Request
    HttpRequestTooManyRequests,     // 429 Too Many Requests
    HttpRequestInternalServerError, // 500 Internal Server Error
    HttpRequestBadGateway,          // 502 Bad Gateway
    HttpRequestServiceUnavailable,  // 503 Service Unavailable
    HttpRequestOtherClientError,    // Other 4xx (permanent)
    HttpRequestOtherServerError,    // Other 5xx
    HttpRequestOtherStatus,
    // Transport errors
    HttpRequestTimeoutError,
    HttpRequestConnectError,
    HttpRequestOtherError,
    // Worker faults
    InternalFault,
}

/// Informational events worth counting but not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    RetryAttempt,      // A job was retried after a transient failure
    DegradedPayload,   // A 2xx response body could not be parsed
    ShortlinkResolved, // A shortlink was replaced by its destination
    UrlSkipped,        // An input URL was rejected by validation
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpRequestBadRequest => "Bad Request (400)",
            ErrorType::HttpRequestTooManyRequests => "Too many requests (429)",
            ErrorType::HttpRequestInternalServerError => "Internal Server Error (500)",
            ErrorType::HttpRequestBadGateway => "Bad Gateway (502)",
            ErrorType::HttpRequestServiceUnavailable => "Service Unavailable (503)",
            ErrorType::HttpRequestOtherClientError => "Other client error (4xx)",
            ErrorType::HttpRequestOtherServerError => "Other server error (5xx)",
            ErrorType::HttpRequestOtherStatus => "Unexpected HTTP status",
            ErrorType::HttpRequestTimeoutError => "HTTP request timeout error",
            ErrorType::HttpRequestConnectError => "HTTP request connect error",
            ErrorType::HttpRequestOtherError => "HTTP request other error",
            ErrorType::InternalFault => "Internal worker fault",
        }
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::RetryAttempt => "Retry attempts",
            InfoType::DegradedPayload => "Unparseable API payloads",
            InfoType::ShortlinkResolved => "Shortlinks resolved",
            InfoType::UrlSkipped => "Input URLs skipped",
        }
    }
}
