//! Configuration constants.
//!
//! Fixed operational parameters for the PageSpeed Insights scanner: the API
//! endpoint, the per-request timeout, the retry schedule and the redirect hop
//! limit used for shortlink resolution.

use std::time::Duration;

/// Google PageSpeed Insights v5 endpoint.
pub const API_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Lighthouse categories requested from the API, in report order.
pub const CATEGORIES: &[&str] = &["performance", "accessibility", "best-practices", "seo"];

/// Placeholder value shipped in sample `.env` files.
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

/// Placeholder base URL shipped in sample `.env` files.
pub const BASE_URL_PLACEHOLDER: &str = "https://example.com";

// Concurrency and rate limiting
/// Default number of worker tasks.
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Upper bound accepted by `Config::validate`.
pub const MAX_CONCURRENCY: usize = 100;
/// Default aggregate request rate (requests per second).
/// PageSpeed Insights allows 400 queries per 100 seconds per key.
pub const DEFAULT_RATE_LIMIT_RPS: f64 = 4.0;

// Request timeout
/// Per-request timeout for the PageSpeed Insights API.
/// Lighthouse runs on Google's side routinely take 20-60s, so this is generous.
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for a single hop while resolving a shortlink.
pub const REDIRECT_HOP_TIMEOUT: Duration = Duration::from_secs(10);

// Retry strategy
/// Maximum number of attempts per job (initial attempt + 2 retries).
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
/// Exponential base for the back-off schedule (4s, 8s).
pub const RETRY_BACKOFF_BASE: u64 = 2;
/// Multiplier in milliseconds applied to each power of the base.
pub const RETRY_BACKOFF_FACTOR_MS: u64 = 2000;
/// HTTP status codes that are retried. 400 is included because the API returns it
/// for transient Lighthouse failures ("Lighthouse returned error: FAILED_DOCUMENT_REQUEST").
pub const RETRYABLE_STATUS_CODES: &[u16] = &[400, 429, 500, 502, 503];

// Redirect handling
/// Maximum number of redirect hops followed when resolving a shortlink.
pub const MAX_REDIRECT_HOPS: usize = 5;

/// Known URL-shortener hostnames whose targets are resolved before scanning.
pub const DEFAULT_SHORTLINK_DOMAINS: &[&str] = &[
    "bit.ly",
    "buff.ly",
    "cutt.ly",
    "goo.gl",
    "is.gd",
    "ow.ly",
    "rebrand.ly",
    "t.co",
    "tinyurl.com",
];

// Extraction limits
/// Opportunities kept per result (ranked by estimated savings).
pub const MAX_OPPORTUNITIES: usize = 10;
/// Diagnostics kept per result (payload order).
pub const MAX_DIAGNOSTICS: usize = 5;
/// Lighthouse considers an audit passed at or above this score.
pub const AUDIT_PASS_THRESHOLD: f64 = 0.9;

// Error message limits
/// Maximum length of a raw API error body carried into a failure message.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

// Progress logging
/// Interval between progress log lines while a scan is running, in seconds.
pub const LOGGING_INTERVAL: u64 = 5;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_BAD_REQUEST: u16 = 400;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const HTTP_STATUS_INTERNAL_SERVER_ERROR: u16 = 500;
pub const HTTP_STATUS_BAD_GATEWAY: u16 = 502;
pub const HTTP_STATUS_SERVICE_UNAVAILABLE: u16 = 503;
