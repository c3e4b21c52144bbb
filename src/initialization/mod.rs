//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - Logger
//! - HTTP clients (API and shortlink resolution)
//! - Token-bucket rate limiter

mod client;
mod logger;
mod rate_limiter;

// Re-export public API
pub use client::{init_client, init_redirect_client};
pub use logger::init_logger_with;
pub use rate_limiter::{init_rate_limiter, RateLimiter};
