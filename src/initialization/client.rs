//! HTTP client initialization.
//!
//! Two clients are used: one for the PageSpeed Insights API and one with
//! redirects disabled for walking shortlink redirect chains hop by hop.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::{API_REQUEST_TIMEOUT, REDIRECT_HOP_TIMEOUT};

fn user_agent() -> String {
    format!("pagespeed_scan/{}", env!("CARGO_PKG_VERSION"))
}

/// Initializes the API client.
///
/// The 120s timeout covers the whole request, including the Lighthouse run on
/// Google's side.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client() -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(API_REQUEST_TIMEOUT)
        .user_agent(user_agent())
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes a client for shortlink resolution.
///
/// Redirects are disabled so every hop can be inspected for loops and counted
/// against the hop limit.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_redirect_client() -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(REDIRECT_HOP_TIMEOUT)
        .user_agent(user_agent())
        .build()?;
    Ok(Arc::new(client))
}
