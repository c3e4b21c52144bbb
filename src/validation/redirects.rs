//! Shortlink redirect resolution.
//!
//! Follows a redirect chain hop by hop (the client has redirects disabled) so
//! loops and overly long chains are rejected instead of looping forever.

use std::collections::HashSet;

use reqwest::header::LOCATION;
use url::Url;

use crate::error_handling::UrlRejection;

/// Resolves the final destination of `start`, following at most `max_hops` redirects.
///
/// # Arguments
///
/// * `start` - The shortlink URL
/// * `max_hops` - Maximum number of redirects to follow
/// * `client` - HTTP client with redirects disabled (for manual tracking)
///
/// # Errors
///
/// - `UrlRejection::RedirectLoop` if a URL repeats within the chain
/// - `UrlRejection::TooManyRedirects` if the chain is longer than `max_hops`
/// - `UrlRejection::ShortlinkResolution` on request failure or a bad `Location`
pub async fn resolve_redirect_chain(
    start: Url,
    max_hops: usize,
    client: &reqwest::Client,
) -> Result<Url, UrlRejection> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());
    let mut current = start;

    for _ in 0..=max_hops {
        let resp = client
            .get(current.as_str())
            .send()
            .await
            .map_err(|e| UrlRejection::ShortlinkResolution(e.to_string()))?;

        let status = resp.status();
        if !status.is_redirection() {
            return Ok(current);
        }

        let Some(location) = resp.headers().get(LOCATION) else {
            log::warn!(
                "Redirect status {} for {} but no Location header",
                status.as_u16(),
                current
            );
            return Ok(current);
        };
        let location = location
            .to_str()
            .map_err(|e| UrlRejection::ShortlinkResolution(format!("bad Location header: {e}")))?;
        // Location may be relative to the current hop
        let next = current
            .join(location)
            .map_err(|e| UrlRejection::ShortlinkResolution(format!("bad Location '{location}': {e}")))?;

        if !visited.insert(next.to_string()) {
            return Err(UrlRejection::RedirectLoop(next.to_string()));
        }
        log::debug!("Shortlink hop {} -> {}", current, next);
        current = next;
    }

    Err(UrlRejection::TooManyRedirects(max_hops))
}
