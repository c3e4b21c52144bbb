//! URL validation and sanitization.
//!
//! Every input URL passes through here before any API quota is spent on it:
//! - Only `http`/`https` URLs with a hostname are accepted
//! - Fragments are stripped (the API ignores them)
//! - Unsafe and non-ASCII characters in path and query are percent-encoded
//! - Known shortlink hosts are resolved to their final destination

mod redirects;

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::config::MAX_REDIRECT_HOPS;
use crate::error_handling::UrlRejection;

pub use redirects::resolve_redirect_chain;

/// A URL accepted by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    /// Sanitized URL to scan
    pub url: String,
    /// Original shortlink, when the URL was obtained by resolving one
    pub resolved_from: Option<String>,
}

/// Parses and sanitizes a URL without any network access.
///
/// # Errors
///
/// Returns a `UrlRejection` for unparseable URLs, non-http(s) schemes and
/// URLs without a hostname.
pub fn sanitize_url(raw: &str) -> Result<Url, UrlRejection> {
    let mut parsed =
        Url::parse(raw.trim()).map_err(|e| UrlRejection::Unparseable(format!("{raw}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlRejection::UnsupportedScheme(scheme.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlRejection::MissingHost),
    }

    // Url::parse already percent-encodes path and query; only the fragment remains
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Validates URLs and resolves shortlinks.
pub struct UrlValidator {
    client: Arc<reqwest::Client>,
    shortlink_domains: HashSet<String>,
    max_hops: usize,
}

impl UrlValidator {
    /// Creates a validator.
    ///
    /// `client` must have redirects disabled (see `init_redirect_client`).
    pub fn new<I, S>(client: Arc<reqwest::Client>, shortlink_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            client,
            shortlink_domains: shortlink_domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            max_hops: MAX_REDIRECT_HOPS,
        }
    }

    /// Overrides the redirect hop limit.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Whether the URL's host is a known shortener (or a subdomain of one).
    pub fn is_shortlink(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.shortlink_domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }

    /// Validates one URL.
    ///
    /// Network access happens only for shortlink hosts.
    ///
    /// # Errors
    ///
    /// Returns a `UrlRejection` when the URL (or its resolved destination) is
    /// unusable or the shortlink cannot be resolved.
    pub async fn validate(&self, raw: &str) -> Result<ValidatedUrl, UrlRejection> {
        let parsed = sanitize_url(raw)?;

        if !self.is_shortlink(&parsed) {
            return Ok(ValidatedUrl {
                url: parsed.to_string(),
                resolved_from: None,
            });
        }

        let original = parsed.to_string();
        let destination = resolve_redirect_chain(parsed, self.max_hops, &self.client).await?;
        let destination = sanitize_url(destination.as_str())?;
        log::info!("Resolved shortlink {} -> {}", original, destination);

        Ok(ValidatedUrl {
            url: destination.to_string(),
            resolved_from: Some(original),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn client() -> Arc<reqwest::Client> {
        Arc::new(
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_sanitize_strips_fragment() {
        let url = sanitize_url("https://example.com/a#frag").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_sanitize_rejects_ftp() {
        assert_eq!(
            sanitize_url("ftp://example.com/file"),
            Err(UrlRejection::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_sanitize_rejects_garbage_and_missing_host() {
        assert!(matches!(
            sanitize_url("not a url at all"),
            Err(UrlRejection::Unparseable(_))
        ));
        assert!(matches!(
            sanitize_url("https://"),
            Err(UrlRejection::Unparseable(_)) | Err(UrlRejection::MissingHost)
        ));
    }

    #[test]
    fn test_sanitize_percent_encodes_unsafe_characters() {
        let url = sanitize_url("https://example.com/caf\u{e9} menu?q=a b").unwrap();
        assert_eq!(url.as_str(), "https://example.com/caf%C3%A9%20menu?q=a%20b");
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        let url = sanitize_url("  https://example.com/x \n").unwrap();
        assert_eq!(url.as_str(), "https://example.com/x");
    }

    #[tokio::test]
    async fn test_is_shortlink_matches_domain_and_subdomains() {
        let validator = UrlValidator::new(client(), ["bit.ly", "T.CO"]);
        let check = |s: &str| validator.is_shortlink(&Url::parse(s).unwrap());
        assert!(check("https://bit.ly/abc"));
        assert!(check("https://www.bit.ly/abc"));
        assert!(check("https://t.co/xyz"));
        assert!(!check("https://notbit.ly/abc"));
        assert!(!check("https://example.com/bit.ly"));
    }

    #[tokio::test]
    async fn test_validate_regular_url_is_local() {
        let validator = UrlValidator::new(client(), ["bit.ly"]);
        let validated = validator
            .validate("https://example.com/a#frag")
            .await
            .unwrap();
        assert_eq!(validated.url, "https://example.com/a");
        assert_eq!(validated.resolved_from, None);
    }

    // The shortlink domain below is "127.0.0.1", so bind the mock server to
    // IPv4 loopback explicitly (the default may pick [::1]).
    fn ipv4_server() -> Server {
        httptest::ServerBuilder::new()
            .bind_addr(([127, 0, 0, 1], 0).into())
            .run()
            .unwrap()
    }

    #[tokio::test]
    async fn test_validate_replaces_shortlink_with_destination() {
        let server = ipv4_server();
        server.expect(
            Expectation::matching(request::method_path("GET", "/go"))
                .respond_with(status_code(301).insert_header("Location", "/article")),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/article"))
                .respond_with(status_code(200).body("ok")),
        );

        let validator = UrlValidator::new(client(), ["127.0.0.1"]);
        let validated = validator
            .validate(&format!("{}#x", server.url_str("/go")))
            .await
            .unwrap();
        assert_eq!(validated.url, server.url_str("/article"));
        assert_eq!(validated.resolved_from, Some(server.url_str("/go")));
    }

    #[tokio::test]
    async fn test_validate_shortlink_loop_is_rejection() {
        let server = ipv4_server();
        server.expect(
            Expectation::matching(request::method_path("GET", "/loop"))
                .respond_with(status_code(301).insert_header("Location", "/loop")),
        );

        let validator = UrlValidator::new(client(), ["127.0.0.1"]);
        let result = validator.validate(&server.url_str("/loop")).await;
        assert!(matches!(result, Err(UrlRejection::RedirectLoop(_))));
    }
}
