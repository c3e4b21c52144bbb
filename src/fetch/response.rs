//! Failure message extraction from API error responses.

use serde_json::Value;

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Best-effort human-readable reason from an API error body.
///
/// The body is treated as opaque: a JSON `error.message` string wins, otherwise
/// the trimmed body text (truncated). Returns `None` for an empty body.
pub fn api_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    });

    Some(from_json.unwrap_or_else(|| truncate(trimmed, MAX_ERROR_MESSAGE_LENGTH)))
}

/// Canonical reason phrase for a status code, e.g. "Too Many Requests".
pub fn canonical_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown status")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_message_preferred() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for quota metric 'Queries'","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(body).as_deref(),
            Some("Quota exceeded for quota metric 'Queries'")
        );
    }

    #[test]
    fn test_plain_body_used_verbatim() {
        assert_eq!(
            api_error_message("  Service Unavailable\n").as_deref(),
            Some("Service Unavailable")
        );
    }

    #[test]
    fn test_json_without_message_falls_back_to_body() {
        let body = r#"{"error":{"code":500}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some(body));
    }

    #[test]
    fn test_empty_body_is_none() {
        assert_eq!(api_error_message(""), None);
        assert_eq!(api_error_message("   "), None);
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "x".repeat(MAX_ERROR_MESSAGE_LENGTH + 50);
        let message = api_error_message(&body).unwrap();
        assert_eq!(message.len(), MAX_ERROR_MESSAGE_LENGTH + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_canonical_reason() {
        assert_eq!(canonical_reason(429), "Too Many Requests");
        assert_eq!(canonical_reason(503), "Service Unavailable");
        assert_eq!(canonical_reason(599), "Unknown status");
    }
}
