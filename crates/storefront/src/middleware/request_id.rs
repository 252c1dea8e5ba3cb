//! Request ID middleware for request tracing and correlation.
//!
//! An inbound `x-request-id` from a proxy is reused when it looks sane;
//! otherwise a UUID v4 is minted. The id is recorded on the tracing span and
//! tagged on the Sentry scope, then echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request id accepted verbatim.
const MAX_INBOUND_LEN: usize = 128;

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(accept_inbound)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Accept an upstream id only if it is short and free of odd characters.
fn accept_inbound(value: &str) -> Option<&str> {
    let value = value.trim();
    let well_formed = !value.is_empty()
        && value.len() <= MAX_INBOUND_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    well_formed.then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_proxy_ids() {
        assert_eq!(accept_inbound("abc-123_x.y"), Some("abc-123_x.y"));
        assert_eq!(accept_inbound("  7f3e  "), Some("7f3e"));
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert_eq!(accept_inbound(""), None);
        assert_eq!(accept_inbound("has space"), None);
        assert_eq!(accept_inbound("<script>"), None);
        assert_eq!(accept_inbound(&"a".repeat(MAX_INBOUND_LEN + 1)), None);
    }
}
