//! Request ID middleware.
//!
//! Reuses the `x-request-id` set by an upstream proxy (Cloudflare, Fly) or
//! creates a UUID v4, then records it on the request span, tags the Sentry
//! scope with it, and echoes it back in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that gives every request an ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id(&request);

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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_upstream_request_id_is_kept() {
        let request = Request::builder()
            .header(REQUEST_ID_HEADER, "cf-ray-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&request), "cf-ray-123");
    }

    #[test]
    fn test_missing_request_id_is_generated() {
        let request = Request::builder().body(Body::empty()).unwrap();
        let id = request_id(&request);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
