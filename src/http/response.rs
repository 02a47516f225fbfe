//! Upstream response handling.
//!
//! # Responsibilities
//! - Hand the upstream response back to the client
//! - Strip hop-by-hop headers
//! - Map upstream transport errors to 502 Bad Gateway
//!
//! # Design Decisions
//! - Response bodies stream through without buffering
//! - Error bodies use the same JSON envelope as gate rejections

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};

use crate::gate::error::error_response;

/// Remove connection-scoped headers.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Turn an upstream response into the client response.
pub fn from_upstream(response: hyper::Response<hyper::body::Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Response for a failed upstream exchange.
pub fn bad_gateway() -> Response {
    error_response(StatusCode::BAD_GATEWAY, "Upstream request failed", "#")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "close".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn test_bad_gateway_status() {
        assert_eq!(bad_gateway().status(), StatusCode::BAD_GATEWAY);
    }
}
