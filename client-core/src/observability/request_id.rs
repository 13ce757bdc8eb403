//! Request correlation for calls made to the file service.

use reqwest::header::HeaderMap;

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a fresh correlation ID.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Extract request ID from request or response headers.
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extension trait for tagging outgoing requests with a correlation ID.
pub trait RequestIdExt {
    fn with_request_id(self, request_id: &str) -> Self;
}

impl RequestIdExt for reqwest::RequestBuilder {
    fn with_request_id(self, request_id: &str) -> Self {
        self.header(REQUEST_ID_HEADER, request_id)
    }
}
