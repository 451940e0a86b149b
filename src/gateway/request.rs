//! Inbound request as seen by the engine.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use url::form_urlencoded;

pub const X_REQUEST_ID: &str = "x-request-id";

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    /// Path exactly as received (still percent-encoded).
    pub path: String,
    /// Raw query string without the leading `?`.
    pub raw_query: Option<String>,
    /// Decoded query pairs in arrival order.
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let raw_query = uri.query().map(str::to_string);
        let query = raw_query
            .as_deref()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            path: uri.path().to_string(),
            raw_query,
            query,
            headers,
            body,
        }
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Header value as text; non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_query_and_keeps_raw_form() {
        let uri: Uri = "/inventory/events?type=customers&id=00001&q=a%20b&id=2".parse().unwrap();
        let request = GatewayRequest::new(Method::POST, &uri, HeaderMap::new(), Bytes::new());

        assert_eq!(request.path, "/inventory/events");
        assert_eq!(request.raw_query.as_deref(), Some("type=customers&id=00001&q=a%20b&id=2"));
        assert_eq!(request.query_param("id"), Some("00001"));
        assert_eq!(request.query_param("q"), Some("a b"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());
        headers.insert("x-api-key", "k".parse().unwrap());
        let uri: Uri = "/".parse().unwrap();
        let request = GatewayRequest::new(Method::GET, &uri, headers, Bytes::new());

        assert_eq!(request.header("X-Api-Key"), Some("k"));
        assert_eq!(request.request_id(), Some("abc"));
    }
}
