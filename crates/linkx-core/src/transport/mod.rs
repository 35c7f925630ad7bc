//! Pluggable HTTP transport used to fetch the share page and the resolved binary.
//!
//! The extraction core only depends on the [`Transport`] trait. Plain closures
//! with the right signature implement it, which keeps test stubs one-liners;
//! [`CurlTransport`] is the default used when the caller passes none.

mod libcurl;
mod parse;

pub use libcurl::CurlTransport;
pub use parse::parse_header_lines;

use std::collections::HashMap;

/// Charset name that asks the transport to hand back decoded text.
pub const UTF8: &str = "utf-8";

/// One HTTP request as the core describes it.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    /// Request method; `GET` for everything the core issues.
    pub method: String,
    /// Extra request headers. Implementations may add defaults (e.g. User-Agent).
    pub headers: HashMap<String, String>,
    /// Ask the server for a compressed response and transparently decode it.
    pub accept_encoding: bool,
    /// `Some(charset)` asks for a decoded text body, `None` for raw bytes.
    pub response_encoding: Option<String>,
}

impl TransportRequest {
    /// GET request for a page whose body should come back as text.
    pub fn page(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            accept_encoding: true,
            response_encoding: Some(UTF8.to_string()),
        }
    }

    /// GET request for a binary whose body should come back untouched.
    pub fn binary(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            accept_encoding: false,
            response_encoding: None,
        }
    }
}

/// Response body, decoded or raw depending on `TransportRequest::response_encoding`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    Bytes(Vec<u8>),
}

impl ResponseBody {
    /// Name used in "invalid body type" diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Text(_) => "text",
            ResponseBody::Bytes(_) => "bytes",
        }
    }
}

/// Status, headers and body of a completed request.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status_code: u32,
    /// Header names are lowercase; repeated headers are joined with `", "`.
    pub headers: HashMap<String, String>,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Failure to obtain any response at all. HTTP error statuses are not
/// transport errors; they come back as a normal [`TransportResponse`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("unsupported response encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("{0}")]
    Other(String),
}

/// Anything that can perform a [`TransportRequest`].
///
/// Implementations block the current thread; call from `spawn_blocking` if
/// used from async code.
pub trait Transport {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError>,
{
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_implements_transport() {
        let stub = |req: &TransportRequest| -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse {
                status_code: 200,
                headers: HashMap::new(),
                body: ResponseBody::Text(format!("echo {}", req.url)),
            })
        };
        let resp = stub.request(&TransportRequest::page("https://host/x")).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, ResponseBody::Text("echo https://host/x".to_string()));
    }

    #[test]
    fn page_request_asks_for_text() {
        let req = TransportRequest::page("https://host/v/1/file.html");
        assert_eq!(req.method, "GET");
        assert!(req.accept_encoding);
        assert_eq!(req.response_encoding.as_deref(), Some(UTF8));
    }

    #[test]
    fn binary_request_asks_for_bytes() {
        let req = TransportRequest::binary("https://host/f/1/x/avatar.png");
        assert!(req.response_encoding.is_none());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        let resp = TransportResponse {
            status_code: 200,
            headers,
            body: ResponseBody::Bytes(Vec::new()),
        };
        assert_eq!(resp.header("Content-Type"), Some("text/html"));
        assert_eq!(resp.body.kind(), "bytes");
    }
}
