//! The read-only request view the response pipeline negotiates against.
//!
//! The host server decodes the request line and headers; this crate only
//! reads the method and a handful of headers back out.

use super::{Headers, Method};

/// An inbound request: method, target and headers.
///
/// Only the method and the `Accept-Encoding`, `Range`, `If-Range`,
/// `If-None-Match` and `If-Modified-Since` headers influence a response.
///
/// # Examples
///
/// ```
/// use outflow::http::{Method, Request};
///
/// let request = Request::new(Method::Head, "/report.csv")
///     .header("Accept-Encoding", "gzip")
///     .header("Range", "bytes=0-9");
/// assert_eq!(request.method(), &Method::Head);
/// assert_eq!(request.headers().get("range"), Some("bytes=0-9"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
}

impl Request {
    /// Creates a request with no headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
        }
    }

    /// Appends a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path, used in log fields.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_headers() {
        let req = Request::new(Method::Get, "/")
            .header("Range", "bytes=0-1")
            .header("If-None-Match", "\"v1\"");
        assert_eq!(req.headers().len(), 2);
        assert_eq!(req.headers().get("if-none-match"), Some("\"v1\""));
        assert_eq!(req.path(), "/");
    }

    #[test]
    fn method_from_decoded_string() {
        let method: Method = "HEAD".parse().unwrap_or_else(|never| match never {});
        let req = Request::new(method, "/").header("Accept-Encoding", "gzip");
        assert!(!req.method().has_response_body());
        assert_eq!(req.headers().get("ACCEPT-ENCODING"), Some("gzip"));
    }
}
