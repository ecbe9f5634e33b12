//! HTTP primitives consumed and produced by the response pipeline.
//!
//! [`Method`] and [`Headers`] describe the inbound request, [`StatusCode`]
//! and [`Cookie`] the outbound response.

use std::fmt;

pub mod cookie;
pub mod headers;
pub mod request;

pub use cookie::{Cookie, SameSite};
pub use headers::Headers;
pub use request::Request;

/// An HTTP response status code.
///
/// # Examples
///
/// ```
/// use outflow::http::StatusCode;
///
/// let status = StatusCode::PartialContent;
/// assert_eq!(status.as_u16(), 206);
/// assert_eq!(status.canonical_reason(), "Partial Content");
/// assert_eq!(StatusCode::from_u16(416), Some(StatusCode::RangeNotSatisfiable));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum StatusCode {
    // 2xx Success
    #[default]
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    PartialContent = 206,

    // 3xx Redirection
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    TemporaryRedirect = 307,
    PermanentRedirect = 308,

    // 4xx Client Error
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    Gone = 410,
    PreconditionFailed = 412,
    UnsupportedMediaType = 415,
    RangeNotSatisfiable = 416,
    UnprocessableEntity = 422,

    // 5xx Server Error
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
}

impl StatusCode {
    const ALL: [StatusCode; 27] = [
        Self::Ok,
        Self::Created,
        Self::Accepted,
        Self::NoContent,
        Self::PartialContent,
        Self::MovedPermanently,
        Self::Found,
        Self::SeeOther,
        Self::NotModified,
        Self::TemporaryRedirect,
        Self::PermanentRedirect,
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::MethodNotAllowed,
        Self::NotAcceptable,
        Self::Gone,
        Self::PreconditionFailed,
        Self::UnsupportedMediaType,
        Self::RangeNotSatisfiable,
        Self::UnprocessableEntity,
        Self::InternalServerError,
        Self::NotImplemented,
        Self::BadGateway,
        Self::ServiceUnavailable,
        Self::GatewayTimeout,
    ];

    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Looks up the variant for a numeric code, `None` for codes this crate does not model.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_u16() == code)
    }

    /// Returns the canonical reason phrase for this status code.
    pub fn canonical_reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::NoContent => "No Content",
            Self::PartialContent => "Partial Content",
            Self::MovedPermanently => "Moved Permanently",
            Self::Found => "Found",
            Self::SeeOther => "See Other",
            Self::NotModified => "Not Modified",
            Self::TemporaryRedirect => "Temporary Redirect",
            Self::PermanentRedirect => "Permanent Redirect",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::NotAcceptable => "Not Acceptable",
            Self::Gone => "Gone",
            Self::PreconditionFailed => "Precondition Failed",
            Self::UnsupportedMediaType => "Unsupported Media Type",
            Self::RangeNotSatisfiable => "Range Not Satisfiable",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::BadGateway => "Bad Gateway",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::GatewayTimeout => "Gateway Timeout",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

/// An HTTP request method.
///
/// Only `GET` and `HEAD` change how a response body is emitted; the other
/// variants exist so a parsed request round-trips its method faithfully.
///
/// # Examples
///
/// ```
/// use outflow::http::Method;
///
/// let method: Method = "HEAD".parse().unwrap();
/// assert_eq!(method, Method::Head);
/// assert!(method.allows_partial());
/// assert!(!method.has_response_body());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Connect,
    Trace,
    /// A non-standard extension method.
    Custom(String),
}

impl Method {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns `false` for `HEAD`: headers are computed as for `GET` but no body bytes are sent.
    pub fn has_response_body(&self) -> bool {
        !matches!(self, Self::Head)
    }

    /// Returns `true` if byte ranges and conditional headers are honored for this method.
    pub fn allows_partial(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            other => Self::Custom(other.to_owned()),
        })
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_u16() {
        for code in [200, 206, 302, 304, 416, 500] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(status.as_u16(), code);
        }
        assert_eq!(StatusCode::from_u16(299), None);
    }

    #[test]
    fn status_display() {
        assert_eq!(StatusCode::Found.to_string(), "302 Found");
        assert_eq!(
            StatusCode::RangeNotSatisfiable.to_string(),
            "416 Range Not Satisfiable"
        );
    }

    #[test]
    fn head_has_no_body() {
        assert!(!Method::Head.has_response_body());
        assert!(Method::Get.has_response_body());
        assert!(!Method::Post.allows_partial());
    }
}
